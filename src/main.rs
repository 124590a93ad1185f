use anyhow::{Context, Result};
use atelier::config::AtelierConfig;
use atelier::pipeline::TurnPipeline;
use atelier::routing::RuleTable;
use atelier::session::{MemorySessionStore, SessionStore};
use atelier::ui;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(version, about = "Decision core for a conversational design-tutoring application")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use deterministic stub collaborators (no completion CLI needed)
    #[arg(long, global = true)]
    pub stubs: bool,

    /// Path to the config file (default: ./atelier.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive tutoring chat over one session
    Chat {
        /// Session id to resume (a fresh one is generated otherwise)
        #[arg(long)]
        session: Option<String>,
        /// Print the routing decision behind every reply
        #[arg(long)]
        show_decisions: bool,
    },
    /// Process a single utterance and print the outcome
    Turn {
        /// The student message
        message: Vec<String>,
        /// Session id (a fresh one is generated otherwise)
        #[arg(long)]
        session: Option<String>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the routing rule table
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("atelier=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atelier=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match cli.config {
        Some(ref path) => AtelierConfig::load(path)?,
        None => AtelierConfig::load_or_default()?,
    };
    if cli.stubs {
        config.completion.use_stubs = true;
    }

    match cli.command {
        Commands::Chat {
            session,
            show_decisions,
        } => run_chat(&config, session, show_decisions).await,
        Commands::Turn {
            message,
            session,
            json,
        } => run_turn(&config, message, session, json).await,
        Commands::Routes => {
            print_routes();
            Ok(())
        }
    }
}

async fn run_chat(
    config: &AtelierConfig,
    session: Option<String>,
    show_decisions: bool,
) -> Result<()> {
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = TurnPipeline::from_config(config, store.clone());
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    ui::print_banner(config.completion.use_stubs);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/state" => {
                let state = store.load(&session_id).await;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&state)
                        .context("Failed to serialize session state")?
                );
                continue;
            }
            _ => {}
        }

        let outcome = pipeline.process_turn(&session_id, line).await;
        println!();
        ui::print_reply(&outcome);
        if show_decisions {
            ui::print_decision(&outcome);
        }
    }

    Ok(())
}

async fn run_turn(
    config: &AtelierConfig,
    message: Vec<String>,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let message = message.join(" ");
    if message.trim().is_empty() {
        anyhow::bail!("No message given. Usage: atelier turn <message>");
    }

    let store = Arc::new(MemorySessionStore::new());
    let pipeline = TurnPipeline::from_config(config, store);
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let outcome = pipeline.process_turn(&session_id, &message).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
    } else {
        ui::print_reply(&outcome);
        ui::print_decision(&outcome);
    }

    Ok(())
}

fn print_routes() {
    let table = RuleTable::standard();
    println!("{:<4} {:<26} {:<26} conditions", "prio", "rule", "route");
    for rule in table.rules() {
        let route = rule
            .route
            .map(|r| r.to_string())
            .unwrap_or_else(|| "(suggested)".to_string());
        println!(
            "{:<4} {:<26} {:<26} {}",
            rule.priority,
            rule.id,
            route,
            rule.conditions.len()
        );
    }
    println!("\npre-table: pure_example_fast_path, gamification_override");
    println!("default:   balanced_guidance");
}
