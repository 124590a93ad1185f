//! Unified configuration for the Atelier core.
//!
//! Reads `atelier.toml`, with environment overrides on top (loaded through
//! dotenvy) and CLI flags above those. Every field has a default, so an
//! absent file is a valid configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! [session]
//! sticky_threshold = 0.5
//! sticky_turn_gate = 2
//!
//! [completion]
//! command = "claude"
//! call_timeout_secs = 60
//! max_parallel = 4
//! use_stubs = false
//!
//! [synthesis]
//! similarity_threshold = 0.7
//! max_reply_chars = 2400
//! ```

use crate::collab::InvokerConfig;
use crate::routing::EngineSettings;
use crate::synthesis::{QualityGate, Synthesizer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "atelier.toml";

/// Session/continuity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum detection confidence for a sticky fact to be stored.
    #[serde(default = "default_sticky_threshold")]
    pub sticky_threshold: f64,
    /// Number of opening turns during which sticky facts may settle.
    #[serde(default = "default_sticky_turn_gate")]
    pub sticky_turn_gate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sticky_threshold: default_sticky_threshold(),
            sticky_turn_gate: default_sticky_turn_gate(),
        }
    }
}

/// Completion-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Completion CLI command.
    #[serde(default = "default_completion_command")]
    pub command: String,
    /// Timeout per collaborator call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Bound on concurrent collaborator calls per turn.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    /// Use deterministic stub collaborators instead of the completion CLI.
    #[serde(default)]
    pub use_stubs: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            command: default_completion_command(),
            call_timeout_secs: default_call_timeout_secs(),
            max_parallel: default_max_parallel(),
            use_stubs: false,
        }
    }
}

/// Synthesis and quality-gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Overlap ratio above which collaborator outputs count as duplicates.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Maximum reply length in characters.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

/// The full configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtelierConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl AtelierConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AtelierConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;
        Ok(config)
    }

    /// Load `atelier.toml` from the working directory when present,
    /// defaults otherwise, then apply environment overrides.
    pub fn load_or_default() -> Result<Self> {
        // A .env file is optional; absence is not an error.
        let _ = dotenvy::dotenv();

        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables override the file layer.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(cmd) = std::env::var("ATELIER_COMPLETION_CMD") {
            if !cmd.is_empty() {
                self.completion.command = cmd;
            }
        }
        if let Ok(value) = std::env::var("ATELIER_USE_STUBS") {
            self.completion.use_stubs = matches!(value.as_str(), "1" | "true" | "yes");
        }
        if let Ok(value) = std::env::var("ATELIER_CALL_TIMEOUT_SECS") {
            if let Ok(secs) = value.parse::<u64>() {
                self.completion.call_timeout_secs = secs;
            }
        }
    }

    /// Routing-engine settings derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            sticky_threshold: self.session.sticky_threshold,
            sticky_turn_gate: self.session.sticky_turn_gate,
        }
    }

    /// Invoker configuration derived from this configuration.
    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig::default()
            .with_completion_cmd(&self.completion.command)
            .with_call_timeout(Duration::from_secs(self.completion.call_timeout_secs))
            .with_max_parallel(self.completion.max_parallel)
    }

    /// Synthesizer derived from this configuration.
    pub fn synthesizer(&self) -> Synthesizer {
        Synthesizer::new(
            self.synthesis.similarity_threshold,
            QualityGate::new(self.synthesis.max_reply_chars),
        )
    }
}

fn default_sticky_threshold() -> f64 {
    0.5
}

fn default_sticky_turn_gate() -> u32 {
    2
}

fn default_completion_command() -> String {
    "claude".to_string()
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_max_parallel() -> usize {
    4
}

fn default_similarity_threshold() -> f64 {
    crate::synthesis::DEFAULT_SIMILARITY_THRESHOLD
}

fn default_max_reply_chars() -> usize {
    crate::synthesis::DEFAULT_MAX_REPLY_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AtelierConfig::default();
        assert_eq!(config.session.sticky_threshold, 0.5);
        assert_eq!(config.session.sticky_turn_gate, 2);
        assert_eq!(config.completion.command, "claude");
        assert!(!config.completion.use_stubs);
        assert_eq!(config.synthesis.similarity_threshold, 0.7);
    }

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[session]
sticky_threshold = 0.6
sticky_turn_gate = 3

[completion]
command = "llm"
call_timeout_secs = 30
max_parallel = 2
use_stubs = true

[synthesis]
similarity_threshold = 0.8
max_reply_chars = 1200
"#
        )
        .unwrap();

        let config = AtelierConfig::load(file.path()).unwrap();
        assert_eq!(config.session.sticky_threshold, 0.6);
        assert_eq!(config.session.sticky_turn_gate, 3);
        assert_eq!(config.completion.command, "llm");
        assert!(config.completion.use_stubs);
        assert_eq!(config.synthesis.max_reply_chars, 1200);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[completion]
use_stubs = true
"#
        )
        .unwrap();

        let config = AtelierConfig::load(file.path()).unwrap();
        assert!(config.completion.use_stubs);
        assert_eq!(config.completion.command, "claude");
        assert_eq!(config.session.sticky_turn_gate, 2);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = AtelierConfig::load(Path::new("/nonexistent/atelier.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not [valid toml").unwrap();
        let err = AtelierConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config TOML"));
    }

    #[test]
    fn test_derived_settings() {
        let config = AtelierConfig::default();
        let engine = config.engine_settings();
        assert_eq!(engine.sticky_threshold, 0.5);
        assert_eq!(engine.sticky_turn_gate, 2);

        let invoker = config.invoker_config();
        assert_eq!(invoker.completion_cmd, "claude");
        assert_eq!(invoker.call_timeout, Duration::from_secs(60));
        assert_eq!(invoker.max_parallel, 4);
    }
}
