//! Runtime configuration.
//!
//! Resolved once at startup and handed to every component at construction.
//! Nothing below this module reads environment variables or derives paths
//! from the process location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "ClinAssist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable prefix for startup overrides.
const ENV_PREFIX: &str = "CLINASSIST_";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinassist=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Every path, handle and tuning knob the workflow needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Root data directory (~/ClinAssist/ by default).
    pub data_dir: PathBuf,
    /// Protocol documents (.md/.txt) indexed in memory at startup.
    pub index_dir: PathBuf,
    /// JSON-lines audit trail. Parent directory is created on first append.
    pub audit_log_path: PathBuf,
    /// Optional custom guardrail rule table (JSON). Built-in table when absent.
    pub guardrail_rules_path: Option<PathBuf>,
    /// Base URL of the local Ollama instance.
    pub ollama_url: String,
    /// Generation model handle.
    pub model: String,
    /// Number of protocol excerpts retrieved per question.
    pub retrieval_top_k: usize,
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
    /// Sampling temperature (must be > 0; outputs are not reproducible).
    pub temperature: f32,
    /// Per-call bound for retrieval/generation collaborators.
    pub collaborator_timeout_secs: u64,
    /// Characters of each retrieved excerpt kept in the audit event.
    pub excerpt_preview_chars: usize,
    /// Characters of the guarded answer kept in the audit event.
    pub answer_preview_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self::rooted_at(app_data_dir())
    }
}

impl AssistantConfig {
    /// Default layout under an explicit data directory.
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            index_dir: data_dir.join("protocols"),
            audit_log_path: data_dir.join("logs").join("assistant_audit.jsonl"),
            data_dir,
            guardrail_rules_path: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:3b-instruct".to_string(),
            retrieval_top_k: 3,
            max_new_tokens: 240,
            temperature: 0.7,
            collaborator_timeout_secs: 120,
            excerpt_preview_chars: 250,
            answer_preview_chars: 600,
        }
    }

    /// Defaults with `CLINASSIST_*` overrides applied. Call once at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, dotenv map, test fixture).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let mut config = match get("DATA_DIR") {
            Some(dir) => Self::rooted_at(dir),
            None => Self::default(),
        };

        if let Some(v) = get("INDEX_DIR") {
            config.index_dir = PathBuf::from(v);
        }
        if let Some(v) = get("AUDIT_LOG") {
            config.audit_log_path = PathBuf::from(v);
        }
        if let Some(v) = get("GUARDRAIL_RULES") {
            config.guardrail_rules_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("OLLAMA_URL") {
            config.ollama_url = v;
        }
        if let Some(v) = get("MODEL") {
            config.model = v;
        }
        if let Some(v) = get("TOP_K") {
            config.retrieval_top_k = parse_value("TOP_K", &v)?;
        }
        if let Some(v) = get("MAX_NEW_TOKENS") {
            config.max_new_tokens = parse_value("MAX_NEW_TOKENS", &v)?;
        }
        if let Some(v) = get("TEMPERATURE") {
            config.temperature = parse_value("TEMPERATURE", &v)?;
        }
        if let Some(v) = get("TIMEOUT_SECS") {
            config.collaborator_timeout_secs = parse_value("TIMEOUT_SECS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::Invalid("retrieval_top_k must be at least 1".into()));
        }
        if self.max_new_tokens == 0 {
            return Err(ConfigError::Invalid("max_new_tokens must be at least 1".into()));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(ConfigError::Invalid("temperature must be positive".into()));
        }
        if self.collaborator_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "collaborator_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{key}"),
        value: raw.to_string(),
    })
}

/// Get the application data directory.
/// ~/ClinAssist/ when a home directory exists, ./ClinAssist otherwise.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_named_after_app() {
        assert!(app_data_dir().ends_with("ClinAssist"));
    }

    #[test]
    fn defaults_are_valid() {
        let config = AssistantConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval_top_k, 3);
        assert_eq!(config.max_new_tokens, 240);
        assert!(config.audit_log_path.starts_with(&config.data_dir));
        assert!(config.audit_log_path.ends_with("logs/assistant_audit.jsonl"));
    }

    #[test]
    fn data_dir_override_reroots_paths() {
        let config =
            AssistantConfig::from_lookup(lookup(&[("CLINASSIST_DATA_DIR", "/srv/clin")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/clin"));
        assert!(config.index_dir.starts_with("/srv/clin"));
        assert!(config.audit_log_path.starts_with("/srv/clin"));
    }

    #[test]
    fn numeric_overrides_parse() {
        let config = AssistantConfig::from_lookup(lookup(&[
            ("CLINASSIST_TOP_K", "4"),
            ("CLINASSIST_TEMPERATURE", "0.3"),
            ("CLINASSIST_MODEL", "medgemma:4b"),
        ]))
        .unwrap();
        assert_eq!(config.retrieval_top_k, 4);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.model, "medgemma:4b");
    }

    #[test]
    fn garbage_number_is_rejected() {
        let err = AssistantConfig::from_lookup(lookup(&[("CLINASSIST_TOP_K", "three")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("CLINASSIST_TOP_K"));
    }

    #[test]
    fn zero_top_k_fails_validation() {
        let err =
            AssistantConfig::from_lookup(lookup(&[("CLINASSIST_TOP_K", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_temperature_fails_validation() {
        let mut config = AssistantConfig::rooted_at("/tmp/x");
        config.temperature = 0.0;
        assert!(config.validate().is_err());
    }
}
