use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::io::OutputFormat;
use crate::stages::{FailedChunkPolicy, RevisionSettings};

/// Environment variable consulted when `api_key` is absent from the file
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ORGANIZATION_LABEL: &str = "Interviewer";

/// Process-wide configuration, read once at startup and never mutated
/// while the pipeline runs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Backend credential (falls back to `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Real name of the interviewee as it appears in the transcript
    #[serde(default)]
    pub interviewee_name: String,
    /// Free-form background used to build the revision instruction
    #[serde(default)]
    pub interviewee_introduction: String,
    /// Label substituted for every speaker who is not the interviewee
    #[serde(default = "default_organization_label")]
    pub organization_label: String,
    /// Sampling temperature of the initial revise step
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Number of check-difference / supply-missing rounds per chunk
    #[serde(default = "default_revise_iteration")]
    pub revise_iteration: u32,
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Run the style-polishing pass after the iterations
    #[serde(default = "default_enable_polish")]
    pub enable_polish: bool,
    /// Number of chunks revised concurrently
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub failed_chunk_policy: FailedChunkPolicy,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    /// Prompt template overrides; built-in templates are used when unset
    #[serde(default)]
    pub prompts_file: Option<PathBuf>,
    /// Optional JSON run report
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_organization_label() -> String {
    DEFAULT_ORGANIZATION_LABEL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_revise_iteration() -> u32 {
    1
}

fn default_chunk_size() -> usize {
    2000
}

fn default_enable_polish() -> bool {
    true
}

fn default_max_workers() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl AppConfig {
    /// Load and validate a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, std::env::var(API_KEY_ENV).ok())
    }

    fn parse(content: &str, env_api_key: Option<String>) -> Result<Self, ConfigError> {
        let mut config: AppConfig = serde_yaml::from_str(content)?;

        if config.api_key.trim().is_empty() {
            config.api_key = env_api_key.unwrap_or_default();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey { key: "api_key" });
        }
        if self.interviewee_name.trim().is_empty() {
            return Err(ConfigError::MissingKey {
                key: "interviewee_name",
            });
        }
        if self.interviewee_introduction.trim().is_empty() {
            return Err(ConfigError::MissingKey {
                key: "interviewee_introduction",
            });
        }
        if self.organization_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "organization_label",
                message: "must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "temperature",
                message: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chunk_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_workers",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Settings for the per-chunk revision pipeline
    pub fn revision_settings(&self) -> RevisionSettings {
        RevisionSettings {
            revise_temperature: self.temperature,
            revise_iteration: self.revise_iteration,
            enable_polish: self.enable_polish,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
api_key: sk-test
interviewee_name: Alice
interviewee_introduction: Alice runs a bakery.
"#;

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::parse(MINIMAL, None).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.organization_label, DEFAULT_ORGANIZATION_LABEL);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.revise_iteration, 1);
        assert_eq!(config.chunk_size, 2000);
        assert!(config.enable_polish);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.failed_chunk_policy, FailedChunkPolicy::Placeholder);
        assert_eq!(config.output_format, OutputFormat::Auto);
        assert!(config.input_file.is_none());
        assert!(config.prompts_file.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let yaml = r#"
api_key: sk-test
base_url: http://localhost:8080/v1
model: local-model
interviewee_name: Alice
interviewee_introduction: Alice runs a bakery.
organization_label: Bakery Weekly
temperature: 0.3
revise_iteration: 0
chunk_size: 4000
enable_polish: false
max_workers: 4
failed_chunk_policy: skip
output_format: docx
input_file: in.txt
output_file: out/result.docx
"#;
        let config = AppConfig::parse(yaml, None).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.organization_label, "Bakery Weekly");
        assert_eq!(config.revise_iteration, 0);
        assert_eq!(config.chunk_size, 4000);
        assert!(!config.enable_polish);
        assert_eq!(config.failed_chunk_policy, FailedChunkPolicy::Skip);
        assert_eq!(config.output_format, OutputFormat::Docx);
        assert_eq!(config.input_file, Some(PathBuf::from("in.txt")));

        let settings = config.revision_settings();
        assert_eq!(settings.revise_temperature, 0.3);
        assert_eq!(settings.revise_iteration, 0);
        assert!(!settings.enable_polish);
    }

    #[test]
    fn test_api_key_env_fallback() {
        let yaml = "interviewee_name: Alice\ninterviewee_introduction: hi\n";
        let config = AppConfig::parse(yaml, Some("sk-env".to_string())).unwrap();
        assert_eq!(config.api_key, "sk-env");

        let err = AppConfig::parse(yaml, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "api_key" }));
    }

    #[test]
    fn test_missing_interviewee_name() {
        let yaml = "api_key: k\ninterviewee_introduction: hi\n";
        let err = AppConfig::parse(yaml, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                key: "interviewee_name"
            }
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_chunk = format!("{MINIMAL}chunk_size: 0\n");
        assert!(matches!(
            AppConfig::parse(&zero_chunk, None).unwrap_err(),
            ConfigError::InvalidValue {
                key: "chunk_size",
                ..
            }
        ));

        let hot = format!("{MINIMAL}temperature: 3.5\n");
        assert!(matches!(
            AppConfig::parse(&hot, None).unwrap_err(),
            ConfigError::InvalidValue {
                key: "temperature",
                ..
            }
        ));

        let no_workers = format!("{MINIMAL}max_workers: 0\n");
        assert!(AppConfig::parse(&no_workers, None).is_err());
    }

    #[test]
    fn test_unparsable_yaml() {
        let err = AppConfig::parse("api_key: [unclosed", None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
