// SPDX-License-Identifier: MIT

//! Configuration loading
//!
//! Settings come from an optional YAML file, then a couple of environment
//! overrides. API keys are never read from the file; providers take them from
//! the environment when they are constructed.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::adk::error::CheckError;
use crate::checker::workflow::retry::RetryPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    pub model: ModelConfig,
    pub engine: EngineConfig,
    pub research: ResearchConfig,
    pub server: ServerConfig,
}

/// Chat model used for supervisor, review and judge decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: String,
    pub model_name: String,
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model_name: "gpt-4o".to_string(),
            temperature: Some(0.0),
        }
    }
}

/// Engine loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling on node invocations per run
    pub max_iterations: usize,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    pub wikipedia: WikipediaConfig,
    pub arxiv: ArxivConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WikipediaConfig {
    pub language: String,
    pub max_docs: usize,
    /// Per-document content limit, in characters
    pub max_chars: usize,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            max_docs: 3,
            max_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArxivConfig {
    pub max_docs: usize,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self { max_docs: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    pub max_results: usize,
    pub exclude_domains: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            exclude_domains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl CheckerConfig {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.engine.max_iterations == 0 {
            return Err(CheckError::config("engine.max_iterations must be at least 1"));
        }
        if self.engine.retry.max_attempts == 0 {
            return Err(CheckError::config(
                "engine.retry.max_attempts must be at least 1",
            ));
        }
        if !self.model.provider.eq_ignore_ascii_case("openai") {
            return Err(CheckError::config(format!(
                "unsupported model provider '{}'",
                self.model.provider
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), CheckError> {
        if let Ok(model_name) = env::var("MODEL_NAME") {
            self.model.model_name = model_name;
        }
        if let Ok(max) = env::var("FACTCHECK_MAX_ITERATIONS") {
            self.engine.max_iterations = max.parse().map_err(|_| {
                CheckError::config(format!("FACTCHECK_MAX_ITERATIONS is not a number: {}", max))
            })?;
        }
        Ok(())
    }
}

/// Loads configuration from YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    pub const DEFAULT_PATH: &'static str = "factcheck.yaml";

    pub fn new() -> Self {
        Self
    }

    /// Load from `path`, or from [`Self::DEFAULT_PATH`] if it exists, or defaults
    pub fn load(&self, path: Option<&Path>) -> Result<CheckerConfig, CheckError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::parse_yaml(&fs::read_to_string(path)?)?
            }
            None if Path::new(Self::DEFAULT_PATH).exists() => {
                log::info!("Loading configuration from {}", Self::DEFAULT_PATH);
                Self::parse_yaml(&fs::read_to_string(Self::DEFAULT_PATH)?)?
            }
            None => CheckerConfig::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<CheckerConfig, CheckError> {
        if content.trim().is_empty() {
            return Ok(CheckerConfig::default());
        }
        let config: CheckerConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckerConfig::default();
        assert_eq!(config.model.model_name, "gpt-4o");
        assert_eq!(config.engine.max_iterations, 25);
        assert_eq!(config.engine.retry.max_attempts, 2);
        assert_eq!(config.research.arxiv.max_docs, 3);
        assert_eq!(config.research.web.max_results, 3);
        assert_eq!(config.research.wikipedia.language, "en");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
model:
  provider: openai
  model_name: gpt-4o-mini
  temperature: 0.2
engine:
  max_iterations: 12
  retry:
    max_attempts: 3
    initial_backoff_ms: 100
research:
  wikipedia:
    language: de
    max_docs: 5
  web:
    max_results: 4
    exclude_domains:
      - example.com
server:
  port: 9000
"#;
        let config = ConfigLoader::parse_yaml(yaml).unwrap();
        assert_eq!(config.model.model_name, "gpt-4o-mini");
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.engine.max_iterations, 12);
        assert_eq!(config.engine.retry.max_attempts, 3);
        assert_eq!(config.engine.retry.initial_backoff_ms, 100);
        // unspecified retry fields keep their defaults
        assert_eq!(config.engine.retry.max_backoff_ms, 5_000);
        assert_eq!(config.research.wikipedia.language, "de");
        assert_eq!(config.research.wikipedia.max_chars, 4000);
        assert_eq!(config.research.web.exclude_domains, vec!["example.com"]);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = ConfigLoader::parse_yaml("engine:\n  max_iterations: 7\n").unwrap();
        assert_eq!(config.engine.max_iterations, 7);
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(ConfigLoader::parse_yaml("").unwrap(), CheckerConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = ConfigLoader::parse_yaml("engine: [not, a, map").unwrap_err();
        assert!(matches!(err, CheckError::Yaml(_)));
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = CheckerConfig::default();
        config.engine.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = CheckerConfig::default();
        config.engine.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = CheckerConfig::default();
        config.model.provider = "gemini".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ConfigLoader::new()
            .load(Some(Path::new("/nonexistent/factcheck.yaml")))
            .unwrap_err();
        assert!(matches!(err, CheckError::Io(_)));
    }
}
