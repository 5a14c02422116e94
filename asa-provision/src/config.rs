use std::fs;
use std::path::Path;

use asa_policy_core::classify::{
    DEFAULT_ANY_TOKENS, DEFAULT_GROUP_PATTERN, DEFAULT_OBJECT_PATTERN, DEFAULT_SERVICE_ANY_TOKENS,
};
use asa_policy_core::route::DEFAULT_MANAGEMENT_ZONE;
use asa_policy_core::rule::{DEFAULT_LOG_INTERVAL, DEFAULT_LOG_STATUS};
use asa_policy_core::{AddressClassifier, PipelineOptions, RuleLogging};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Tool settings. Every field has a default, so a config file may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub classifier: ClassifierSettings,
    pub routing: RoutingSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub any_tokens: Vec<String>,
    pub service_any_tokens: Vec<String>,
    pub group_pattern: String,
    pub object_pattern: String,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            any_tokens: DEFAULT_ANY_TOKENS.iter().map(|t| t.to_string()).collect(),
            service_any_tokens: DEFAULT_SERVICE_ANY_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            group_pattern: DEFAULT_GROUP_PATTERN.to_string(),
            object_pattern: DEFAULT_OBJECT_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub management_zone: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            management_zone: DEFAULT_MANAGEMENT_ZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub verify_group_homogeneity: bool,
    pub log_interval: u32,
    pub log_status: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            verify_group_homogeneity: false,
            log_interval: DEFAULT_LOG_INTERVAL,
            log_status: DEFAULT_LOG_STATUS.to_string(),
        }
    }
}

/// Errors returned when loading or applying settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid {field} pattern: {source}")]
    Pattern {
        field: &'static str,
        source: regex::Error,
    },
}

impl Settings {
    pub fn classifier(&self) -> Result<AddressClassifier, ConfigError> {
        let c = &self.classifier;
        check_pattern("group_pattern", &c.group_pattern)?;
        check_pattern("object_pattern", &c.object_pattern)?;
        AddressClassifier::new(
            c.any_tokens.as_slice(),
            c.service_any_tokens.as_slice(),
            &c.group_pattern,
            &c.object_pattern,
        )
        .map_err(|source| ConfigError::Pattern {
            field: "classifier",
            source,
        })
    }

    pub fn rule_logging(&self) -> RuleLogging {
        RuleLogging {
            log_interval: self.pipeline.log_interval,
            log_status: self.pipeline.log_status.clone(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            verify_group_homogeneity: self.pipeline.verify_group_homogeneity,
        }
    }
}

fn check_pattern(field: &'static str, pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|source| ConfigError::Pattern { field, source })
}

/// Load settings from `path`, or the embedded defaults when no path is given.
///
/// Returns the settings together with a description of where they came from.
pub fn load_settings(path: Option<&Path>) -> Result<(Settings, String), ConfigError> {
    let Some(path) = path else {
        return Ok((default_settings(), "embedded".to_string()));
    };
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let settings = parse_settings(&raw, path.display().to_string())?;
    Ok((settings, format!("file:{}", path.display())))
}

/// Built-in settings shipped with the binary.
pub fn default_settings() -> Settings {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
    parse_settings(embedded, "embedded config".to_string()).unwrap_or_default()
}

fn parse_settings(raw: &str, path: String) -> Result<Settings, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })
}
