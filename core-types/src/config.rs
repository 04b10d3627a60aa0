// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::path::Path;

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Settings for the exporter binary, layered from an optional file and `EXPORTER_*` env.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExporterConfig {
    #[serde(default)]
    pub s3: S3Settings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_pct")]
    pub jitter_pct: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_pct: default_jitter_pct(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_pct,
        )
    }
}

fn default_max_attempts() -> usize {
    5
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_jitter_pct() -> f64 {
    0.25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub start_block: Option<u64>,
    #[serde(default)]
    pub end_block: Option<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            label: default_label(),
            start_block: None,
            end_block: None,
        }
    }
}

fn default_label() -> String {
    "exporter".to_string()
}

impl ExporterConfig {
    /// Loads `path` (when given, must exist) then overlays `EXPORTER_` variables,
    /// using `__` to separate sections, e.g. `EXPORTER_S3__REGION`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("EXPORTER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.s3.access_key_id.is_some() != self.s3.secret_access_key.is_some() {
            return Err(ConfigError::Message(
                "s3.access_key_id and s3.secret_access_key must be set together".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.run.start_block, self.run.end_block) {
            if start > end {
                return Err(ConfigError::Message(format!(
                    "run.start_block {start} is after run.end_block {end}"
                )));
            }
        }
        Ok(())
    }
}
