use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrency: {0}. Must be between 1 and 100")]
    InvalidMaxConcurrency(usize),

    #[error("Invalid max_attempts: {0}. Cannot be 0")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid backoff configuration: base_delay_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid checkpoint interval: {0}. Must be at least 1")]
    InvalidCheckpointInterval(usize),

    #[error("Invalid target_clean_passes: {0}. Must be at least 1")]
    InvalidTargetCleanPasses(u32),

    #[error(
        "Invalid pass cap: max_passes ({0}) must be at least target_clean_passes ({1})"
    )]
    InvalidMaxPasses(u32, u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .cadence/config.yaml (project config)
    /// 3. .cadence/local.yaml (project local overrides, optional)
    /// 4. Environment variables (CADENCE_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.cadence/) so several
    /// projects on one machine can run with different settings.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".cadence/config.yaml"))
            .merge(Yaml::file(".cadence/local.yaml"))
            .merge(Env::prefixed("CADENCE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.scheduler.max_concurrency == 0 || config.scheduler.max_concurrency > 100 {
            return Err(ConfigError::InvalidMaxConcurrency(
                config.scheduler.max_concurrency,
            ));
        }

        if config.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.retry.max_attempts));
        }

        if config.retry.base_delay_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.base_delay_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.checkpoint.every == 0 {
            return Err(ConfigError::InvalidCheckpointInterval(
                config.checkpoint.every,
            ));
        }

        if config.convergence.target_clean_passes == 0 {
            return Err(ConfigError::InvalidTargetCleanPasses(
                config.convergence.target_clean_passes,
            ));
        }

        if config.convergence.max_passes < config.convergence.target_clean_passes {
            return Err(ConfigError::InvalidMaxPasses(
                config.convergence.max_passes,
                config.convergence.target_clean_passes,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
