//! Configuration models for the Cadence core.

use serde::{Deserialize, Serialize};

use super::convergence::MethodologyReuse;

/// Main configuration structure for Cadence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Retry policy configuration.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Checkpoint configuration.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Convergence loop configuration.
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Maximum concurrently executing units (independent tasks plus
    /// conflict groups) within a level.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Stop launching further levels after the first failed level.
    #[serde(default)]
    pub fail_fast: bool,
}

const fn default_max_concurrency() -> usize {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            fail_fast: false,
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum attempts per task, first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff duration in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff duration in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    100
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Checkpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Snapshot progress after this many items.
    #[serde(default = "default_checkpoint_every")]
    pub every: usize,
}

const fn default_checkpoint_every() -> usize {
    10
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            every: default_checkpoint_every(),
        }
    }
}

/// Convergence loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Consecutive clean passes required to converge.
    #[serde(default = "default_target_clean_passes")]
    pub target_clean_passes: u32,

    /// Maximum passes before the session is marked failed.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,

    /// Scope of the methodology no-reuse rule.
    #[serde(default)]
    pub reuse_scope: MethodologyReuse,
}

const fn default_target_clean_passes() -> u32 {
    3
}

const fn default_max_passes() -> u32 {
    10
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            target_clean_passes: default_target_clean_passes(),
            max_passes: default_max_passes(),
            reuse_scope: MethodologyReuse::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling file output. Stdout only when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
