use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShieldError};

/// Top-level configuration from `.navshield.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub exceptions: ExceptionSettings,
}

/// Timing and sizing of the decision pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// How long to wait for page signals before substituting a timed-out value.
    #[serde(default = "default_collect_timeout_ms")]
    pub collect_timeout_ms: u64,
    /// How long a WARN indicator stays up.
    #[serde(default = "default_warn_clear_ms")]
    pub warn_clear_ms: u64,
    /// Most recent requests of the tab handed to scoring.
    #[serde(default = "default_recent_request_limit")]
    pub recent_request_limit: usize,
    /// Initiators reported by the stats query.
    #[serde(default = "default_top_initiators")]
    pub top_initiators: usize,
}

fn default_collect_timeout_ms() -> u64 {
    1500
}

fn default_warn_clear_ms() -> u64 {
    6000
}

fn default_recent_request_limit() -> usize {
    200
}

fn default_top_initiators() -> usize {
    crate::window::DEFAULT_TOP_INITIATORS
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            collect_timeout_ms: default_collect_timeout_ms(),
            warn_clear_ms: default_warn_clear_ms(),
            recent_request_limit: default_recent_request_limit(),
            top_initiators: default_top_initiators(),
        }
    }
}

impl PipelineSettings {
    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }
}

/// Hosts that bypass scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionSettings {
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.collect_timeout_ms == 0 {
            return Err(ShieldError::Config(
                "pipeline.collect_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.pipeline.recent_request_limit == 0 {
            return Err(ShieldError::Config(
                "pipeline.recent_request_limit must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# NavShield configuration

[pipeline]
# Milliseconds to wait for page signals before scoring without them.
collect_timeout_ms = 1500

# Milliseconds a WARN indicator stays visible.
warn_clear_ms = 6000

# Most recent requests of a tab considered when scoring.
recent_request_limit = 200

# Initiators listed by the stats query.
top_initiators = 8

[exceptions]
# Hostnames that are never scored.
# allowed_hosts = ["intranet.example.com"]
"#
    }
}
