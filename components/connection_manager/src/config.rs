use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use derive_more::From;
use serde::{Deserialize, Serialize};

use proto::consts::{
    DEFAULT_EVENT_CHANNEL_LEN, DEFAULT_INITIAL_CHANNEL_TARGET, DEFAULT_JOINABLE_FUNDS_TARGET,
    DEFAULT_SETTLE_POLL_INTERVAL_MS,
};
use proto::funding::JoinableFraction;

use crate::strategy::StrategyParams;

#[derive(Debug, From)]
pub enum ConfigError {
    IoError(io::Error),
    TomlError(toml::de::Error),
    /// joinable_funds_target must be inside [0, 1)
    InvalidJoinableFundsTarget,
}

/// Configuration of a connection manager, usually loaded from a TOML file.
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionManagerConfig {
    /// Amount of funded channels we try to keep
    pub initial_channel_target: u32,
    /// Fraction of the funds kept for channels opened by other nodes
    pub joinable_funds_target: f64,
    /// Interval between settlement queries when leaving (milliseconds)
    pub settle_poll_interval_ms: u64,
    /// Memory allocated to the channel of incoming network events
    pub event_channel_len: usize,
}

impl Default for ConnectionManagerConfig {
    fn default() -> Self {
        ConnectionManagerConfig {
            initial_channel_target: DEFAULT_INITIAL_CHANNEL_TARGET,
            joinable_funds_target: DEFAULT_JOINABLE_FUNDS_TARGET,
            settle_poll_interval_ms: DEFAULT_SETTLE_POLL_INTERVAL_MS,
            event_channel_len: DEFAULT_EVENT_CHANNEL_LEN,
        }
    }
}

impl ConnectionManagerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        let config: ConnectionManagerConfig = toml::from_str(data)?;
        // Make sure the strategy is valid before handing the configuration out:
        config.strategy_params()?;
        Ok(config)
    }

    pub fn strategy_params(&self) -> Result<StrategyParams, ConfigError> {
        let joinable_funds_target = JoinableFraction::from_f64(self.joinable_funds_target)
            .ok_or(ConfigError::InvalidJoinableFundsTarget)?;
        Ok(StrategyParams {
            initial_channel_target: self.initial_channel_target,
            joinable_funds_target,
        })
    }

    pub fn settle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settle_poll_interval_ms)
    }
}
