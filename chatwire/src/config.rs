//! Dispatch configuration.

use crate::error::{DispatchError, DispatchResult};
use chatwire_dialects::{parse_model_string, DialectId};
use chatwire_streaming::{DecimatorConfig, DemuxConfig};

/// Environment variable holding the number of concurrently active streams.
pub const THROTTLE_UNITS_ENV: &str = "CHATWIRE_THROTTLE_UNITS";

/// Configuration for one dispatched stream.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Wire dialect of the stream.
    pub dialect: DialectId,
    /// Requested model.
    pub model: String,
    /// Concurrently active streams sharing the consumer. `0` disables
    /// repaint decimation.
    pub throttle_units: u32,
    /// Decimator tuning.
    pub decimator: DecimatorConfig,
    /// Demuxer limits.
    pub demux: DemuxConfig,
}

impl DispatchConfig {
    /// Create a config for `model` spoken in `dialect`.
    pub fn new(dialect: DialectId, model: impl Into<String>) -> Self {
        Self {
            dialect,
            model: model.into(),
            throttle_units: 1,
            decimator: DecimatorConfig::default(),
            demux: DemuxConfig::default(),
        }
    }

    /// Create a config from a `provider:model` string.
    pub fn from_model_string(identifier: &str) -> DispatchResult<Self> {
        let (dialect, model) = parse_model_string(identifier)?;
        Ok(Self::new(dialect, model))
    }

    /// Create a config from a `provider:model` string, reading the
    /// throttle units from `CHATWIRE_THROTTLE_UNITS` when set.
    pub fn from_env(identifier: &str) -> DispatchResult<Self> {
        let config = Self::from_model_string(identifier)?;
        match std::env::var(THROTTLE_UNITS_ENV) {
            Ok(value) => {
                let units = parse_throttle_units(&value)?;
                Ok(config.throttle_units(units))
            }
            Err(_) => Ok(config),
        }
    }

    /// Set throttle units.
    pub fn throttle_units(mut self, units: u32) -> Self {
        self.throttle_units = units;
        self
    }

    /// Set decimator tuning.
    pub fn decimator(mut self, config: DecimatorConfig) -> Self {
        self.decimator = config;
        self
    }

    /// Set demuxer limits.
    pub fn demux(mut self, config: DemuxConfig) -> Self {
        self.demux = config;
        self
    }
}

fn parse_throttle_units(value: &str) -> DispatchResult<u32> {
    value.trim().parse().map_err(|_| {
        DispatchError::Configuration(format!(
            "{} must be a non-negative integer, got '{}'",
            THROTTLE_UNITS_ENV, value
        ))
    })
}
