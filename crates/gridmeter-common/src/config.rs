//! Gridmeter configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Scheduler tick interval in milliseconds
    pub scheduler_tick_ms: u64,
    /// Capacity of per-task sample delivery channels
    pub sample_channel_capacity: usize,
    /// Endpoint identity of this server, announced during bootstrap
    pub server: EndpointSettings,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            scheduler_tick_ms: crate::DEFAULT_SCHEDULER_TICK_MS,
            sample_channel_capacity: crate::DEFAULT_SAMPLE_CHANNEL_CAPACITY,
            server: EndpointSettings::default(),
        }
    }
}

impl MeterConfig {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("GRIDMETER_SCHEDULER_TICK_MS") {
            if let Ok(v) = val.parse() {
                cfg.scheduler_tick_ms = v;
            }
        }
        if let Ok(val) = std::env::var("GRIDMETER_SAMPLE_CHANNEL_CAPACITY") {
            if let Ok(v) = val.parse() {
                cfg.sample_channel_capacity = v;
            }
        }
        if let Ok(host) = std::env::var("GRIDMETER_HOST") {
            cfg.server.host = host;
        }
        if let Ok(port) = std::env::var("GRIDMETER_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.server.port = p;
            }
        }

        Ok(cfg)
    }
}

/// Announced endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    pub schema: String,
    pub host: String,
    pub port: u16,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            schema: "http".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = MeterConfig::default();
        assert_eq!(cfg.scheduler_tick_ms, crate::DEFAULT_SCHEDULER_TICK_MS);
        assert_eq!(cfg.server.port, 8080);
    }
}
