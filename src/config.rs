use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Symbol label carried on the book and in telemetry.
    pub symbol: String,
    /// Anchor of the mean-reverting price walk, in quote units.
    pub base_price: f64,
    /// Target order submissions per second.
    pub target_ops: u64,
    /// Orders generated between pacing checkpoints.
    pub batch_size: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            base_price: 92_000.0,
            target_ops: 1_000_000,
            batch_size: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Sampling period of the telemetry publisher.
    pub interval_ms: u64,
    /// Price levels reported per side.
    pub depth: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            depth: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    COMPACT,
    JSON,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<LogLevel> for LevelFilter {
    fn from(val: LogLevel) -> Self {
        match val {
            LogLevel::TRACE => LevelFilter::TRACE,
            LogLevel::DEBUG => LevelFilter::DEBUG,
            LogLevel::INFO => LevelFilter::INFO,
            LogLevel::WARN => LevelFilter::WARN,
            LogLevel::ERROR => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::TRACE,
            format: LogFormat::COMPACT,
        }
    }
}

/// Top-level application configuration wrapper.
///
/// This struct groups all configuration sections used by the application.
/// Loaded with the following precedence (lowest to highest):
/// 1) Built-in defaults
/// 2) Optional config file (if present)
/// 3) Environment variables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub telemetry: TelemetryConfig,
    pub logger: LogConfig,
}

impl AppConfig {
    pub fn load(config_path: &Path) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if config_path.exists() {
            figment = figment.merge(Toml::file(config_path));
        }
        figment = figment.merge(Env::prefixed("TICKMILL_").split("__"));

        let cfg = figment.extract()?;
        Ok(cfg)
    }
}
