// Configuration management

use crate::error::{Result, SysgaugeError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Validated monitor configuration, immutable once the engine starts
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base unit names, without the `.service` suffix
    pub services: Vec<String>,
    pub interval: Duration,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            interval: Duration::from_secs(60),
            verbose: false,
        }
    }
}

/// On-disk layout. Keys mirror the collectd plugin block.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "Service", default)]
    service: Option<OneOrMany>,
    #[serde(rename = "Interval", default)]
    interval: Option<NumberLike>,
    #[serde(rename = "Verbose", default)]
    verbose: Option<BoolLike>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Text(String),
}

impl Config {
    /// Get default config path: /etc/sysgauge/config.yaml
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/sysgauge/config.yaml")
    }

    /// Load config from path.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(path) => (path, true),
            None => (Self::default_path(), false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(SysgaugeError::Config(format!(
                    "config file {} does not exist",
                    config_path.display()
                ))
                .into());
            }
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a YAML configuration block
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawConfig = serde_yaml::from_str(contents)
            .map_err(|e| SysgaugeError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mut config = Self::default();

        if let Some(service) = raw.service {
            let names = match service {
                OneOrMany::One(name) => vec![name],
                OneOrMany::Many(names) => names,
            };
            for name in names {
                if name.trim().is_empty() {
                    return Err(SysgaugeError::Config("empty Service name".to_string()).into());
                }
                config.services.push(name);
            }
        }

        if let Some(interval) = raw.interval {
            let secs = match interval {
                NumberLike::Number(secs) => secs,
                NumberLike::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                    SysgaugeError::Config(format!("invalid Interval '{}'", text))
                })?,
            };
            config.interval = parse_interval(secs)?;
        }

        if let Some(verbose) = raw.verbose {
            config.verbose = match verbose {
                BoolLike::Bool(flag) => flag,
                BoolLike::Text(text) => text.to_lowercase() == "true",
            };
        }

        Ok(config)
    }

    /// Polling interval in fractional seconds
    pub fn interval_secs(&self) -> f64 {
        self.interval.as_secs_f64()
    }
}

fn parse_interval(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SysgaugeError::Config(format!(
            "Interval must be a positive number of seconds, got {}",
            secs
        ))
        .into());
    }
    let interval = Duration::try_from_secs_f64(secs)
        .map_err(|e| SysgaugeError::Config(format!("invalid Interval {}: {}", secs, e)))?;
    // sub-nanosecond values round to zero, which the ticker cannot run
    if interval.is_zero() {
        return Err(SysgaugeError::Config(format!(
            "Interval {} is shorter than one nanosecond",
            secs
        ))
        .into());
    }
    Ok(interval)
}
