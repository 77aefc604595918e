use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, ops::Range, path::Path, path::PathBuf, time::Duration};

use crate::{Error, InternalResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemConfig {
    /// Display string printed when the ready signal arrives.
    #[serde(default = "default_console_faces", alias = "ConsoleFaces")]
    pub console_faces: String,

    #[serde(default = "default_spawn_count", alias = "SpawnCount")]
    pub spawn_count: usize,

    #[serde(default = "default_max_components", alias = "MaxComponents")]
    pub max_components: usize,

    /// PRNG seed; process start time when absent.
    #[serde(default, alias = "Seed")]
    pub seed: Option<u64>,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    #[serde(default = "default_shutdown_timeout", with = "duration_ms")]
    pub shutdown_timeout: Duration,

    #[serde(default = "default_true")]
    pub bootstrap_enabled: bool,

    #[serde(default = "default_bootstrap_delay")]
    pub bootstrap_delay: DelayRange,

    #[serde(default = "default_spawn_delay")]
    pub spawn_delay: DelayRange,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: DelayRange,
}

/// A half-open `[min, max)` range of delays, in milliseconds on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DelayRange {
    #[serde(with = "duration_ms")]
    pub min: Duration,
    #[serde(with = "duration_ms")]
    pub max: Duration,
}

impl DelayRange {
    pub fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn as_range(&self) -> Range<Duration> {
        self.min..self.max
    }
}

impl SystemConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        let config: Self = from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but cannot run.
    pub fn validate(&self) -> InternalResult<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config("event_buffer_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Host count, never below one.
    pub fn effective_spawn_count(&self) -> usize {
        self.spawn_count.max(1)
    }

    /// Upper bound on variants per host, never below one.
    pub fn effective_max_components(&self) -> usize {
        self.max_components.max(1)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            console_faces: default_console_faces(),
            spawn_count: default_spawn_count(),
            max_components: default_max_components(),
            seed: None,
            log_dir: default_log_dir(),
            event_buffer_size: default_event_buffer_size(),
            shutdown_timeout: default_shutdown_timeout(),
            bootstrap_enabled: default_true(),
            bootstrap_delay: default_bootstrap_delay(),
            spawn_delay: default_spawn_delay(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "Failed to open config file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

// Default values
fn default_console_faces() -> String {
    ":3".to_string()
}
fn default_spawn_count() -> usize {
    8
}
fn default_max_components() -> usize {
    4
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_event_buffer_size() -> usize {
    1000
}
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_true() -> bool {
    true
}
fn default_bootstrap_delay() -> DelayRange {
    DelayRange::from_millis(150, 500)
}
fn default_spawn_delay() -> DelayRange {
    DelayRange::from_millis(50, 200)
}
fn default_sweep_interval() -> DelayRange {
    DelayRange::from_millis(5000, 8000)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
