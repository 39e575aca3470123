//! Configuration using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (`config/smurf_hwctl.toml` by default)
//! 2. Environment variables prefixed with `SMURF_HWCTL_` (`__` separates sections)
//!
//! Every key has a default, so a missing file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use smurf_hwctl::config::HwConfig;
//!
//! let config = HwConfig::load()?;
//! println!("PV root: {}", config.epics.root);
//! # Ok::<(), smurf_hwctl::error::HwError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{HwError, HwResult};
use crate::hardware::{AddressMap, PvContext, DEFAULT_ROOT};
use crate::pv::{CaToolsStore, MemoryPvStore, PvStore};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/smurf_hwctl.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SMURF_HWCTL_";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HwConfig {
    /// Application name and logging.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Control-system connection.
    #[serde(default)]
    pub epics: EpicsConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Which PV transport to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// In-memory store; nothing leaves the process.
    Memory,
    /// EPICS `caget`/`caput` tools.
    #[default]
    CaTools,
}

/// Control-system connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpicsConfig {
    /// Server name leading every PV
    #[serde(default = "default_root")]
    pub root: String,
    /// PV transport.
    #[serde(default)]
    pub transport: TransportKind,
    /// Delay after attenuator and waveform writes, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// `caget` executable.
    #[serde(default = "default_caget")]
    pub caget: String,
    /// `caput` executable.
    #[serde(default = "default_caput")]
    pub caput: String,
    /// Channel Access timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for EpicsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            transport: TransportKind::default(),
            settle_ms: default_settle_ms(),
            caget: default_caget(),
            caput: default_caput(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Default value functions
fn default_name() -> String {
    "smurf-hwctl".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_settle_ms() -> u64 {
    100
}

fn default_caget() -> String {
    "caget".to_string()
}

fn default_caput() -> String {
    "caput".to_string()
}

fn default_timeout_secs() -> f64 {
    1.0
}

impl HwConfig {
    /// Load from the default file and the environment.
    pub fn load() -> HwResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path` and the environment, then validate.
    ///
    /// Environment variables override the file, e.g.
    /// `SMURF_HWCTL_EPICS__ROOT=smurf_server_s5`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> HwResult<Self> {
        let config: HwConfig = Figment::from(Serialized::defaults(HwConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> HwResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(HwError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.as_str()) {
            return Err(HwError::Configuration(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            )));
        }

        if self.epics.root.trim().is_empty() {
            return Err(HwError::Configuration("PV root cannot be empty".into()));
        }

        if !(self.epics.timeout_secs.is_finite() && self.epics.timeout_secs > 0.0) {
            return Err(HwError::Configuration(format!(
                "Invalid timeout_secs {}. Must be greater than 0",
                self.epics.timeout_secs
            )));
        }

        Ok(())
    }

    /// Settling delay after attenuator and waveform writes.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.epics.settle_ms)
    }

    /// PV name map under the configured root.
    pub fn addresses(&self) -> AddressMap {
        AddressMap::new(self.epics.root.clone())
    }

    /// Transport selected by the configuration.
    pub fn store(&self) -> Arc<dyn PvStore> {
        match self.epics.transport {
            TransportKind::Memory => Arc::new(MemoryPvStore::new()),
            TransportKind::CaTools => Arc::new(
                CaToolsStore::new()
                    .with_programs(self.epics.caget.clone(), self.epics.caput.clone())
                    .with_timeout(Duration::from_secs_f64(self.epics.timeout_secs)),
            ),
        }
    }

    /// Context over `store` with the configured root and settling delay.
    pub fn context(&self, store: Arc<dyn PvStore>) -> PvContext {
        PvContext::new(store)
            .with_addresses(self.addresses())
            .with_settle(self.settle())
    }
}
