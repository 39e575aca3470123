//! Custom error types for the crate.
//!
//! `HwError` is the single error type returned by the library. Invalid user input
//! (out-of-range attenuation levels, instance indices, bays) is never an error:
//! the hardware helpers correct it and log a warning. What remains are failures
//! of the PV transport, values read back from the control system that cannot be
//! used, device-tree misuse, and configuration or profile loading problems.
//!
//! By using `#[from]`, `HwError` can be created from the underlying error types
//! with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type HwResult<T> = std::result::Result<T, HwError>;

/// Errors returned by the library.
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum HwError {
    /// The transport failed to carry a read or write for `pv`.
    #[error("PV transport error on '{pv}': {message}")]
    Transport { pv: String, message: String },

    /// The transport does not know the PV.
    #[error("PV not found: {0}")]
    PvNotFound(String),

    /// A value read back cannot be used as `expected`.
    #[error("Unexpected value from '{pv}': expected {expected}, got '{got}'")]
    UnexpectedValue {
        pv: String,
        expected: &'static str,
        got: String,
    },

    /// `start + 4 * size` does not fit in an `i64`.
    #[error("End address overflow for '{pv}': start {start} + 4 * {size}")]
    AddressOverflow { pv: String, start: i64, size: u32 },

    /// The mux selectors for an ADC or DAC index do not fit in an `i64`.
    #[error("{input} index {index} has no representable mux selector")]
    SelectorOverflow { input: &'static str, index: i64 },

    /// A write targeted a read-only device variable.
    #[error("Variable '{0}' is read-only")]
    ReadOnly(String),

    /// The device has no variable of that name.
    #[error("Unknown variable '{variable}' in device '{device}'")]
    UnknownVariable { device: String, variable: String },

    /// A variable name was registered twice on one device.
    #[error("Variable '{variable}' already registered in device '{device}'")]
    DuplicateVariable { device: String, variable: String },

    /// Figment could not extract the configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The configuration loaded but holds unusable values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// A hardware profile is not valid TOML for the profile schema.
    #[error("Profile error: {0}")]
    Profile(#[from] toml::de::Error),

    /// Reading a profile or configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for HwError {
    fn from(value: figment::Error) -> Self {
        HwError::Config(Box::new(value))
    }
}

impl HwError {
    /// Build a transport error for `pv`.
    pub fn transport(pv: &str, message: impl Into<String>) -> Self {
        HwError::Transport {
            pv: pv.to_string(),
            message: message.into(),
        }
    }
}
