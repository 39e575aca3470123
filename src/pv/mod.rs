//! Process-variable transport.
//!
//! The hardware helpers never talk to the control system directly. They are handed
//! a [`PvStore`], a small capability exposing `read`/`write` on named process
//! variables, so validation and address computation stay independent of how the
//! values actually reach the firmware.
//!
//! Two transports ship with the crate:
//!
//! - [`MemoryPvStore`] keeps values in memory and records every operation. Tests
//!   use it directly; the CLI uses it for `--dry-run`.
//! - [`CaToolsStore`] drives the EPICS `caget`/`caput` command-line tools.

pub mod ca_tools;
pub mod memory;

pub use ca_tools::CaToolsStore;
pub use memory::{MemoryPvStore, PvOp};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HwResult;

/// A value carried to or from a process variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PvValue {
    /// Boolean, written as 0 or 1.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Free text.
    Text(String),
    /// Integer waveform.
    IntArray(Vec<i64>),
}

impl PvValue {
    /// Integer view of the value, if it has one.
    ///
    /// Floats with no fractional part count as integers since `caget` prints some
    /// integer records in floating-point notation. Floats outside the `i64` range
    /// have no integer view.
    pub fn as_i64(&self) -> Option<i64> {
        // 2^63 is exactly representable; i64::MAX is not.
        const I64_RANGE: std::ops::Range<f64> = i64::MIN as f64..i64::MAX as f64;
        match self {
            PvValue::Int(v) => Some(*v),
            PvValue::Bool(b) => Some(i64::from(*b)),
            PvValue::Float(f) if f.fract() == 0.0 && I64_RANGE.contains(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Parse the textual form printed by `caget -t`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            return PvValue::Int(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            return PvValue::Float(v);
        }
        PvValue::Text(raw.to_string())
    }

    /// Short type name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PvValue::Bool(_) => "bool",
            PvValue::Int(_) => "int",
            PvValue::Float(_) => "float",
            PvValue::Text(_) => "text",
            PvValue::IntArray(_) => "int array",
        }
    }
}

impl fmt::Display for PvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PvValue::Bool(b) => write!(f, "{}", u8::from(*b)),
            PvValue::Int(v) => write!(f, "{v}"),
            PvValue::Float(v) => write!(f, "{v}"),
            PvValue::Text(s) => f.write_str(s),
            PvValue::IntArray(values) => {
                let joined = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                f.write_str(&joined)
            }
        }
    }
}

impl From<i64> for PvValue {
    fn from(value: i64) -> Self {
        PvValue::Int(value)
    }
}

impl From<u32> for PvValue {
    fn from(value: u32) -> Self {
        PvValue::Int(i64::from(value))
    }
}

impl From<bool> for PvValue {
    fn from(value: bool) -> Self {
        PvValue::Bool(value)
    }
}

impl From<&str> for PvValue {
    fn from(value: &str) -> Self {
        PvValue::Text(value.to_string())
    }
}

impl From<String> for PvValue {
    fn from(value: String) -> Self {
        PvValue::Text(value)
    }
}

impl From<Vec<i64>> for PvValue {
    fn from(value: Vec<i64>) -> Self {
        PvValue::IntArray(value)
    }
}

/// Capability: named process-variable access.
///
/// # Contract
/// - `write` returns once the control system accepted the value
/// - `read` returns the current value; a PV the transport cannot resolve is
///   `HwError::PvNotFound`
/// - No retries: transport failures go straight back to the caller
#[async_trait]
pub trait PvStore: Send + Sync {
    /// Read the current value of `pv`.
    async fn read(&self, pv: &str) -> HwResult<PvValue>;

    /// Write `value` to `pv`.
    async fn write(&self, pv: &str, value: PvValue) -> HwResult<()>;
}
