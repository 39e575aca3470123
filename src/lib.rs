//! # SMuRF Hardware Control Library
//!
//! Configuration helpers for the SMuRF cryogenic readout electronics. The knobs
//! (attenuators, waveform selectors, DAQ multiplexers, buffer sizing) live in
//! firmware and are reached as EPICS process variables; this crate validates the
//! requested settings, builds the PV names and performs the writes.
//!
//! ## Crate Structure
//!
//! - **`hardware`**: the `Attenuator`, `Waveform`, `Buffer` and `DaqMux` helpers,
//!   the PV name map and the shared `PvContext`.
//! - **`pv`**: the `PvStore` transport capability, with an in-memory store and a
//!   Channel Access store driving `caget`/`caput`.
//! - **`validation`**: pure input checks. Invalid input is corrected, never rejected.
//! - **`device`**: a small device tree of local variables and the
//!   `SmurfApplication` metadata device.
//! - **`profile`**: TOML hardware profiles applied as one sequence.
//! - **`config`**: Figment-based configuration (file plus `SMURF_HWCTL_` env).
//! - **`logging`**: `tracing-subscriber` initialisation.
//! - **`error`**: the `HwError` enum.

pub mod config;
pub mod device;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod profile;
pub mod pv;
pub mod validation;

pub use error::{HwError, HwResult};
