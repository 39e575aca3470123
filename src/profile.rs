//! Hardware profiles: a TOML description of settings applied in one go.
//!
//! Sections are applied in a fixed order: attenuators, waveforms, buffer, DAQ mux.
//! Values go through the same helpers (and the same corrections) as single
//! commands. Application stops at the first transport error.
//!
//! ```toml
//! [[attenuators]]
//! kind = "uc"
//! instance = 2
//! level = 16
//!
//! [[attenuators]]
//! kind = "dc"      # no instance: all four
//! level = 0
//!
//! [[waveforms]]
//! select = 1
//!
//! [daq]
//! bay = 0
//! source = "adc"
//! index = 0
//! length = 524288
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::HwResult;
use crate::hardware::{
    Attenuator, AttenuatorKind, Buffer, DaqMux, MuxSelection, PvContext, Waveform,
};
use crate::validation::{self, DEFAULT_BUFFER_SIZE};

/// One attenuator entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttenuatorSetting {
    /// Bank; generic when omitted.
    #[serde(default)]
    pub kind: AttenuatorKind,
    /// Absent: the whole bank.
    pub instance: Option<i64>,
    /// Requested attenuation level.
    pub level: i64,
}

/// One waveform entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSetting {
    /// Absent: all four bases.
    pub instance: Option<i64>,
    /// Requested selector.
    pub select: i64,
}

/// Buffer section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSetting {
    /// Requested size in samples.
    pub size: u64,
}

/// Signal routed through the DAQ mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaqSource {
    /// An ADC index.
    Adc,
    /// A DAC index.
    Dac,
}

/// DAQ mux section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaqSetting {
    /// Bay; 0 when omitted.
    #[serde(default)]
    pub bay: i64,
    /// ADC or DAC.
    pub source: DaqSource,
    /// ADC or DAC index.
    pub index: i64,
    /// Buffer length in samples.
    #[serde(default = "default_length")]
    pub length: u64,
}

fn default_length() -> u64 {
    DEFAULT_BUFFER_SIZE
}

/// A full profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Attenuator entries, applied first.
    #[serde(default)]
    pub attenuators: Vec<AttenuatorSetting>,
    /// Waveform entries.
    #[serde(default)]
    pub waveforms: Vec<WaveformSetting>,
    /// Buffer sizing.
    pub buffer: Option<BufferSetting>,
    /// DAQ mux routing, applied last.
    pub daq: Option<DaqSetting>,
}

/// What a profile application wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileReport {
    /// Attenuator registers written.
    pub attenuator_writes: usize,
    /// Waveform selectors written.
    pub waveform_writes: usize,
    /// Last buffer size written.
    pub buffer_size: Option<u32>,
    /// Mux selection written.
    pub mux: Option<MuxSelection>,
}

impl HardwareProfile {
    /// Parse a profile from TOML text.
    pub fn from_toml(text: &str) -> HwResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a profile file.
    pub fn load<P: AsRef<Path>>(path: P) -> HwResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Whether the profile has no settings at all.
    pub fn is_empty(&self) -> bool {
        self.attenuators.is_empty()
            && self.waveforms.is_empty()
            && self.buffer.is_none()
            && self.daq.is_none()
    }

    /// Apply every section through `ctx`.
    pub async fn apply(&self, ctx: &PvContext) -> HwResult<ProfileReport> {
        let mut report = ProfileReport::default();

        for setting in &self.attenuators {
            let mut atten = Attenuator::new(ctx, setting.kind, setting.instance);
            match setting.instance {
                Some(_) => {
                    atten.set_value(setting.level).await?;
                    report.attenuator_writes += 1;
                }
                None => {
                    atten.set_all(setting.level).await?;
                    report.attenuator_writes += 4;
                }
            }
        }

        for setting in &self.waveforms {
            let mut waveform = Waveform::new(ctx, setting.instance);
            match setting.instance {
                Some(_) => {
                    waveform.set_value(setting.select).await?;
                    report.waveform_writes += 1;
                }
                None => {
                    waveform.set_all(setting.select).await?;
                    report.waveform_writes += 4;
                }
            }
        }

        if let Some(buffer) = &self.buffer {
            report.buffer_size = Some(Buffer::new(ctx).set_buffer(buffer.size).await?);
        }

        if let Some(daq) = &self.daq {
            let mux = DaqMux::new(ctx, daq.bay);
            let selection = match daq.source {
                DaqSource::Adc => mux.set_adc_daq(daq.index, daq.length).await?,
                DaqSource::Dac => mux.set_dac_daq(daq.index, daq.length).await?,
            };
            report.buffer_size = Some(validation::buffer_size(daq.length).value);
            report.mux = Some(selection);
        }

        info!(?report, "profile applied");
        Ok(report)
    }
}
