//! PV names of the SMuRF firmware registers touched by the helpers.
//!
//! Names must match the server's register map exactly. Only the leading server
//! name (`dans_epics` by default) is configurable.

use serde::{Deserialize, Serialize};

/// Server name used when none is configured.
pub const DEFAULT_ROOT: &str = "dans_epics";

/// Number of waveform-engine buffers resized by a buffer update.
pub const ENGINE_BUFFERS: usize = 4;

const MICROWAVE_MUX_CORE: &str = "AMCc:FpgaTopLevel:AppTop:AppCore:MicrowaveMuxCore[0]:ATT:";
const SYSGEN_CRYO: &str = "AMCc:FpgaTopLevel:AppTop:AppCore:SysgenCryo:Base";
const DAQ_MUX: &str = "AMCc:FpgaTopLevel:AppTop:DaqMuxV2";
const WAVEFORM_ENGINE: &str =
    "AMCc:FpgaTopLevel:AmcCarrierCore:AmcCarrierBsa:BsaWaveformEngine[0]:WaveformEngineBuffers";

/// Attenuator bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttenuatorKind {
    /// Bank-less base address.
    #[default]
    Generic,
    /// Up-converter attenuators (`UC`).
    Uc,
    /// Down-converter attenuators (`DC`).
    Dc,
}

impl AttenuatorKind {
    fn tag(self) -> &'static str {
        match self {
            AttenuatorKind::Generic => "",
            AttenuatorKind::Uc => "UC",
            AttenuatorKind::Dc => "DC",
        }
    }
}

/// Builds PV names under one server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    root: String,
}

impl Default for AddressMap {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl AddressMap {
    /// Map with PV names under `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Server name leading every PV.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Attenuator base, before the instance suffix.
    pub fn attenuator_base(&self, kind: AttenuatorKind) -> String {
        format!("{}:{}{}", self.root, MICROWAVE_MUX_CORE, kind.tag())
    }

    /// Attenuator register of `instance`.
    pub fn attenuator(&self, kind: AttenuatorKind, instance: i64) -> String {
        format!("{}[{}]", self.attenuator_base(kind), instance)
    }

    /// Waveform selector of base `instance`.
    pub fn waveform_select(&self, instance: i64) -> String {
        format!("{}:{}[{}]:waveformSelect", self.root, SYSGEN_CRYO, instance)
    }

    /// Data buffer size register. Always on DaqMuxV2[0], whichever bay is muxed.
    pub fn buffer_size(&self) -> String {
        format!("{}:{}[0]:DataBufferSize", self.root, DAQ_MUX)
    }

    /// Start address of waveform-engine buffer `buffer`.
    pub fn engine_start(&self, buffer: usize) -> String {
        format!("{}:{}:StartAddr[{}]", self.root, WAVEFORM_ENGINE, buffer)
    }

    /// End address of waveform-engine buffer `buffer`.
    pub fn engine_end(&self, buffer: usize) -> String {
        format!("{}:{}:EndAddr[{}]", self.root, WAVEFORM_ENGINE, buffer)
    }

    /// Input selector `channel` (0 or 1) of the mux in `bay`.
    pub fn mux_input(&self, bay: u8, channel: u8) -> String {
        format!("{}:{}[{}]:InputMuxSel[{}]", self.root, DAQ_MUX, bay, channel)
    }

    /// PV of a device-tree variable.
    pub fn device_variable(&self, device: &str, variable: &str) -> String {
        format!("{}:AMCc:{}:{}", self.root, device, variable)
    }
}
