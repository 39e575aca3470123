//! SMuRF application container device.

use super::{Device, LocalVariable};
use crate::error::HwResult;
use crate::pv::PvValue;

/// Slots in `EnabledBays`. Unused slots hold [`NO_BAY`].
const BAY_SLOTS: usize = 2;

/// Placeholder for an empty `EnabledBays` slot.
pub const NO_BAY: i64 = 2;

/// Metadata about the running server: version, start-up command line, enabled bays
/// and whether configuration succeeded.
#[derive(Debug, Clone)]
pub struct SmurfApplication {
    device: Device,
}

impl SmurfApplication {
    /// Device name and PV path segment.
    pub const NAME: &'static str = "SmurfApplication";

    /// Build from the process command line (`args[0]` is the program).
    pub fn new<I, S>(args: I) -> HwResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let script = args.first().cloned().unwrap_or_default();
        let arguments = args.get(1..).unwrap_or_default().join(" ");

        let directory = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.display().to_string()))
            .unwrap_or_default();

        let mut device = Device::new(Self::NAME, "SMuRF Application Container");
        device.add(LocalVariable::read_only(
            "SmurfVersion",
            "PySMuRF Version",
            env!("CARGO_PKG_VERSION"),
        ))?;
        device.add(LocalVariable::read_only(
            "SmurfDirectory",
            "Path to the PySMuRF Python Files",
            directory,
        ))?;
        device.add(LocalVariable::read_only(
            "StartupScript",
            "PySMuRF Server Startup Script",
            script,
        ))?;
        device.add(LocalVariable::read_only(
            "StartupArguments",
            "PySMuRF Server Startup Arguments",
            arguments,
        ))?;
        device.add(LocalVariable::read_write(
            "SomePySmurfVariable",
            "PySMuRF Variable Example",
            0_i64,
        ))?;
        // Fixed size of two: the PV is created with the initial length.
        device.add(LocalVariable::read_only(
            "EnabledBays",
            "List of bays that are enabled",
            vec![NO_BAY; BAY_SLOTS],
        ))?;
        device.add(LocalVariable::read_only(
            "SystemConfigured",
            "The system was configured correctly",
            false,
        ))?;

        Ok(Self { device })
    }

    /// Build from `std::env::args()`.
    pub fn from_env() -> HwResult<Self> {
        Self::new(std::env::args())
    }

    /// The underlying device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Mutable access to the underlying device.
    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }

    /// Record the enabled bays, padding unused slots with [`NO_BAY`].
    ///
    /// Bays beyond the second slot are dropped.
    pub fn set_enabled_bays(&mut self, bays: &[i64]) -> HwResult<()> {
        let mut slots = vec![NO_BAY; BAY_SLOTS];
        for (slot, bay) in slots.iter_mut().zip(bays) {
            *slot = *bay;
        }
        self.device.update("EnabledBays", slots)
    }

    /// Set the `SystemConfigured` flag.
    pub fn set_configured(&mut self, configured: bool) -> HwResult<()> {
        self.device.update("SystemConfigured", configured)
    }

    /// Whether `SystemConfigured` is set.
    pub fn is_configured(&self) -> bool {
        matches!(
            self.device.get("SystemConfigured"),
            Ok(PvValue::Bool(true))
        )
    }
}
