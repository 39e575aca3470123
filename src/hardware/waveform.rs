//! Waveform selectors of the SysgenCryo base blocks (instances 0 through 3).

use tracing::{info, warn};

use super::PvContext;
use crate::error::HwResult;
use crate::validation;

/// Waveform selector for one SysgenCryo base.
///
/// Same correction rules as [`super::Attenuator`]: invalid selectors are written as
/// 0, and an unset or out-of-range instance becomes 0 for this and later calls.
#[derive(Debug, Clone)]
pub struct Waveform {
    ctx: PvContext,
    instance: Option<i64>,
}

impl Waveform {
    /// Waveform helper; `None` means instance 0.
    pub fn new(ctx: &PvContext, instance: Option<i64>) -> Self {
        Self {
            ctx: ctx.clone(),
            instance,
        }
    }

    /// Instance used by `set_value`.
    pub fn instance(&self) -> Option<i64> {
        self.instance
    }

    /// Write the selector (0 or 1) and wait for it to settle.
    pub async fn set_value(&mut self, select: i64) -> HwResult<i64> {
        let checked = validation::waveform_select(select);
        if let Some(reason) = checked.reason {
            warn!(requested = select, applied = checked.value, "{reason}");
        }

        let instance = validation::waveform_instance(self.instance);
        if let Some(reason) = instance.reason {
            warn!(requested = ?self.instance, applied = instance.value, "{reason}");
        }
        self.instance = Some(instance.value);

        let pv = self.ctx.addresses().waveform_select(instance.value);
        info!(pv = %pv, value = checked.value, "setting waveform select");
        self.ctx.write_settled(&pv, checked.value).await?;
        Ok(checked.value)
    }

    /// Write the selector to every base, 0 through 3.
    pub async fn set_all(&mut self, select: i64) -> HwResult<i64> {
        let mut applied = 0;
        for instance in validation::WAVEFORM_INSTANCES {
            self.instance = Some(instance);
            applied = self.set_value(select).await?;
        }
        Ok(applied)
    }
}
