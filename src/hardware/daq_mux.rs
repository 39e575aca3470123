//! DAQ mux input selection.
//!
//! The mux in each bay has two input selectors. Selector values are offset by one
//! pair: ADC `n` is `(n + 1) * 2` and `(n + 1) * 2 + 1`, DACs sit ten further up.
//! So ADC 0 reads as (2, 3) and DAC 0 as (12, 13). Indices are not range-checked,
//! but an index whose selectors do not fit in an `i64` is refused before any write.

use serde::Serialize;
use tracing::{info, warn};

use super::{Buffer, PvContext};
use crate::error::{HwError, HwResult};
use crate::validation;

const DAC_OFFSET: i64 = 10;

/// Carrier bay hosting the mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bay {
    /// Bay 0, `DaqMuxV2[0]`.
    Zero,
    /// Bay 1, `DaqMuxV2[1]`.
    One,
}

impl Bay {
    /// Resolve a bay number; anything but 0 or 1 falls back to bay 0.
    pub fn resolve(bay: i64) -> Self {
        let checked = validation::bay(bay);
        if let Some(reason) = checked.reason {
            warn!(requested = bay, applied = checked.value, "{reason}");
        }
        if checked.value == 1 {
            Bay::One
        } else {
            Bay::Zero
        }
    }

    /// Index used in the mux PV names.
    pub fn index(self) -> u8 {
        match self {
            Bay::Zero => 0,
            Bay::One => 1,
        }
    }
}

/// The two selector values written to the mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MuxSelection {
    /// Value for `InputMuxSel[0]`.
    pub channel0: i64,
    /// Value for `InputMuxSel[1]`, always `channel0 + 1`.
    pub channel1: i64,
}

impl MuxSelection {
    /// Selectors routing ADC `adc` to the buffer, or `None` on overflow.
    pub fn adc(adc: i64) -> Option<Self> {
        Self::from_pair(adc, 0)
    }

    /// Selectors routing DAC `dac` to the buffer, or `None` on overflow.
    pub fn dac(dac: i64) -> Option<Self> {
        Self::from_pair(dac, DAC_OFFSET)
    }

    fn from_pair(index: i64, offset: i64) -> Option<Self> {
        let channel0 = index
            .checked_add(1)?
            .checked_mul(2)?
            .checked_add(offset)?;
        Some(Self {
            channel0,
            channel1: channel0.checked_add(1)?,
        })
    }
}

/// DAQ mux of one bay, with its data buffer.
#[derive(Debug, Clone)]
pub struct DaqMux {
    ctx: PvContext,
    bay: Bay,
    buffer: Buffer,
}

impl DaqMux {
    /// Mux of `bay`; unknown bays fall back to bay 0.
    pub fn new(ctx: &PvContext, bay: i64) -> Self {
        Self {
            ctx: ctx.clone(),
            bay: Bay::resolve(bay),
            buffer: Buffer::new(ctx),
        }
    }

    /// Resolved bay.
    pub fn bay(&self) -> Bay {
        self.bay
    }

    /// PV names of the two input selectors.
    pub fn channel_locations(&self) -> (String, String) {
        let addresses = self.ctx.addresses();
        (
            addresses.mux_input(self.bay.index(), 0),
            addresses.mux_input(self.bay.index(), 1),
        )
    }

    /// Route ADC `adc` into a buffer of `length` samples.
    pub async fn set_adc_daq(&self, adc: i64, length: u64) -> HwResult<MuxSelection> {
        let selection = MuxSelection::adc(adc).ok_or(HwError::SelectorOverflow {
            input: "ADC",
            index: adc,
        })?;
        self.route(selection, length).await
    }

    /// Route DAC `dac` into a buffer of `length` samples.
    pub async fn set_dac_daq(&self, dac: i64, length: u64) -> HwResult<MuxSelection> {
        let selection = MuxSelection::dac(dac).ok_or(HwError::SelectorOverflow {
            input: "DAC",
            index: dac,
        })?;
        self.route(selection, length).await
    }

    async fn route(&self, selection: MuxSelection, length: u64) -> HwResult<MuxSelection> {
        self.buffer.set_buffer(length).await?;

        let (channel0_pv, channel1_pv) = self.channel_locations();
        info!(
            bay = self.bay.index(),
            channel0 = selection.channel0,
            channel1 = selection.channel1,
            "selecting DAQ mux inputs"
        );
        self.ctx.write(&channel0_pv, selection.channel0).await?;
        self.ctx.write(&channel1_pv, selection.channel1).await?;
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::address::ENGINE_BUFFERS;
    use crate::hardware::test_support::memory_context;
    use crate::pv::{MemoryPvStore, PvValue};
    use std::sync::Arc;
    use tracing_test::traced_test;

    async fn seeded() -> (Arc<MemoryPvStore>, PvContext) {
        let (store, ctx) = memory_context();
        for n in 0..ENGINE_BUFFERS {
            store.seed(&ctx.addresses().engine_start(n), n as i64).await;
        }
        (store, ctx)
    }

    #[test]
    fn selector_arithmetic() {
        assert_eq!(MuxSelection::adc(0), Some(MuxSelection { channel0: 2, channel1: 3 }));
        assert_eq!(MuxSelection::adc(3), Some(MuxSelection { channel0: 8, channel1: 9 }));
        assert_eq!(MuxSelection::dac(0), Some(MuxSelection { channel0: 12, channel1: 13 }));
        assert_eq!(MuxSelection::dac(3), Some(MuxSelection { channel0: 18, channel1: 19 }));
        assert_eq!(MuxSelection::adc(-1), Some(MuxSelection { channel0: 0, channel1: 1 }));
    }

    #[test]
    fn extreme_indices_have_no_selection() {
        assert_eq!(MuxSelection::adc(i64::MAX), None);
        assert_eq!(MuxSelection::dac(i64::MAX / 2), None);
        assert_eq!(MuxSelection::adc(i64::MIN), None);
    }

    #[tokio::test]
    async fn overflowing_index_writes_nothing() {
        let (store, ctx) = seeded().await;
        let mux = DaqMux::new(&ctx, 0);

        let err = mux.set_adc_daq(i64::MAX, 16).await.unwrap_err();
        assert!(matches!(err, HwError::SelectorOverflow { input: "ADC", index: i64::MAX }));
        let err = mux.set_dac_daq(i64::MAX / 2, 16).await.unwrap_err();
        assert!(matches!(err, HwError::SelectorOverflow { input: "DAC", .. }));
        assert!(store.log().await.is_empty());
    }

    #[traced_test]
    #[test]
    fn unknown_bay_uses_bay_zero_templates() {
        let (_, ctx) = memory_context();
        let mux = DaqMux::new(&ctx, 7);
        assert_eq!(mux.bay(), Bay::Zero);
        assert_eq!(
            mux.channel_locations(),
            (
                "dans_epics:AMCc:FpgaTopLevel:AppTop:DaqMuxV2[0]:InputMuxSel[0]".to_string(),
                "dans_epics:AMCc:FpgaTopLevel:AppTop:DaqMuxV2[0]:InputMuxSel[1]".to_string(),
            )
        );
        assert!(logs_contain("bay value unrecognized"));
    }

    #[tokio::test]
    async fn adc_routing_sizes_buffer_first() {
        let (store, ctx) = seeded().await;
        let mux = DaqMux::new(&ctx, 1);

        let selection = mux.set_adc_daq(3, 2048).await.unwrap();
        assert_eq!(selection, MuxSelection { channel0: 8, channel1: 9 });

        let writes = store.writes().await;
        assert_eq!(
            writes.first(),
            Some(&(ctx.addresses().buffer_size(), PvValue::Int(2048)))
        );
        let tail = &writes[writes.len() - 2..];
        assert_eq!(
            tail,
            &[
                (
                    "dans_epics:AMCc:FpgaTopLevel:AppTop:DaqMuxV2[1]:InputMuxSel[0]".to_string(),
                    PvValue::Int(8)
                ),
                (
                    "dans_epics:AMCc:FpgaTopLevel:AppTop:DaqMuxV2[1]:InputMuxSel[1]".to_string(),
                    PvValue::Int(9)
                ),
            ]
        );
        assert_eq!(
            store.value(&ctx.addresses().engine_end(2)).await,
            Some(PvValue::Int(2 + 4 * 2048))
        );
    }

    #[tokio::test]
    async fn dac_routing() {
        let (store, ctx) = seeded().await;
        let mux = DaqMux::new(&ctx, 0);

        let selection = mux.set_dac_daq(0, 16).await.unwrap();
        assert_eq!(selection, MuxSelection { channel0: 12, channel1: 13 });
        let (ch0, ch1) = mux.channel_locations();
        assert_eq!(store.value(&ch0).await, Some(PvValue::Int(12)));
        assert_eq!(store.value(&ch1).await, Some(PvValue::Int(13)));
    }

    #[tokio::test]
    async fn buffer_failure_skips_mux_writes() {
        let (store, ctx) = memory_context();
        let mux = DaqMux::new(&ctx, 0);

        assert!(mux.set_adc_daq(0, 16).await.is_err());
        let (ch0, _) = mux.channel_locations();
        assert_eq!(store.value(&ch0).await, None);
    }
}
