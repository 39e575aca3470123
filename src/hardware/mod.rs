//! SMuRF hardware configuration helpers.
//!
//! Each helper validates its input (correcting it rather than failing, see
//! [`crate::validation`]), builds the PV name and writes through the injected
//! [`PvStore`]:
//!
//! - [`Attenuator`] - UC/DC attenuator levels, settled 100 ms after each write
//! - [`Waveform`] - waveform selectors, settled 100 ms after each write
//! - [`Buffer`] - DAQ mux buffer size plus waveform-engine end addresses
//! - [`DaqMux`] - mux input selection for an ADC or DAC, with buffer sizing
//!
//! All of them share a [`PvContext`], which bundles the transport, the PV name
//! map and the settling delay.

pub mod address;
pub mod attenuator;
pub mod buffer;
pub mod daq_mux;
pub mod waveform;

pub use address::{AddressMap, AttenuatorKind, DEFAULT_ROOT};
pub use attenuator::Attenuator;
pub use buffer::Buffer;
pub use daq_mux::{Bay, DaqMux, MuxSelection};
pub use waveform::Waveform;

use std::sync::Arc;
use std::time::Duration;

use crate::error::HwResult;
use crate::pv::{PvStore, PvValue};

/// Settling delay after attenuator and waveform writes.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Transport, PV names and timing shared by the helpers.
#[derive(Clone)]
pub struct PvContext {
    store: Arc<dyn PvStore>,
    addresses: AddressMap,
    settle: Duration,
}

impl PvContext {
    /// Context with the default root and settling delay.
    pub fn new(store: Arc<dyn PvStore>) -> Self {
        Self {
            store,
            addresses: AddressMap::default(),
            settle: DEFAULT_SETTLE,
        }
    }

    /// Use a different PV name map.
    pub fn with_addresses(mut self, addresses: AddressMap) -> Self {
        self.addresses = addresses;
        self
    }

    /// Use a different settling delay.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// The transport.
    pub fn store(&self) -> &Arc<dyn PvStore> {
        &self.store
    }

    /// The PV name map.
    pub fn addresses(&self) -> &AddressMap {
        &self.addresses
    }

    /// Delay applied after settled writes.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub(crate) async fn read(&self, pv: &str) -> HwResult<PvValue> {
        self.store.read(pv).await
    }

    pub(crate) async fn write(&self, pv: &str, value: impl Into<PvValue>) -> HwResult<()> {
        self.store.write(pv, value.into()).await
    }

    /// Write, then wait out the settling delay.
    pub(crate) async fn write_settled(&self, pv: &str, value: impl Into<PvValue>) -> HwResult<()> {
        self.write(pv, value).await?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PvContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PvContext")
            .field("addresses", &self.addresses)
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::pv::MemoryPvStore;

    /// Memory-backed context without settling delay.
    pub fn memory_context() -> (Arc<MemoryPvStore>, PvContext) {
        let store = Arc::new(MemoryPvStore::new());
        let ctx = PvContext::new(store.clone()).with_settle(Duration::ZERO);
        (store, ctx)
    }
}
