//! DAQ mux data buffer sizing.
//!
//! The buffer size goes to the mux, then each of the four waveform-engine buffers
//! gets its end address moved to `start + 4 * size` (32-bit samples). The start
//! addresses are read back from the firmware, so this is the one place where a
//! remote read feeds a write.

use tracing::{debug, info, warn};

use super::address::ENGINE_BUFFERS;
use super::PvContext;
use crate::error::{HwError, HwResult};
use crate::validation;

/// Bytes per buffered sample.
const BYTES_PER_SAMPLE: i64 = 4;

/// Data buffer sizing for the DAQ mux and the waveform engine.
#[derive(Debug, Clone)]
pub struct Buffer {
    ctx: PvContext,
}

impl Buffer {
    /// Buffer sizing over `ctx`.
    pub fn new(ctx: &PvContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    /// Size the buffers for `size` samples, clamped to 0xFFFF_FFFF.
    ///
    /// Returns the size written.
    pub async fn set_buffer(&self, size: u64) -> HwResult<u32> {
        let checked = validation::buffer_size(size);
        if let Some(reason) = checked.reason {
            warn!(requested = size, applied = checked.value, "{reason}");
        }
        let size = checked.value;

        let addresses = self.ctx.addresses();
        let size_pv = addresses.buffer_size();
        info!(pv = %size_pv, value = size, "setting DAQ mux buffer size");
        self.ctx.write(&size_pv, size).await?;

        for buffer in 0..ENGINE_BUFFERS {
            let start_pv = addresses.engine_start(buffer);
            let start_value = self.ctx.read(&start_pv).await?;
            let start = start_value.as_i64().ok_or_else(|| HwError::UnexpectedValue {
                pv: start_pv.clone(),
                expected: "integer start address",
                got: start_value.to_string(),
            })?;

            let end = end_address(start, size).ok_or_else(|| HwError::AddressOverflow {
                pv: start_pv.clone(),
                start,
                size,
            })?;

            let end_pv = addresses.engine_end(buffer);
            debug!(buffer, start, end, "moving waveform engine end address");
            self.ctx.write(&end_pv, end).await?;
        }

        Ok(size)
    }
}

/// End address of a buffer holding `size` samples from `start`.
pub fn end_address(start: i64, size: u32) -> Option<i64> {
    i64::from(size)
        .checked_mul(BYTES_PER_SAMPLE)
        .and_then(|bytes| start.checked_add(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::test_support::memory_context;
    use crate::pv::{PvOp, PvValue};

    async fn seeded() -> (std::sync::Arc<crate::pv::MemoryPvStore>, PvContext) {
        let (store, ctx) = memory_context();
        for n in 0..ENGINE_BUFFERS {
            store
                .seed(&ctx.addresses().engine_start(n), 0x1000_0000_i64 * (n as i64 + 1))
                .await;
        }
        (store, ctx)
    }

    #[test]
    fn end_address_arithmetic() {
        assert_eq!(end_address(0, 1), Some(4));
        assert_eq!(end_address(100, 524_288), Some(100 + 2_097_152));
        assert_eq!(end_address(i64::MAX - 3, 1), None);
    }

    #[tokio::test]
    async fn writes_size_then_end_addresses() {
        let (store, ctx) = seeded().await;
        let buffer = Buffer::new(&ctx);

        assert_eq!(buffer.set_buffer(1024).await.unwrap(), 1024);

        let log = store.log().await;
        assert_eq!(
            log[0],
            PvOp::Write(ctx.addresses().buffer_size(), PvValue::Int(1024))
        );
        for n in 0..ENGINE_BUFFERS {
            assert_eq!(log[1 + 2 * n], PvOp::Read(ctx.addresses().engine_start(n)));
            let start = 0x1000_0000_i64 * (n as i64 + 1);
            assert_eq!(
                log[2 + 2 * n],
                PvOp::Write(ctx.addresses().engine_end(n), PvValue::Int(start + 4096))
            );
        }
        assert_eq!(log.len(), 1 + 2 * ENGINE_BUFFERS);
    }

    #[tokio::test]
    async fn oversized_request_is_clamped() {
        let (store, ctx) = seeded().await;
        let buffer = Buffer::new(&ctx);

        let applied = buffer.set_buffer(u64::MAX).await.unwrap();
        assert_eq!(applied, u32::MAX);
        assert_eq!(
            store.value(&ctx.addresses().buffer_size()).await,
            Some(PvValue::Int(4_294_967_295))
        );
        assert_eq!(
            store.value(&ctx.addresses().engine_end(0)).await,
            Some(PvValue::Int(0x1000_0000 + 4 * 4_294_967_295))
        );
    }

    #[tokio::test]
    async fn non_numeric_start_address_is_an_error() {
        let (store, ctx) = memory_context();
        store
            .seed(&ctx.addresses().engine_start(0), "not-a-number")
            .await;

        let err = Buffer::new(&ctx).set_buffer(8).await.unwrap_err();
        assert!(matches!(err, HwError::UnexpectedValue { .. }));
    }

    #[tokio::test]
    async fn out_of_range_float_start_address_is_an_error() {
        let (store, ctx) = memory_context();
        for n in 0..ENGINE_BUFFERS {
            store
                .seed(&ctx.addresses().engine_start(n), PvValue::Float(-1e30))
                .await;
        }

        let err = Buffer::new(&ctx).set_buffer(16).await.unwrap_err();
        assert!(matches!(
            err,
            HwError::UnexpectedValue { ref pv, .. } if *pv == ctx.addresses().engine_start(0)
        ));
        assert_eq!(store.value(&ctx.addresses().engine_end(0)).await, None);
    }

    #[tokio::test]
    async fn missing_start_address_propagates() {
        let (_, ctx) = memory_context();
        let err = Buffer::new(&ctx).set_buffer(8).await.unwrap_err();
        assert!(matches!(err, HwError::PvNotFound(_)));
    }
}
