//! In-memory PV store.
//!
//! Holds values in a map and keeps an ordered log of every read and write, which is
//! what tests assert against. Reads of PVs that were never written or seeded fail
//! with `PvNotFound`, like a `caget` on a name the server does not host.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{PvStore, PvValue};
use crate::error::{HwError, HwResult};

/// One recorded transport operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PvOp {
    /// A read of the PV.
    Read(String),
    /// A write of the value to the PV.
    Write(String, PvValue),
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, PvValue>,
    log: Vec<PvOp>,
}

/// Thread-safe in-memory transport with an operation log.
///
/// # Example
///
/// ```rust,ignore
/// let store = MemoryPvStore::new();
/// store.seed("dans_epics:X", 4_i64).await;
/// store.write("dans_epics:Y", PvValue::Int(1)).await?;
/// assert_eq!(store.writes().await.len(), 1);
/// ```
#[derive(Default)]
pub struct MemoryPvStore {
    inner: RwLock<Inner>,
}

impl MemoryPvStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a value without recording it in the log.
    pub async fn seed(&self, pv: &str, value: impl Into<PvValue>) {
        self.inner
            .write()
            .await
            .values
            .insert(pv.to_string(), value.into());
    }

    /// Current value of `pv`, without recording a read.
    pub async fn value(&self, pv: &str) -> Option<PvValue> {
        self.inner.read().await.values.get(pv).cloned()
    }

    /// Every operation performed so far, oldest first.
    pub async fn log(&self) -> Vec<PvOp> {
        self.inner.read().await.log.clone()
    }

    /// Only the writes, oldest first.
    pub async fn writes(&self) -> Vec<(String, PvValue)> {
        self.inner
            .read()
            .await
            .log
            .iter()
            .filter_map(|op| match op {
                PvOp::Write(pv, value) => Some((pv.clone(), value.clone())),
                PvOp::Read(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl PvStore for MemoryPvStore {
    async fn read(&self, pv: &str) -> HwResult<PvValue> {
        let mut inner = self.inner.write().await;
        inner.log.push(PvOp::Read(pv.to_string()));
        let value = inner
            .values
            .get(pv)
            .cloned()
            .ok_or_else(|| HwError::PvNotFound(pv.to_string()))?;
        tracing::debug!(pv, %value, "memory read");
        Ok(value)
    }

    async fn write(&self, pv: &str, value: PvValue) -> HwResult<()> {
        tracing::debug!(pv, %value, "memory write");
        let mut inner = self.inner.write().await;
        inner.log.push(PvOp::Write(pv.to_string(), value.clone()));
        inner.values.insert(pv.to_string(), value);
        Ok(())
    }
}
