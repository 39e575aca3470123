//! Attenuator banks of the microwave mux core.
//!
//! Levels are restricted to 0, 1, 2, 4, 8, 16 and 31; instances run 1 through 4.
//! Invalid levels are written as 0. An unset or invalid instance is replaced by 1,
//! and the replacement sticks: later calls on the same helper address instance 1.

use tracing::{info, warn};

use super::{AttenuatorKind, PvContext};
use crate::error::HwResult;
use crate::validation;

/// One attenuator (or, through [`Attenuator::set_all`], a whole bank).
///
/// # Example
///
/// ```rust,ignore
/// let mut uc = Attenuator::new(&ctx, AttenuatorKind::Uc, Some(2));
/// uc.set_value(16).await?;  // ...ATT:UC[2] <- 16
/// uc.set_all(0).await?;     // ...ATT:UC[1..=4] <- 0
/// ```
#[derive(Debug, Clone)]
pub struct Attenuator {
    ctx: PvContext,
    kind: AttenuatorKind,
    instance: Option<i64>,
}

impl Attenuator {
    /// `instance` of `None` means "not specified"; the first write uses 1.
    pub fn new(ctx: &PvContext, kind: AttenuatorKind, instance: Option<i64>) -> Self {
        Self {
            ctx: ctx.clone(),
            kind,
            instance,
        }
    }

    /// Up-converter attenuator.
    pub fn uc(ctx: &PvContext, instance: Option<i64>) -> Self {
        Self::new(ctx, AttenuatorKind::Uc, instance)
    }

    /// Down-converter attenuator.
    pub fn dc(ctx: &PvContext, instance: Option<i64>) -> Self {
        Self::new(ctx, AttenuatorKind::Dc, instance)
    }

    /// Bank this helper writes to.
    pub fn kind(&self) -> AttenuatorKind {
        self.kind
    }

    /// Instance used by `set_value`; `None` until one is set or substituted.
    pub fn instance(&self) -> Option<i64> {
        self.instance
    }

    /// PV base, without the `[instance]` suffix.
    pub fn location(&self) -> String {
        self.ctx.addresses().attenuator_base(self.kind)
    }

    /// Write `level` to this instance and wait for it to settle.
    ///
    /// Returns the level actually written.
    pub async fn set_value(&mut self, level: i64) -> HwResult<i64> {
        let checked = validation::attenuation_level(level);
        if let Some(reason) = checked.reason {
            warn!(requested = level, applied = checked.value, "{reason}");
        }

        let instance = validation::attenuator_instance(self.instance);
        if let Some(reason) = instance.reason {
            warn!(requested = ?self.instance, applied = instance.value, "{reason}");
        }
        self.instance = Some(instance.value);

        let pv = self.ctx.addresses().attenuator(self.kind, instance.value);
        info!(pv = %pv, value = checked.value, "setting attenuator");
        self.ctx.write_settled(&pv, checked.value).await?;
        Ok(checked.value)
    }

    /// Write `level` to instances 1 through 4 in order.
    ///
    /// Leaves the helper pointing at instance 4.
    pub async fn set_all(&mut self, level: i64) -> HwResult<i64> {
        let mut applied = 0;
        for instance in validation::ATTENUATOR_INSTANCES {
            self.instance = Some(instance);
            applied = self.set_value(level).await?;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::test_support::memory_context;
    use crate::pv::PvValue;
    use tracing_test::traced_test;

    const UC: &str = "dans_epics:AMCc:FpgaTopLevel:AppTop:AppCore:MicrowaveMuxCore[0]:ATT:UC";
    const DC: &str = "dans_epics:AMCc:FpgaTopLevel:AppTop:AppCore:MicrowaveMuxCore[0]:ATT:DC";

    #[tokio::test]
    async fn writes_valid_level() {
        let (store, ctx) = memory_context();
        let mut atten = Attenuator::uc(&ctx, Some(2));

        assert_eq!(atten.set_value(16).await.unwrap(), 16);
        assert_eq!(
            store.writes().await,
            vec![(format!("{UC}[2]"), PvValue::Int(16))]
        );
        assert_eq!(atten.instance(), Some(2));
    }

    #[traced_test]
    #[tokio::test]
    async fn invalid_level_written_as_zero() {
        let (store, ctx) = memory_context();
        let mut atten = Attenuator::dc(&ctx, Some(3));

        assert_eq!(atten.set_value(20).await.unwrap(), 0);
        assert_eq!(
            store.writes().await,
            vec![(format!("{DC}[3]"), PvValue::Int(0))]
        );
        assert!(logs_contain("attenuator value invalid"));
    }

    #[traced_test]
    #[tokio::test]
    async fn unset_instance_defaults_and_persists() {
        let (store, ctx) = memory_context();
        let mut atten = Attenuator::uc(&ctx, None);

        atten.set_value(4).await.unwrap();
        assert_eq!(atten.instance(), Some(1));
        assert!(logs_contain("attenuator instance not specified"));

        atten.set_value(8).await.unwrap();
        assert_eq!(
            store.writes().await,
            vec![
                (format!("{UC}[1]"), PvValue::Int(4)),
                (format!("{UC}[1]"), PvValue::Int(8)),
            ]
        );
    }

    #[tokio::test]
    async fn out_of_range_instance_defaults_and_persists() {
        for bad in [0, 5, -1, 42] {
            let (store, ctx) = memory_context();
            let mut atten = Attenuator::dc(&ctx, Some(bad));
            atten.set_value(1).await.unwrap();
            assert_eq!(atten.instance(), Some(1));
            assert_eq!(store.writes().await[0].0, format!("{DC}[1]"));
        }
    }

    #[tokio::test]
    async fn set_all_walks_the_bank() {
        let (store, ctx) = memory_context();
        let mut atten = Attenuator::uc(&ctx, Some(2));

        atten.set_all(31).await.unwrap();

        let pvs: Vec<String> = store.writes().await.into_iter().map(|(pv, _)| pv).collect();
        assert_eq!(
            pvs,
            (1..=4).map(|i| format!("{UC}[{i}]")).collect::<Vec<_>>()
        );
        assert_eq!(atten.instance(), Some(4));
    }

    #[test]
    fn generic_location_has_no_bank_tag() {
        let (_, ctx) = memory_context();
        let atten = Attenuator::new(&ctx, AttenuatorKind::Generic, None);
        assert_eq!(
            atten.location(),
            "dans_epics:AMCc:FpgaTopLevel:AppTop:AppCore:MicrowaveMuxCore[0]:ATT:"
        );
    }
}
