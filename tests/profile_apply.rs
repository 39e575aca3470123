//! Integration tests for hardware profiles.

use smurf_hwctl::hardware::address::ENGINE_BUFFERS;
use smurf_hwctl::hardware::{MuxSelection, PvContext};
use smurf_hwctl::profile::HardwareProfile;
use smurf_hwctl::pv::{MemoryPvStore, PvValue};
use smurf_hwctl::HwError;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn context() -> (Arc<MemoryPvStore>, PvContext) {
    let store = Arc::new(MemoryPvStore::new());
    let ctx = PvContext::new(store.clone()).with_settle(Duration::ZERO);
    (store, ctx)
}

const PROFILE: &str = r#"
[[attenuators]]
kind = "uc"
instance = 2
level = 16

[[attenuators]]
kind = "dc"
level = 3

[[waveforms]]
instance = 1
select = 1

[daq]
bay = 0
source = "adc"
index = 1
length = 256
"#;

#[tokio::test]
async fn applies_sections_in_order() {
    let (store, ctx) = context();
    for n in 0..ENGINE_BUFFERS {
        store.seed(&ctx.addresses().engine_start(n), 0_i64).await;
    }

    let profile = HardwareProfile::from_toml(PROFILE).unwrap();
    let report = profile.apply(&ctx).await.unwrap();

    assert_eq!(report.attenuator_writes, 5);
    assert_eq!(report.waveform_writes, 1);
    assert_eq!(report.buffer_size, Some(256));
    assert_eq!(report.mux, Some(MuxSelection { channel0: 4, channel1: 5 }));

    let pvs: Vec<String> = store.writes().await.into_iter().map(|(pv, _)| pv).collect();
    assert!(pvs[0].ends_with("ATT:UC[2]"));
    for (i, pv) in pvs[1..5].iter().enumerate() {
        assert!(pv.ends_with(&format!("ATT:DC[{}]", i + 1)));
    }
    assert!(pvs[5].ends_with("Base[1]:waveformSelect"));
    assert!(pvs[6].ends_with("DataBufferSize"));
    assert!(pvs[pvs.len() - 1].ends_with("InputMuxSel[1]"));

    // Off-step level corrected to 0 for the whole DC bank
    assert_eq!(
        store
            .value("dans_epics:AMCc:FpgaTopLevel:AppTop:AppCore:MicrowaveMuxCore[0]:ATT:DC[4]")
            .await,
        Some(PvValue::Int(0))
    );
}

#[tokio::test]
async fn stops_at_first_transport_error() {
    let (store, ctx) = context();
    // No start addresses seeded: the buffer step cannot read them.
    let profile = HardwareProfile::from_toml(
        r#"
        [[waveforms]]
        select = 1

        [buffer]
        size = 16

        [daq]
        source = "dac"
        index = 0
        "#,
    )
    .unwrap();

    let err = profile.apply(&ctx).await.unwrap_err();
    assert!(matches!(err, HwError::PvNotFound(_)));
    assert!(store
        .value("dans_epics:AMCc:FpgaTopLevel:AppTop:DaqMuxV2[0]:InputMuxSel[0]")
        .await
        .is_none());
    assert_eq!(store.writes().await.len(), 5);
}

#[tokio::test]
async fn unrepresentable_mux_index_stops_before_routing() {
    let (store, ctx) = context();
    let profile = HardwareProfile::from_toml(
        r#"
        [[attenuators]]
        instance = 1
        level = 8

        [daq]
        source = "dac"
        index = 9223372036854775807
        "#,
    )
    .unwrap();

    let err = profile.apply(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        HwError::SelectorOverflow {
            input: "DAC",
            index: i64::MAX
        }
    ));

    let writes = store.writes().await;
    assert_eq!(writes.len(), 1);
    assert!(writes[0].0.ends_with("ATT:[1]"));
}

#[tokio::test]
async fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROFILE.as_bytes()).unwrap();

    let profile = HardwareProfile::load(file.path()).unwrap();
    assert_eq!(profile.attenuators.len(), 2);
    assert!(profile.daq.is_some());
}

#[test]
fn missing_file_is_io_error() {
    let err = HardwareProfile::load("/nonexistent/profile.toml").unwrap_err();
    assert!(matches!(err, HwError::Io(_)));
}

#[test]
fn shipped_profile_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/profiles/band1.toml");
    let profile = HardwareProfile::load(path).unwrap();
    assert_eq!(profile.attenuators.len(), 2);
    assert!(!profile.is_empty());
}
