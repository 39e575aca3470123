//! CLI Entry Point for smurf-hwctl
//!
//! Every hardware setter is a subcommand:
//!
//! ```bash
//! smurf-hwctl atten --kind uc --instance 2 16
//! smurf-hwctl atten-all --kind dc 0
//! smurf-hwctl waveform --instance 1 1
//! smurf-hwctl buffer 524288
//! smurf-hwctl daq-adc --bay 0 3 4096
//! smurf-hwctl apply config/profiles/band1.toml
//! smurf-hwctl --dry-run app-info --json
//! ```
//!
//! `--dry-run` swaps the configured transport for an in-memory store whose
//! waveform-engine start addresses are seeded with their buffer index, and prints
//! every write at the end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use smurf_hwctl::config::{HwConfig, DEFAULT_CONFIG_PATH};
use smurf_hwctl::device::SmurfApplication;
use smurf_hwctl::hardware::address::ENGINE_BUFFERS;
use smurf_hwctl::hardware::{Attenuator, AttenuatorKind, Buffer, DaqMux, PvContext, Waveform};
use smurf_hwctl::logging;
use smurf_hwctl::profile::HardwareProfile;
use smurf_hwctl::pv::{MemoryPvStore, PvStore};
use smurf_hwctl::validation::DEFAULT_BUFFER_SIZE;

#[derive(Parser)]
#[command(name = "smurf-hwctl")]
#[command(about = "SMuRF hardware configuration over EPICS process variables", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use an in-memory store and print the writes instead of touching hardware
    #[arg(long, global = true)]
    dry_run: bool,

    /// Override the PV root (server name)
    #[arg(long, global = true)]
    root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Generic,
    Uc,
    Dc,
}

impl From<Kind> for AttenuatorKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Generic => AttenuatorKind::Generic,
            Kind::Uc => AttenuatorKind::Uc,
            Kind::Dc => AttenuatorKind::Dc,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Set one attenuator (levels 0, 1, 2, 4, 8, 16, 31)
    Atten {
        #[arg(long, value_enum, default_value = "generic")]
        kind: Kind,
        /// Instance 1-4 (default 1)
        #[arg(long, allow_negative_numbers = true)]
        instance: Option<i64>,
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },

    /// Set all four attenuators of a bank
    AttenAll {
        #[arg(long, value_enum, default_value = "generic")]
        kind: Kind,
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },

    /// Set one waveform selector (0 or 1)
    Waveform {
        /// Instance 0-3 (default 0)
        #[arg(long, allow_negative_numbers = true)]
        instance: Option<i64>,
        #[arg(allow_negative_numbers = true)]
        select: i64,
    },

    /// Set all four waveform selectors
    WaveformAll {
        #[arg(allow_negative_numbers = true)]
        select: i64,
    },

    /// Size the DAQ mux buffer and waveform-engine end addresses
    Buffer {
        #[arg(default_value_t = DEFAULT_BUFFER_SIZE)]
        size: u64,
    },

    /// Route an ADC through the DAQ mux
    DaqAdc {
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        bay: i64,
        #[arg(allow_negative_numbers = true)]
        index: i64,
        #[arg(default_value_t = DEFAULT_BUFFER_SIZE)]
        length: u64,
    },

    /// Route a DAC through the DAQ mux
    DaqDac {
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        bay: i64,
        #[arg(allow_negative_numbers = true)]
        index: i64,
        #[arg(default_value_t = DEFAULT_BUFFER_SIZE)]
        length: u64,
    },

    /// Apply a hardware profile
    Apply { profile: PathBuf },

    /// Show the SMuRF application device
    AppInfo {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Also write the variables to their PVs
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HwConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(root) = &cli.root {
        config.epics.root = root.clone();
        config.validate()?;
    }
    logging::init_from_config(&config)?;

    let dry_run = cli.dry_run.then(|| Arc::new(MemoryPvStore::new()));
    let store: Arc<dyn PvStore> = match &dry_run {
        Some(memory) => {
            for n in 0..ENGINE_BUFFERS {
                memory
                    .seed(&config.addresses().engine_start(n), n as i64)
                    .await;
            }
            memory.clone() as Arc<dyn PvStore>
        }
        None => config.store(),
    };
    let ctx = config.context(store);

    run(cli.command, &ctx).await?;

    if let Some(memory) = dry_run {
        for (pv, value) in memory.writes().await {
            println!("{pv} <- {value}");
        }
    }
    Ok(())
}

async fn run(command: Commands, ctx: &PvContext) -> Result<()> {
    match command {
        Commands::Atten {
            kind,
            instance,
            level,
        } => {
            let mut atten = Attenuator::new(ctx, kind.into(), instance);
            let applied = atten.set_value(level).await?;
            tracing::info!(instance = ?atten.instance(), level = applied, "attenuator set");
        }
        Commands::AttenAll { kind, level } => {
            let mut atten = Attenuator::new(ctx, kind.into(), None);
            atten.set_all(level).await?;
        }
        Commands::Waveform { instance, select } => {
            Waveform::new(ctx, instance).set_value(select).await?;
        }
        Commands::WaveformAll { select } => {
            Waveform::new(ctx, None).set_all(select).await?;
        }
        Commands::Buffer { size } => {
            let applied = Buffer::new(ctx).set_buffer(size).await?;
            tracing::info!(size = applied, "buffer sized");
        }
        Commands::DaqAdc { bay, index, length } => {
            let selection = DaqMux::new(ctx, bay).set_adc_daq(index, length).await?;
            tracing::info!(?selection, "ADC routed");
        }
        Commands::DaqDac { bay, index, length } => {
            let selection = DaqMux::new(ctx, bay).set_dac_daq(index, length).await?;
            tracing::info!(?selection, "DAC routed");
        }
        Commands::Apply { profile } => {
            let loaded = HardwareProfile::load(&profile)
                .with_context(|| format!("loading profile {}", profile.display()))?;
            if loaded.is_empty() {
                tracing::warn!(profile = %profile.display(), "profile has no settings");
            }
            loaded.apply(ctx).await?;
        }
        Commands::AppInfo { json, publish } => {
            let app = SmurfApplication::from_env()?;
            if publish {
                app.device()
                    .publish(ctx.store().as_ref(), ctx.addresses())
                    .await?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(app.device())?);
            } else {
                println!("{} ({})", app.device().name(), app.device().description());
                for variable in app.device().variables() {
                    println!(
                        "  {:<20} {:?}  {}",
                        variable.name, variable.mode, variable.value
                    );
                }
            }
        }
    }
    Ok(())
}
