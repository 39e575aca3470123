//! EPICS Channel Access transport built on the `caget`/`caput` command-line tools.
//!
//! Every operation spawns one tool process:
//!
//! - read: `caget -t -w <timeout> -- <pv>`
//! - scalar write: `caput -t -w <timeout> -- <pv> <value>`
//! - array write: `caput -t -w <timeout> -a -- <pv> <count> <v0> <v1> ...`
//!
//! `--` ends option parsing, so negative values are never taken for flags.
//! `-t` makes both tools print the bare value, which [`PvValue::parse`] understands.
//! A non-zero exit status is reported as `HwError::Transport` carrying the tool's
//! stderr.

use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use super::{PvStore, PvValue};
use crate::error::{HwError, HwResult};

/// Channel Access transport backed by the EPICS base command-line tools.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use smurf_hwctl::pv::CaToolsStore;
///
/// let store = CaToolsStore::new().with_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct CaToolsStore {
    caget: String,
    caput: String,
    timeout: Duration,
}

impl Default for CaToolsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CaToolsStore {
    /// Use `caget`/`caput` from `PATH` with a 1 second Channel Access timeout.
    pub fn new() -> Self {
        Self {
            caget: "caget".to_string(),
            caput: "caput".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Override the tool executables.
    pub fn with_programs(mut self, caget: impl Into<String>, caput: impl Into<String>) -> Self {
        self.caget = caget.into();
        self.caput = caput.into();
        self
    }

    /// Set the Channel Access timeout passed with `-w`.
    ///
    /// The process itself is given one extra second before it is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait_arg(&self) -> String {
        format!("{}", self.timeout.as_secs_f64())
    }

    pub(crate) fn read_args(&self, pv: &str) -> Vec<String> {
        vec![
            "-t".to_string(),
            "-w".to_string(),
            self.wait_arg(),
            "--".to_string(),
            pv.to_string(),
        ]
    }

    pub(crate) fn write_args(&self, pv: &str, value: &PvValue) -> Vec<String> {
        let mut args = vec!["-t".to_string(), "-w".to_string(), self.wait_arg()];
        match value {
            PvValue::IntArray(values) => {
                args.push("-a".to_string());
                args.push("--".to_string());
                args.push(pv.to_string());
                args.push(values.len().to_string());
                args.extend(values.iter().map(|v| v.to_string()));
            }
            scalar => {
                args.push("--".to_string());
                args.push(pv.to_string());
                args.push(scalar.to_string());
            }
        }
        args
    }

    async fn run(&self, program: &str, args: Vec<String>, pv: &str) -> HwResult<Output> {
        let mut command = Command::new(program);
        command.args(&args).kill_on_drop(true);

        let deadline = self.timeout + Duration::from_secs(1);
        let output = tokio::time::timeout(deadline, command.output())
            .await
            .map_err(|_| HwError::transport(pv, format!("{program} timed out after {deadline:?}")))?
            .map_err(|e| HwError::transport(pv, format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(HwError::transport(
                pv,
                format!("{program} exited with {}: {stderr}", output.status),
            ));
        }
        Ok(output)
    }
}

#[async_trait]
impl PvStore for CaToolsStore {
    async fn read(&self, pv: &str) -> HwResult<PvValue> {
        let output = self.run(&self.caget, self.read_args(pv), pv).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = PvValue::parse(&stdout);
        tracing::debug!(pv, %value, "caget");
        Ok(value)
    }

    async fn write(&self, pv: &str, value: PvValue) -> HwResult<()> {
        tracing::debug!(pv, %value, "caput");
        self.run(&self.caput, self.write_args(pv, &value), pv).await?;
        Ok(())
    }
}
