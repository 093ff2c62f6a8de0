//! `duplicacy check` of the configured storages.

use super::{parse_targets, Phase, PhaseContext, PhaseError, PlainSink};
use crate::config::{TargetConfig, TargetError};
use crate::runlog::RunLog;

/// A validated check target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    pub storage: String,
    /// Check the snapshots of all repositories, set by `all = "true"`.
    pub all: bool,
}

impl CheckTarget {
    pub fn from_config(index: usize, config: &TargetConfig) -> Result<Self, TargetError> {
        Ok(Self {
            storage: config.require(Phase::Check, index, "storage")?.to_string(),
            all: config.is_enabled("all"),
        })
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "check".to_string(),
            "-storage".to_string(),
            self.storage.clone(),
        ];
        if self.all {
            args.push("-all".to_string());
        }
        args
    }
}

/// Check all `targets` in order.
pub fn run(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    targets: &[TargetConfig],
) -> Result<(), PhaseError> {
    let targets = parse_targets(targets, CheckTarget::from_config)?;

    for target in &targets {
        let args = target.args();
        ctx.announce(log, &format!("Checking storage {}", target.storage), &args);

        let res = ctx.execute(&args, &mut PlainSink { log: &mut *log });
        if let Err(e) = res {
            return Err(ctx.failed(log, Phase::Check, &target.storage, e));
        }
    }
    Ok(())
}
