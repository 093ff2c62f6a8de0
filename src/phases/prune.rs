//! `duplicacy prune` of the configured storages.

use super::{parse_targets, Phase, PhaseContext, PhaseError, PlainSink};
use crate::config::{TargetConfig, TargetError};
use crate::runlog::RunLog;

/// A validated prune target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneTarget {
    pub storage: String,
    /// Retention options, e.g. `-keep 0:365 -keep 30:30`.
    pub keep: Vec<String>,
}

impl PruneTarget {
    /// Read the target from its configuration. Requires `storage` and `keep`.
    pub fn from_config(index: usize, config: &TargetConfig) -> Result<Self, TargetError> {
        let storage = config.require(Phase::Prune, index, "storage")?.to_string();
        let keep = config
            .require(Phase::Prune, index, "keep")?
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Self { storage, keep })
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "prune".to_string(),
            "-all".to_string(),
            "-storage".to_string(),
            self.storage.clone(),
        ];
        args.extend(self.keep.iter().cloned());
        args
    }
}

/// Prune all `targets` in order.
pub fn run(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    targets: &[TargetConfig],
) -> Result<(), PhaseError> {
    let targets = parse_targets(targets, PruneTarget::from_config)?;

    for target in &targets {
        let args = target.args();
        ctx.announce(log, &format!("Pruning storage {}", target.storage), &args);

        let res = ctx.execute(&args, &mut PlainSink { log: &mut *log });
        if let Err(e) = res {
            return Err(ctx.failed(log, Phase::Prune, &target.storage, e));
        }
    }
    Ok(())
}
