//! `duplicacy copy` between storages.

use std::time::Instant;

use super::{parse_targets, Phase, PhaseContext, PhaseError};
use crate::config::{TargetConfig, TargetError};
use crate::duplicacy::output::{classify_copy, CopyStats};
use crate::duplicacy::LineSink;
use crate::report::CopyResult;
use crate::runlog::RunLog;
use crate::util::format_duration;

/// A validated copy target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    pub from: String,
    pub to: String,
    pub threads: String,
}

impl CopyTarget {
    /// Read the target from its configuration. Requires `threads`, `from` and `to`.
    pub fn from_config(index: usize, config: &TargetConfig) -> Result<Self, TargetError> {
        Ok(Self {
            threads: config.require(Phase::Copy, index, "threads")?.to_string(),
            from: config.require(Phase::Copy, index, "from")?.to_string(),
            to: config.require(Phase::Copy, index, "to")?.to_string(),
        })
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "copy".to_string(),
            "-threads".to_string(),
            self.threads.clone(),
            "-from".to_string(),
            self.from.clone(),
            "-to".to_string(),
            self.to.clone(),
        ]
    }

    fn label(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

struct CopySink<'a> {
    log: &'a mut RunLog,
    stats: CopyStats,
}

impl LineSink for CopySink<'_> {
    fn consume(&mut self, line: &str) {
        let classified = classify_copy(line);
        self.log.line(line);
        if classified.is_highlighted() {
            self.log.info(&format!("  {line}"));
        }
        self.stats.record(&classified);
    }
}

/// Copy all `copies` on their own, outside of a backup.
pub fn run(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    copies: &[TargetConfig],
    table: &mut Vec<CopyResult>,
) -> Result<(), PhaseError> {
    let copies = parse_targets(copies, CopyTarget::from_config)?;
    execute(ctx, log, &copies, table)
}

pub(crate) fn execute(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    targets: &[CopyTarget],
    table: &mut Vec<CopyResult>,
) -> Result<(), PhaseError> {
    for target in targets {
        let args = target.args();
        let message = format!(
            "Copying from storage {} to storage {} with {} threads",
            target.from, target.to, target.threads
        );
        ctx.announce(log, &message, &args);

        let started = Instant::now();
        let mut sink = CopySink {
            log: &mut *log,
            stats: CopyStats::default(),
        };
        let res = ctx.execute(&args, &mut sink);
        let stats = sink.stats;
        if let Err(e) = res {
            return Err(ctx.failed(log, Phase::Copy, &target.label(), e));
        }

        let duration = started.elapsed();
        log.info(&format!("  Duration: {}", format_duration(duration)));
        table.push(CopyResult::new(
            target.from.clone(),
            target.to.clone(),
            stats,
            duration,
        ));
    }
    Ok(())
}
