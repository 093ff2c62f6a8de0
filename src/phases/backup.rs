//! `duplicacy backup` of every configured storage, followed by the copy targets.

use std::time::Instant;

use super::{copy, parse_targets, Phase, PhaseContext, PhaseError};
use crate::config::{TargetConfig, TargetError};
use crate::duplicacy::output::{classify_backup, BackupLine, BackupStats};
use crate::duplicacy::LineSink;
use crate::report::{BackupResult, CopyResult};
use crate::runlog::RunLog;
use crate::util::format_duration;

const PASSWORD_PROMPT_HINT: &str = "  Error: Duplicacy appears to be prompting for a password";

/// Volume Shadow Copy settings of a backup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vss {
    Disabled,
    Enabled { timeout: Option<String> },
}

/// A validated backup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub storage: String,
    pub threads: String,
    pub vss: Vss,
}

impl BackupTarget {
    /// Read the target from its configuration.
    ///
    /// Requires `name` and `threads`. VSS is enabled by `vss = "true"`, an
    /// optional non-empty `vssTimeout` is passed along.
    pub fn from_config(index: usize, config: &TargetConfig) -> Result<Self, TargetError> {
        let storage = config.require(Phase::Backup, index, "name")?.to_string();
        let threads = config.require(Phase::Backup, index, "threads")?.to_string();
        let vss = if config.is_enabled("vss") {
            let timeout = config
                .get("vssTimeout")
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Vss::Enabled { timeout }
        } else {
            Vss::Disabled
        };

        Ok(Self {
            storage,
            threads,
            vss,
        })
    }

    /// Arguments of the duplicacy invocation.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "backup".to_string(),
            "-storage".to_string(),
            self.storage.clone(),
            "-threads".to_string(),
            self.threads.clone(),
            "-stats".to_string(),
        ];
        args.extend(self.vss_flags());
        args
    }

    fn vss_flags(&self) -> Vec<String> {
        match &self.vss {
            Vss::Disabled => Vec::new(),
            Vss::Enabled { timeout: None } => vec!["-vss".to_string()],
            Vss::Enabled {
                timeout: Some(timeout),
            } => vec![
                "-vss".to_string(),
                "-vss-timeout".to_string(),
                timeout.clone(),
            ],
        }
    }

    fn description(&self) -> String {
        let mut flags = String::new();
        for flag in self.vss_flags() {
            flags.push(' ');
            flags.push_str(&flag);
        }
        format!(
            "Backing up to storage {}{flags} with {} threads",
            self.storage, self.threads
        )
    }
}

/// Classifies `duplicacy backup` output and collects its statistics.
struct BackupSink<'a> {
    log: &'a mut RunLog,
    stats: BackupStats,
}

impl<'a> BackupSink<'a> {
    fn new(log: &'a mut RunLog) -> Self {
        Self {
            log,
            stats: BackupStats::default(),
        }
    }

    fn into_stats(self) -> BackupStats {
        self.stats
    }
}

impl LineSink for BackupSink<'_> {
    fn consume(&mut self, line: &str) {
        let classified = classify_backup(line);
        if classified == BackupLine::AuthorizationFailure {
            self.log.warn(PASSWORD_PROMPT_HINT);
        }

        self.log.line(line);
        if classified.is_highlighted() {
            self.log.info(&format!("  {line}"));
        }
        self.stats.record(&classified);
    }
}

/// Back up to all `backups`, then copy all `copies`.
///
/// Both lists are validated before the first backup starts. Results are
/// appended to `backup_table` and `copy_table` as the targets finish.
pub fn run(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    backups: &[TargetConfig],
    copies: &[TargetConfig],
    backup_table: &mut Vec<BackupResult>,
    copy_table: &mut Vec<CopyResult>,
) -> Result<(), PhaseError> {
    let backups = parse_targets(backups, BackupTarget::from_config)?;
    let copies = parse_targets(copies, copy::CopyTarget::from_config)?;

    execute(ctx, log, &backups, backup_table)?;
    if !copies.is_empty() {
        copy::execute(ctx, log, &copies, copy_table)?;
    }
    Ok(())
}

pub(crate) fn execute(
    ctx: &PhaseContext<'_>,
    log: &mut RunLog,
    targets: &[BackupTarget],
    table: &mut Vec<BackupResult>,
) -> Result<(), PhaseError> {
    for target in targets {
        let args = target.args();
        ctx.announce(log, &target.description(), &args);

        let started = Instant::now();
        let mut sink = BackupSink::new(log);
        let res = ctx.execute(&args, &mut sink);
        let stats = sink.into_stats();
        if let Err(e) = res {
            return Err(ctx.failed(log, Phase::Backup, &target.storage, e));
        }

        let duration = started.elapsed();
        log.info(&format!("  Duration: {}", format_duration(duration)));
        table.push(BackupResult::new(target.storage.clone(), stats, duration));
    }
    Ok(())
}
