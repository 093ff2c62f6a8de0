//! Sequencing of a complete job run.
//!
//! A run rotates the logs and then performs the requested phases in the
//! fixed order backup (with copies), prune, check. Phases that aren't
//! requested don't start any command. The first failure ends the run.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use derive_more::{Display, Error, From};

use crate::config::JobConfig;
use crate::duplicacy::{Duplicacy, Executor};
use crate::phases::{self, PhaseContext, PhaseError};
use crate::report::JobReport;
use crate::runlog::RunLog;
use crate::util::format_duration;
use crate::util::rotation::LogRotation;

/// What to do in a job run.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub backup: bool,
    pub prune: bool,
    pub check: bool,
    /// Log the full command line of every invocation.
    pub debug: bool,
    /// Name of the run log, the file is called `<log_name>.log`.
    pub log_name: String,
    /// Number of rotated run logs to keep.
    pub log_keep: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            backup: false,
            prune: false,
            check: false,
            debug: false,
            log_name: "dup_backup".to_string(),
            log_keep: 5,
        }
    }
}

/// Errors ending a job run.
#[derive(Debug, Display, Error, From)]
pub enum JobError {
    /// The log files couldn't be rotated.
    #[display("Rotating log files failed: {_0}")]
    Rotate(io::Error),
    /// The run log couldn't be created.
    #[display("Creating run log {} failed: {source}", path.display())]
    RunLog { path: PathBuf, source: io::Error },
    /// A phase failed.
    #[display("{_0}")]
    #[from]
    Phase(PhaseError),
}

/// A job run against a single duplicacy repository.
pub struct Job<E> {
    config: JobConfig,
    options: JobOptions,
    duplicacy: Duplicacy,
    executor: E,
    report: JobReport,
}

impl<E: Executor> Job<E> {
    pub fn new(config: JobConfig, options: JobOptions, executor: E) -> Self {
        let duplicacy = Duplicacy::new(&config.duplicacy, &config.repository);

        Self {
            config,
            options,
            duplicacy,
            executor,
            report: JobReport::default(),
        }
    }

    /// Run the job.
    ///
    /// The results gathered until a failure stay available in the [report](Self::report).
    pub fn run(&mut self) -> Result<(), JobError> {
        let started = Instant::now();
        self.report = JobReport::default();

        log::info!(target: "job", "Rotating log files");
        let rotation = LogRotation::new(
            self.config.log_dir(),
            self.options.log_name.as_str(),
            self.options.log_keep,
        );
        rotation.rotate().map_err(|e| {
            log::error!(target: "job", "Rotating log files failed: {e}");
            JobError::Rotate(e)
        })?;

        let path = rotation.current();
        let mut log = RunLog::create(&path).map_err(|source| {
            log::error!(target: "job", "Creating run log {} failed: {source}", path.display());
            JobError::RunLog {
                path: path.clone(),
                source,
            }
        })?;

        let res = self.run_phases(&mut log);

        self.report.duration = started.elapsed();
        match &res {
            Ok(()) => {
                log.separator();
                log.info(&format!(
                    "Operations completed in {}",
                    format_duration(self.report.duration)
                ));
            }
            Err(JobError::Phase(PhaseError::Target(e))) => {
                log.error(&format!("Error: {e}"));
            }
            Err(_) => {}
        }
        self.report.summary = log.into_summary();

        res
    }

    fn run_phases(&mut self, log: &mut RunLog) -> Result<(), JobError> {
        log.info(&format!(
            "Beginning backup on {}",
            Local::now().format("%m-%d-%Y %H:%M:%S")
        ));

        let ctx = PhaseContext {
            duplicacy: &self.duplicacy,
            executor: &self.executor,
            debug: self.options.debug,
        };

        if self.options.backup {
            phases::backup::run(
                &ctx,
                log,
                &self.config.backup,
                &self.config.copy,
                &mut self.report.backups,
                &mut self.report.copies,
            )?;
        }
        if self.options.prune {
            phases::prune::run(&ctx, log, &self.config.prune)?;
        }
        if self.options.check {
            phases::check::run(&ctx, log, &self.config.check)?;
        }

        Ok(())
    }

    /// Results of the last run.
    pub fn report(&self) -> &JobReport {
        &self.report
    }

    /// Hand over the results of the last run.
    pub fn into_report(self) -> JobReport {
        self.report
    }
}
