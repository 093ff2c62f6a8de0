use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::LevelFilter;

use crate::job::JobOptions;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("operations").required(true).multiple(true)))]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// Configuration file of the job.
    #[arg(long = "config", short = 'f', default_value = "dup_backup.toml")]
    pub config: PathBuf,

    /// Back up to all configured storages, then run the configured copies.
    #[arg(long, short = 'b', group = "operations")]
    pub backup: bool,

    /// Prune all configured storages.
    #[arg(long, short = 'p', group = "operations")]
    pub prune: bool,

    /// Check all configured storages.
    #[arg(long, short = 'c', group = "operations")]
    pub check: bool,

    /// Log every duplicacy command line.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Path to the duplicacy executable. Overrides the configuration file.
    #[arg(long, env = "DUPLICACY_PATH")]
    pub duplicacy: Option<PathBuf>,

    /// Directory of the run logs. Overrides the configuration file.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Number of rotated run logs to keep.
    #[arg(long, default_value = "5")]
    pub log_keep: usize,

    /// Write the results of the run as JSON to this file.
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

impl Cli {
    /// Name of the run log, derived from the configuration file name.
    pub fn log_name(&self) -> String {
        self.config
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "dup_backup".to_string())
    }

    pub fn job_options(&self) -> JobOptions {
        JobOptions {
            backup: self.backup,
            prune: self.prune,
            check: self.check,
            debug: self.debug,
            log_name: self.log_name(),
            log_keep: self.log_keep,
        }
    }
}
