use std::process::ExitCode;

use clap::Parser;
use dup_backup_lib::cli::Cli;
use dup_backup_lib::config::JobConfig;
use dup_backup_lib::duplicacy::SystemExecutor;
use dup_backup_lib::job::Job;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    if let Err(e) = env_logger.try_init() {
        eprintln!("Initializing the logger failed: {e}");
    }

    let mut config = match JobConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(duplicacy) = &cli.duplicacy {
        config.duplicacy = duplicacy.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }

    let mut job = Job::new(config, cli.job_options(), SystemExecutor);
    let res = job.run();
    let report = job.into_report();

    println!("{report}");
    if let Some(path) = &cli.report_json {
        let written = serde_json::to_string_pretty(&report)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(path, json));
        if let Err(e) = written {
            log::warn!("Writing report to {} failed: {e}", path.display());
        }
    }

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: "job", "Job failed: {e}");
            ExitCode::FAILURE
        }
    }
}
