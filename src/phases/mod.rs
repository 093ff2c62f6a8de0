//! Phases of a job run.
//!
//! Each phase runs one duplicacy command per configured target, strictly in
//! configuration order:
//!
//! - [backup]: `duplicacy backup`, followed by the [copy] targets.
//! - [prune]: `duplicacy prune`
//! - [check]: `duplicacy check`
//!
//! All targets of a phase are validated before the first command is started.
//! The first failing command aborts the phase; results of the targets
//! finished until then are kept.

pub mod backup;
pub mod check;
pub mod copy;
pub mod prune;

use derive_more::{Display, Error, From};

use crate::config::{TargetConfig, TargetError};
use crate::duplicacy::{Duplicacy, ExecError, Executor, LineSink};
use crate::runlog::RunLog;

/// Kind of operation performed against a target.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Phase {
    #[display("backup")]
    Backup,
    #[display("copy")]
    Copy,
    #[display("prune")]
    Prune,
    #[display("check")]
    Check,
}

/// Errors aborting a phase.
#[derive(Debug, Display, Error, From)]
pub enum PhaseError {
    /// A target is misconfigured. No command of the phase was started.
    #[display("Invalid configuration: {_0}")]
    #[from]
    Target(TargetError),
    /// Running duplicacy for a target failed.
    #[display("{phase} of {target} failed: {source}")]
    Exec {
        phase: Phase,
        target: String,
        source: ExecError,
    },
}

/// Everything needed to run duplicacy commands.
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    pub duplicacy: &'a Duplicacy,
    pub executor: &'a dyn Executor,
    /// Log the full command line of every invocation.
    pub debug: bool,
}

impl PhaseContext<'_> {
    /// Start a new section in the log for the command `args`.
    fn announce(&self, log: &mut RunLog, message: &str, args: &[String]) {
        log.separator();
        log.info(message);
        if self.debug {
            let invocation = self.duplicacy.invocation(args);
            log.info(&format!("Executing: {}", invocation.command_line()));
        }
    }

    fn execute(&self, args: &[String], sink: &mut dyn LineSink) -> Result<(), ExecError> {
        self.executor.execute(&self.duplicacy.invocation(args), sink)
    }

    /// Log `error` of running `phase` for `target` and turn it into a [PhaseError].
    fn failed(
        &self,
        log: &mut RunLog,
        phase: Phase,
        target: &str,
        error: ExecError,
    ) -> PhaseError {
        log.error(&format!("Error executing command: {error}"));
        PhaseError::Exec {
            phase,
            target: target.to_string(),
            source: error,
        }
    }
}

/// Validate all `configs` of a phase at once.
fn parse_targets<T>(
    configs: &[TargetConfig],
    parse: impl Fn(usize, &TargetConfig) -> Result<T, TargetError>,
) -> Result<Vec<T>, TargetError> {
    configs
        .iter()
        .enumerate()
        .map(|(index, config)| parse(index, config))
        .collect()
}

/// Sink writing every line to the run log without further inspection.
struct PlainSink<'a> {
    log: &'a mut RunLog,
}

impl LineSink for PlainSink<'_> {
    fn consume(&mut self, line: &str) {
        self.log.line(line);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::duplicacy::Invocation;

    /// Scripted reply of the fake executor to one invocation.
    pub(crate) struct Reply {
        pub lines: Vec<&'static str>,
        pub code: i32,
    }

    impl Reply {
        pub fn ok(lines: &[&'static str]) -> Self {
            Self {
                lines: lines.to_vec(),
                code: 0,
            }
        }

        pub fn exit(code: i32) -> Self {
            Self {
                lines: Vec::new(),
                code,
            }
        }
    }

    /// Executor replaying scripted replies and recording all invocations.
    #[derive(Default)]
    pub(crate) struct FakeExecutor {
        replies: RefCell<VecDeque<Reply>>,
        pub calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeExecutor {
        pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().collect()),
                calls: RefCell::default(),
            }
        }
    }

    impl Executor for FakeExecutor {
        fn execute(
            &self,
            invocation: &Invocation<'_>,
            sink: &mut dyn LineSink,
        ) -> Result<(), ExecError> {
            self.calls.borrow_mut().push(invocation.args.to_vec());
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Reply::ok(&[]));
            for line in reply.lines {
                sink.consume(line);
            }
            if reply.code == 0 {
                Ok(())
            } else {
                Err(ExecError::Failed {
                    program: invocation.program.to_path_buf(),
                    code: Some(reply.code),
                })
            }
        }
    }

    pub(crate) fn duplicacy() -> Duplicacy {
        Duplicacy::new("/usr/bin/duplicacy", "/srv/data")
    }

    pub(crate) fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn debug_mode_logs_command_line() {
        let duplicacy = duplicacy();
        let executor = FakeExecutor::default();
        let ctx = PhaseContext {
            duplicacy: &duplicacy,
            executor: &executor,
            debug: true,
        };
        let (mut log, buffer) = crate::runlog::tests::buffered_log();

        ctx.announce(&mut log, "Checking storage b2", &args(&["check", "-storage", "b2"]));

        assert!(buffer
            .contents()
            .contains("Executing: /usr/bin/duplicacy check -storage b2\n"));
    }

    #[test]
    fn failure_is_logged_with_cause() {
        let duplicacy = duplicacy();
        let executor = FakeExecutor::default();
        let ctx = PhaseContext {
            duplicacy: &duplicacy,
            executor: &executor,
            debug: false,
        };
        let (mut log, _) = crate::runlog::tests::buffered_log();

        let err = ctx.failed(
            &mut log,
            Phase::Check,
            "b2",
            ExecError::Failed {
                program: "/usr/bin/duplicacy".into(),
                code: Some(100),
            },
        );

        assert_eq!(
            log.summary(),
            ["Error executing command: /usr/bin/duplicacy exited with status 100"]
        );
        assert_eq!(
            err.to_string(),
            "check of b2 failed: /usr/bin/duplicacy exited with status 100"
        );
    }
}
