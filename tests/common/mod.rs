#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use dup_backup_lib::config::{JobConfig, TargetConfig};
use dup_backup_lib::duplicacy::{ExecError, Executor, Invocation, LineSink};

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Scripted reply to one invocation.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub code: i32,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Executor replaying scripted replies in order. Unscripted invocations succeed silently.
#[derive(Default)]
pub struct ScriptedExecutor {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            calls: RefCell::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Sub-commands of all invocations, e.g. `["backup", "copy"]`.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.args[0].clone())
            .collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        sink: &mut dyn LineSink,
    ) -> Result<(), ExecError> {
        self.calls.borrow_mut().push(Call {
            program: invocation.program.to_path_buf(),
            args: invocation.args.to_vec(),
            working_dir: invocation.working_dir.to_path_buf(),
        });

        let reply = self.replies.borrow_mut().pop_front().unwrap_or_default();
        thread::sleep(reply.delay);
        for line in &reply.lines {
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

pub fn target(entries: &[(&str, &str)]) -> TargetConfig {
    entries.iter().copied().collect()
}

/// Configuration with the repository and logs inside `root`.
pub fn config(root: &Path) -> JobConfig {
    let repository = root.join("repository");
    std::fs::create_dir_all(&repository).unwrap();

    let mut config = JobConfig::new(repository, "/usr/local/bin/duplicacy");
    config.log_dir = Some(root.join("logs"));
    config
}

pub fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
