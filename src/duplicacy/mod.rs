//! Interaction with the external [duplicacy] command line tool.
//!
//! [duplicacy]: https://github.com/gilbertchen/duplicacy

mod executor;
pub mod output;

use std::path::PathBuf;

pub use executor::{ExecError, Executor, Invocation, LineSink, SystemExecutor};

/// A duplicacy executable bound to a repository.
#[derive(Debug, Clone)]
pub struct Duplicacy {
    /// Path to the duplicacy executable.
    program: PathBuf,
    /// Repository directory duplicacy is run in.
    repository: PathBuf,
}

impl Duplicacy {
    pub fn new(program: impl Into<PathBuf>, repository: impl Into<PathBuf>) -> Self {
        let repository = repository.into();
        if repository.is_relative() {
            log::warn!(target: "duplicacy", "repository is relative: {}", repository.display());
        }

        Self {
            program: program.into(),
            repository,
        }
    }

    /// Invocation of duplicacy with `args` inside the repository.
    pub fn invocation<'a>(&'a self, args: &'a [String]) -> Invocation<'a> {
        Invocation {
            program: &self.program,
            args,
            working_dir: &self.repository,
        }
    }
}
