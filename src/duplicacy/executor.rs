//! Execution of duplicacy commands with line-wise output streaming.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use derive_more::{Display, Error};

/// Receiver of subprocess output, one line at a time.
pub trait LineSink {
    /// Consume a single line of output without its line terminator.
    fn consume(&mut self, line: &str);
}

impl<F: FnMut(&str)> LineSink for F {
    fn consume(&mut self, line: &str) {
        self(line)
    }
}

/// A single command invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub working_dir: &'a Path,
}

impl Invocation<'_> {
    /// Shell-like rendering of the command line for logging.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Errors on executing a command.
#[derive(Debug, Display, Error)]
pub enum ExecError {
    /// The process couldn't be started.
    #[display("Unable to start {}: {source}", program.display())]
    Spawn { program: PathBuf, source: io::Error },
    /// Reading the output of the process failed.
    #[display("Reading output of {} failed: {source}", program.display())]
    Output { program: PathBuf, source: io::Error },
    /// The process exited unsuccessfully.
    #[display("{} exited with {}", program.display(), describe_exit(code))]
    Failed { program: PathBuf, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Runs commands and streams their output into a [LineSink].
pub trait Executor {
    /// Run `invocation` to completion, handing every output line to `sink`.
    ///
    /// Succeeds only if the process exits with status 0.
    fn execute(&self, invocation: &Invocation<'_>, sink: &mut dyn LineSink)
        -> Result<(), ExecError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        sink: &mut dyn LineSink,
    ) -> Result<(), ExecError> {
        (**self).execute(invocation, sink)
    }
}

/// [Executor] spawning real processes.
///
/// Stdout is streamed as it arrives. Stderr is drained concurrently and
/// handed to the sink after stdout is closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        sink: &mut dyn LineSink,
    ) -> Result<(), ExecError> {
        let program = invocation.program.to_path_buf();
        log::trace!(target: "duplicacy::executor", "Running: {}", invocation.command_line());

        let mut child = Command::new(invocation.program)
            .args(invocation.args)
            .current_dir(invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stderr = child.stderr.take().map(|stderr| {
            thread::spawn(move || -> io::Result<Vec<String>> {
                let mut lines = Vec::new();
                for_each_line(stderr, |line| lines.push(line.to_string()))?;
                Ok(lines)
            })
        });

        let streamed = match child.stdout.take() {
            Some(stdout) => for_each_line(stdout, |line| sink.consume(line)),
            None => Ok(()),
        };

        // always reap the child, even if reading its output failed
        let status = child.wait();

        streamed.map_err(|source| ExecError::Output {
            program: program.clone(),
            source,
        })?;
        if let Some(stderr) = stderr {
            let lines = stderr
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")))
                .map_err(|source| ExecError::Output {
                    program: program.clone(),
                    source,
                })?;
            for line in &lines {
                sink.consume(line);
            }
        }

        let status = status.map_err(|source| ExecError::Output {
            program: program.clone(),
            source,
        })?;
        log::trace!(target: "duplicacy::executor", "{} exited with {status}", program.display());

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                program,
                code: status.code(),
            })
        }
    }
}

/// Split `reader` into lines, decoding lossily and stripping line terminators.
fn for_each_line(reader: impl Read, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        f(&String::from_utf8_lossy(&buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_split_and_terminators_stripped() {
        let input: &[u8] = b"first\r\nsecond\n\nlast without newline";
        let mut lines = Vec::new();
        for_each_line(input, |line| lines.push(line.to_string())).unwrap();

        assert_eq!(lines, ["first", "second", "", "last without newline"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let input: &[u8] = b"caf\xe9\n";
        let mut lines = Vec::new();
        for_each_line(input, |line| lines.push(line.to_string())).unwrap();

        assert_eq!(lines, ["caf\u{FFFD}"]);
    }

    #[test]
    fn command_line_joins_arguments() {
        let args = vec!["check".to_string(), "-storage".to_string(), "b2".to_string()];
        let invocation = Invocation {
            program: Path::new("/usr/bin/duplicacy"),
            args: &args,
            working_dir: Path::new("/"),
        };

        assert_eq!(invocation.command_line(), "/usr/bin/duplicacy check -storage b2");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let args = Vec::new();
        let invocation = Invocation {
            program: Path::new("/nonexistent/duplicacy-binary"),
            args: &args,
            working_dir: Path::new("."),
        };
        let mut sink = |_: &str| {};

        let err = SystemExecutor.execute(&invocation, &mut sink).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn streams_stdout_then_stderr() {
        let args = vec![
            "-c".to_string(),
            "echo one; echo oops >&2; echo two".to_string(),
        ];
        let invocation = Invocation {
            program: Path::new("sh"),
            args: &args,
            working_dir: Path::new("."),
        };
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());

        SystemExecutor.execute(&invocation, &mut sink).unwrap();
        assert_eq!(lines, ["one", "two", "oops"]);
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["-c".to_string(), "pwd".to_string()];
        let invocation = Invocation {
            program: Path::new("sh"),
            args: &args,
            working_dir: dir.path(),
        };
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());

        SystemExecutor.execute(&invocation, &mut sink).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(&lines[0]).canonicalize().unwrap(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_reported_after_output() {
        let args = vec!["-c".to_string(), "echo partial; exit 3".to_string()];
        let invocation = Invocation {
            program: Path::new("sh"),
            args: &args,
            working_dir: Path::new("."),
        };
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());

        let err = SystemExecutor.execute(&invocation, &mut sink).unwrap_err();
        assert!(matches!(err, ExecError::Failed { code: Some(3), .. }));
        assert_eq!(err.to_string(), "sh exited with status 3");
        assert_eq!(lines, ["partial"]);
    }
}
