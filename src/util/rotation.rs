//! Rotation of run logs.
//!
//! The current log `<name>.log` is compressed into `<name>.log.1.gz`, older
//! generations move up by one and generations beyond the configured number
//! are dropped.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Rotation of the run logs named `name` inside `dir`.
#[derive(Debug, Clone)]
pub struct LogRotation {
    dir: PathBuf,
    name: String,
    /// Number of compressed generations to keep.
    keep: usize,
}

impl LogRotation {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>, keep: usize) -> Self {
        let dir = dir.into();
        if dir.is_relative() {
            log::warn!(target: "util::rotation", "log directory is relative: {}", dir.display());
        }

        Self {
            dir,
            name: name.into(),
            keep,
        }
    }

    /// Path of the current (uncompressed) log.
    pub fn current(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }

    /// Path of the `n`-th compressed generation, starting at 1.
    pub fn generation(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{n}.gz", self.name))
    }

    /// Rotate the current log out of the way, creating the log directory if needed.
    pub fn rotate(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let current = self.current();
        if !current.exists() {
            log::debug!(target: "util::rotation", "No log to rotate at {}", current.display());
            return Ok(());
        }

        if self.keep == 0 {
            log::debug!(target: "util::rotation", "Removing {}", current.display());
            return fs::remove_file(&current);
        }

        remove_if_exists(&self.generation(self.keep))?;
        for n in (1..self.keep).rev() {
            let generation = self.generation(n);
            if generation.exists() {
                fs::rename(&generation, self.generation(n + 1))?;
            }
        }

        let first = self.generation(1);
        log::debug!(
            target: "util::rotation",
            "Compressing {} to {}",
            current.display(),
            first.display()
        );
        compress(&current, &first)?;
        fs::remove_file(&current)
    }
}

fn compress(source: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);
    let mut encoder = GzEncoder::new(File::create(dest)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        res => res,
    }
}
