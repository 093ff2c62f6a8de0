//! Results of a job run, handed to reporting after the job finished.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serializer;

use crate::duplicacy::output::{BackupStats, ChunkStats, CopyChunkStats, CopyStats, FileStats};
use crate::util::format_duration;

/// Result of backing up to a single storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BackupResult {
    pub storage: String,
    pub files: Option<FileStats>,
    pub chunks: Option<ChunkStats>,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

impl BackupResult {
    pub fn new(storage: impl Into<String>, stats: BackupStats, duration: Duration) -> Self {
        Self {
            storage: storage.into(),
            files: stats.files,
            chunks: stats.chunks,
            duration,
        }
    }
}

/// Result of copying one storage to another.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CopyResult {
    pub from: String,
    pub to: String,
    pub chunks: Option<CopyChunkStats>,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

impl CopyResult {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        stats: CopyStats,
        duration: Duration,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            chunks: stats.chunks,
            duration,
        }
    }
}

/// Everything a job run produced.
///
/// The tables are append-only, in the order the targets were processed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobReport {
    #[serde(serialize_with = "as_rfc3339")]
    pub started: DateTime<Local>,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
    pub backups: Vec<BackupResult>,
    pub copies: Vec<CopyResult>,
    /// Highlighted messages of the run log.
    pub summary: Vec<String>,
}

impl Default for JobReport {
    fn default() -> Self {
        Self {
            started: Local::now(),
            duration: Duration::ZERO,
            backups: Vec::new(),
            copies: Vec::new(),
            summary: Vec::new(),
        }
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn as_rfc3339<S: Serializer>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

fn or_dash(value: Option<&String>) -> &str {
    value.map_or("-", String::as_str)
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Job started {} took {}",
            self.started.format("%Y-%m-%d %H:%M:%S"),
            format_duration(self.duration)
        )?;

        if !self.backups.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                "Storage",
                "Files",
                "Size",
                "New files",
                "New size",
                "Chunks",
                "Size",
                "New chunks",
                "New size",
                "Uploaded",
                "Duration"
            )?;
            for backup in &self.backups {
                let files = backup.files.as_ref();
                let chunks = backup.chunks.as_ref();
                writeln!(
                    f,
                    "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    backup.storage,
                    or_dash(files.map(|s| &s.total_count)),
                    or_dash(files.map(|s| &s.total_size)),
                    or_dash(files.map(|s| &s.new_count)),
                    or_dash(files.map(|s| &s.new_size)),
                    or_dash(chunks.map(|s| &s.total_count)),
                    or_dash(chunks.map(|s| &s.total_size)),
                    or_dash(chunks.map(|s| &s.new_count)),
                    or_dash(chunks.map(|s| &s.new_size)),
                    or_dash(chunks.map(|s| &s.uploaded)),
                    format_duration(backup.duration),
                )?;
            }
        }

        if !self.copies.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<16} {:<16} {:>10} {:>10} {:>10} {:>10}",
                "From", "To", "Chunks", "Copied", "Skipped", "Duration"
            )?;
            for copy in &self.copies {
                let chunks = copy.chunks.as_ref();
                writeln!(
                    f,
                    "{:<16} {:<16} {:>10} {:>10} {:>10} {:>10}",
                    copy.from,
                    copy.to,
                    or_dash(chunks.map(|s| &s.total_count)),
                    or_dash(chunks.map(|s| &s.copied_count)),
                    or_dash(chunks.map(|s| &s.skipped_count)),
                    format_duration(copy.duration),
                )?;
            }
        }

        Ok(())
    }
}
