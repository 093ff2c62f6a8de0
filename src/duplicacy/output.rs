//! Classification of duplicacy output lines and the statistics extracted from them.
//!
//! All extracted values are kept as the raw tokens duplicacy printed
//! (e.g. `1,666G`), they are never reinterpreted as numbers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const FILES_PREFIX: &str = "Files:";
const CHUNKS_PREFIX: &str = "All chunks:";
const AUTHORIZATION_FAILURE_SUFFIX: &str = "Authorization failure";
const COPY_COMPLETE_PREFIX: &str = "Copy complete, ";

// Files: 161318 total, 1666G bytes; 373 new, 15,951M bytes
static FILES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*: (\S+) total, (\S+) bytes; (\S+) new, (\S+) bytes")
        .expect("files statistics regex should be valid")
});

// All chunks: 348444 total, 1668G bytes; 2415 new, 12,391M bytes, 12,255M bytes uploaded
static CHUNKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*: (\S+) total, (\S+) bytes; (\S+) new, (\S+) bytes, (\S+) bytes uploaded")
        .expect("chunk statistics regex should be valid")
});

// Copy complete, 107 total chunks, 0 chunks copied, 107 skipped
static COPY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Copy complete, (\S+) total chunks, (\S+) chunks copied, (\S+) skipped")
        .expect("copy statistics regex should be valid")
});

/// File totals reported by `duplicacy backup -stats`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileStats {
    pub total_count: String,
    pub total_size: String,
    pub new_count: String,
    pub new_size: String,
}

/// Chunk totals reported by `duplicacy backup -stats`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChunkStats {
    pub total_count: String,
    pub total_size: String,
    pub new_count: String,
    pub new_size: String,
    pub uploaded: String,
}

/// Chunk totals reported by `duplicacy copy`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CopyChunkStats {
    pub total_count: String,
    pub copied_count: String,
    pub skipped_count: String,
}

/// Kind of a line printed by `duplicacy backup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupLine {
    /// `Files:` summary. [None] if the line is malformed.
    Files(Option<FileStats>),
    /// `All chunks:` summary. [None] if the line is malformed.
    Chunks(Option<ChunkStats>),
    /// Duplicacy failed to authorize, most likely it is prompting for a password.
    AuthorizationFailure,
    /// Anything else.
    Other,
}

/// Kind of a line printed by `duplicacy copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyLine {
    /// `Copy complete,` summary. [None] if the line is malformed.
    Complete(Option<CopyChunkStats>),
    /// Anything else.
    Other,
}

impl BackupLine {
    /// Whether the line is worth highlighting in the summary.
    pub fn is_highlighted(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl CopyLine {
    /// Whether the line is worth highlighting in the summary.
    pub fn is_highlighted(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Classify a line of `duplicacy backup` output.
pub fn classify_backup(line: &str) -> BackupLine {
    if line.starts_with(FILES_PREFIX) {
        BackupLine::Files(capture::<4>(&FILES_RE, line).map(|[total_count, total_size, new_count, new_size]| {
            FileStats {
                total_count,
                total_size,
                new_count,
                new_size,
            }
        }))
    } else if line.starts_with(CHUNKS_PREFIX) {
        BackupLine::Chunks(capture::<5>(&CHUNKS_RE, line).map(
            |[total_count, total_size, new_count, new_size, uploaded]| ChunkStats {
                total_count,
                total_size,
                new_count,
                new_size,
                uploaded,
            },
        ))
    } else if line.ends_with(AUTHORIZATION_FAILURE_SUFFIX) {
        BackupLine::AuthorizationFailure
    } else {
        BackupLine::Other
    }
}

/// Classify a line of `duplicacy copy` output.
pub fn classify_copy(line: &str) -> CopyLine {
    if line.starts_with(COPY_COMPLETE_PREFIX) {
        CopyLine::Complete(capture::<3>(&COPY_RE, line).map(
            |[total_count, copied_count, skipped_count]| CopyChunkStats {
                total_count,
                copied_count,
                skipped_count,
            },
        ))
    } else {
        CopyLine::Other
    }
}

/// Extract exactly `N` capture groups, or nothing at all.
fn capture<const N: usize>(re: &Regex, line: &str) -> Option<[String; N]> {
    let captures = re.captures(line)?;
    group_values(&captures)
}

fn group_values<const N: usize>(captures: &Captures<'_>) -> Option<[String; N]> {
    if captures.len() != N + 1 {
        return None;
    }
    let values = (1..=N)
        .map(|i| captures.get(i).map(|m| m.as_str().to_string()))
        .collect::<Option<Vec<_>>>()?;
    values.try_into().ok()
}

/// Statistics gathered from the output of a single `duplicacy backup` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupStats {
    pub files: Option<FileStats>,
    pub chunks: Option<ChunkStats>,
}

impl BackupStats {
    /// Record the statistics carried by `line`. Malformed lines leave the stats untouched.
    pub fn record(&mut self, line: &BackupLine) {
        match line {
            BackupLine::Files(Some(files)) => self.files = Some(files.clone()),
            BackupLine::Chunks(Some(chunks)) => self.chunks = Some(chunks.clone()),
            _ => {}
        }
    }
}

/// Statistics gathered from the output of a single `duplicacy copy` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub chunks: Option<CopyChunkStats>,
}

impl CopyStats {
    /// Record the statistics carried by `line`. Malformed lines leave the stats untouched.
    pub fn record(&mut self, line: &CopyLine) {
        if let CopyLine::Complete(Some(chunks)) = line {
            self.chunks = Some(chunks.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_line_keeps_raw_tokens() {
        let line = "Files: 161318 total, 1,666G bytes; 373 new, 15,951M bytes";

        assert_eq!(
            classify_backup(line),
            BackupLine::Files(Some(FileStats {
                total_count: "161318".into(),
                total_size: "1,666G".into(),
                new_count: "373".into(),
                new_size: "15,951M".into(),
            }))
        );
    }

    #[test]
    fn all_chunks_line_extracts_five_fields() {
        let line = "All chunks: 348444 total, 1668G bytes; 2415 new, 12,391M bytes, 12,255M bytes uploaded";

        assert_eq!(
            classify_backup(line),
            BackupLine::Chunks(Some(ChunkStats {
                total_count: "348444".into(),
                total_size: "1668G".into(),
                new_count: "2415".into(),
                new_size: "12,391M".into(),
                uploaded: "12,255M".into(),
            }))
        );
    }

    #[test]
    fn malformed_lines_are_classified_without_stats() {
        assert_eq!(
            classify_backup("Files: 161318 total, 1666G bytes"),
            BackupLine::Files(None)
        );
        // four groups only, the uploaded amount is missing
        assert_eq!(
            classify_backup("All chunks: 348444 total, 1668G bytes; 2415 new, 12,391M bytes"),
            BackupLine::Chunks(None)
        );
        assert_eq!(classify_copy("Copy complete, nothing to do"), CopyLine::Complete(None));
    }

    #[test]
    fn prefixes_take_priority_over_suffix() {
        assert_eq!(
            classify_backup("Files: Authorization failure"),
            BackupLine::Files(None)
        );
        assert_eq!(
            classify_backup("Failed to download the file: Authorization failure"),
            BackupLine::AuthorizationFailure
        );
    }

    #[test]
    fn prefixes_must_start_the_line() {
        assert_eq!(
            classify_backup("  Files: 1 total, 2 bytes; 3 new, 4 bytes"),
            BackupLine::Other
        );
        assert_eq!(
            classify_backup("Processing backup file: \"taltos.log\""),
            BackupLine::Other
        );
        assert!(!classify_backup("Uploaded chunk 7").is_highlighted());
    }

    #[test]
    fn copy_complete_line() {
        let line = "Copy complete, 107 total chunks, 0 chunks copied, 107 skipped";

        let classified = classify_copy(line);
        assert!(classified.is_highlighted());
        assert_eq!(
            classified,
            CopyLine::Complete(Some(CopyChunkStats {
                total_count: "107".into(),
                copied_count: "0".into(),
                skipped_count: "107".into(),
            }))
        );
        assert_eq!(classify_copy("Chunk 1 copied"), CopyLine::Other);
    }

    #[test]
    fn malformed_line_does_not_clear_recorded_stats() {
        let mut stats = BackupStats::default();
        stats.record(&classify_backup("Files: 1 total, 2K bytes; 3 new, 4K bytes"));
        stats.record(&classify_backup("Files: garbage"));

        assert_eq!(stats.files.as_ref().map(|f| f.total_count.as_str()), Some("1"));
        assert_eq!(stats.chunks, None);
    }

    #[test]
    fn classification_is_idempotent() {
        let lines = [
            "Storage set to b2://bucket",
            "Files: 10 total, 1K bytes; 2 new, 200 bytes",
            "All chunks: 5 total, 1K bytes; 1 new, 100 bytes, 90 bytes uploaded",
            "Backup for /srv at revision 7 completed",
        ];

        let run = || {
            let mut stats = BackupStats::default();
            for line in lines {
                stats.record(&classify_backup(line));
            }
            stats
        };

        let first = run();
        let second = run();
        assert!(first.files.is_some());
        assert!(first.chunks.is_some());
        assert_eq!(first, second);
    }
}
