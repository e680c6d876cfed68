//! Local CSV archive of each normalized batch

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::NormalizedRecord;

/// Timestamp layout used inside the archive
const ARCHIVE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Serialize)]
struct ArchiveRow<'a> {
    post_id: String,
    post_type: &'a str,
    timestamp: String,
    likes: i32,
    comments: i32,
    shares: i32,
    reach: i32,
    engagement_rate: f64,
}

impl<'a> From<&'a NormalizedRecord> for ArchiveRow<'a> {
    fn from(record: &'a NormalizedRecord) -> Self {
        Self {
            post_id: record.post_id.to_string(),
            post_type: record.post_type.as_str(),
            timestamp: record.timestamp.format(ARCHIVE_TIMESTAMP).to_string(),
            likes: record.likes,
            comments: record.comments,
            shares: record.shares,
            reach: record.reach,
            engagement_rate: record.engagement_rate,
        }
    }
}

/// Archive file name for a run started at `started_at`
pub fn archive_file_name(started_at: DateTime<Local>) -> String {
    format!("processed_data_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
}

/// Upper bound on `_<n>` suffixes tried when runs share a start second
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Create a fresh archive file, never replacing an earlier run's archive.
///
/// A run starting in the same second as an existing archive gets a `_1`,
/// `_2`, ... suffix.
fn create_archive_file(dir: &Path, started_at: DateTime<Local>) -> Result<(PathBuf, File)> {
    let base = archive_file_name(started_at);
    let stem = base.trim_end_matches(".csv");

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => base.clone(),
            n => format!("{stem}_{n}.csv"),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free archive name for {base} in {}", dir.display()),
    )))
}

/// Write `records` to `<dir>/processed_data_<run timestamp>.csv` and return the path.
///
/// The header row is written even for an empty batch.
pub fn write_archive(
    dir: &Path,
    started_at: DateTime<Local>,
    records: &[NormalizedRecord],
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let (path, file) = create_archive_file(dir, started_at)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record([
        "post_id",
        "post_type",
        "timestamp",
        "likes",
        "comments",
        "shares",
        "reach",
        "engagement_rate",
    ])?;
    for record in records {
        writer.serialize(ArchiveRow::from(record))?;
    }
    writer.flush()?;

    tracing::info!("Processed data saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostType;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record(post_type: PostType) -> NormalizedRecord {
        NormalizedRecord {
            post_id: Uuid::new_v4(),
            post_type,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            likes: 100,
            comments: 5,
            shares: 2,
            reach: 1000,
            engagement_rate: 0.1,
        }
    }

    #[test]
    fn test_archive_file_name() {
        let started = Local.with_ymd_and_hms(2024, 6, 9, 8, 7, 6).unwrap();
        assert_eq!(archive_file_name(started), "processed_data_20240609_080706.csv");
    }

    #[test]
    fn test_write_archive() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(PostType::Reel), record(PostType::Carousel)];

        let path = write_archive(dir.path(), Local::now(), &records).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(
            lines[0],
            "post_id,post_type,timestamp,likes,comments,shares,reach,engagement_rate"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            format!("{},reel,2024-01-01 10:00:00,100,5,2,1000,0.1", records[0].post_id)
        );
        assert!(lines[2].contains(",carousel,"));
    }

    #[test]
    fn test_same_second_runs_keep_both_archives() {
        let dir = tempfile::tempdir().unwrap();
        let started = Local.with_ymd_and_hms(2024, 6, 9, 8, 7, 6).unwrap();

        let first = write_archive(dir.path(), started, &[record(PostType::Reel)]).unwrap();
        let second = write_archive(dir.path(), started, &[]).unwrap();
        let third = write_archive(dir.path(), started, &[]).unwrap();

        assert_eq!(first, dir.path().join("processed_data_20240609_080706.csv"));
        assert_eq!(second, dir.path().join("processed_data_20240609_080706_1.csv"));
        assert_eq!(third, dir.path().join("processed_data_20240609_080706_2.csv"));
        // The first run's rows survive the later runs
        let content = std::fs::read_to_string(&first).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_empty_batch_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(&dir.path().join("nested"), Local::now(), &[]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
