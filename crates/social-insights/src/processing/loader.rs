//! Single-pass ingestion run: read, normalize, archive, insert

use chrono::Local;
use std::path::PathBuf;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::ingestion::{read_source, write_archive, Normalizer};
use crate::providers::{open_store, StoreSession, TableStore};

/// Outcome of a completed ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Data rows found in the source
    pub rows_read: usize,
    /// Records normalized (at most the configured limit)
    pub records: usize,
    /// Records inserted into the table store
    pub inserted: usize,
    /// CSV archive written for this run
    pub archive_path: PathBuf,
}

/// Run one ingestion against the configured store.
///
/// The store is opened once and closed on every exit path. Any error aborts
/// the run; rows inserted before the failure are left in place.
pub async fn run_ingestion(config: &IngestConfig) -> Result<IngestReport> {
    let session = StoreSession::open(open_store(&config.store)?);

    let result = load_batch(session.store(), config).await;
    let closed = session.close();

    match (result, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::warn!("Failed to close table store after error: {}", close_err);
            }
            Err(e)
        }
    }
}

/// Load one batch into an already opened store
pub async fn load_batch(store: &dyn TableStore, config: &IngestConfig) -> Result<IngestReport> {
    let started_at = Local::now();

    if config.setup_schema {
        store.ensure_schema().await?;
    }

    let rows = read_source(&config.source_path)?;
    let records = Normalizer::new(config.limit).normalize_batch(&rows)?;
    tracing::info!(
        "Normalized {} of {} rows (limit {})",
        records.len(),
        rows.len(),
        config.limit
    );

    let archive_path = write_archive(&config.archive_dir, started_at, &records)?;

    let mut inserted = 0;
    for record in &records {
        store.insert(record).await?;
        inserted += 1;
        tracing::debug!("Inserted post {} ({})", record.post_id, record.post_type);
    }
    tracing::info!("Inserted {} records into {} store", inserted, store.name());

    Ok(IngestReport {
        rows_read: rows.len(),
        records: records.len(),
        inserted,
        archive_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreBackend, StoreConfig, DEFAULT_TABLE};
    use crate::providers::SqliteTableStore;
    use crate::error::Error;
    use crate::types::NormalizedRecord;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use uuid::Uuid;

    /// Records inserts and fails on the configured call
    struct RecordingStore {
        inserted: Mutex<Vec<NormalizedRecord>>,
        fail_on: Option<usize>,
    }

    impl RecordingStore {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl TableStore for RecordingStore {
        async fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        async fn insert(&self, record: &NormalizedRecord) -> Result<()> {
            let mut inserted = self.inserted.lock();
            if self.fail_on == Some(inserted.len()) {
                return Err(Error::store("connection reset"));
            }
            inserted.push(record.clone());
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn write_source(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("posts.csv");
        let mut content =
            "Post ID,Post Type,Post Timestamp,Likes,Comments,Shares,Reach,Engagement Rate\n"
                .to_string();
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn config(dir: &Path, source_path: PathBuf, limit: usize) -> IngestConfig {
        IngestConfig {
            source_path,
            limit,
            archive_dir: dir.join("archive"),
            setup_schema: false,
            store: StoreConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_load_batch_preserves_order_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            dir.path(),
            &[
                ",Video,2024-01-01 10:00,1,0,0,10,0.1",
                ",Image,2024-01-02 10:00,2,0,0,10,0.1",
                ",Carousel,2024-01-03 10:00,3,0,0,10,0.1",
            ],
        );
        let store = RecordingStore::new(None);

        let report = load_batch(&store, &config(dir.path(), source, 2)).await.unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.records, 2);
        assert_eq!(report.inserted, 2);
        let likes: Vec<i32> = store.inserted.lock().iter().map(|r| r.likes).collect();
        assert_eq!(likes, vec![1, 2]);
        assert!(report.archive_path.exists());
    }

    #[tokio::test]
    async fn test_insert_failure_halts_remaining_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            dir.path(),
            &[
                ",Video,2024-01-01,1,0,0,10,0.1",
                ",Video,2024-01-01,2,0,0,10,0.1",
                ",Video,2024-01-01,3,0,0,10,0.1",
            ],
        );
        let store = RecordingStore::new(Some(1));

        let err = load_batch(&store, &config(dir.path(), source, 200)).await.unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_eq!(store.inserted.lock().len(), 1);
        // The archive is written before any insert
        let archived = fs::read_dir(dir.path().join("archive")).unwrap().count();
        assert_eq!(archived, 1);
    }

    #[tokio::test]
    async fn test_coercion_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            dir.path(),
            &[
                ",Video,2024-01-01,1,0,0,10,0.1",
                ",Video,2024-01-01,lots,0,0,10,0.1",
            ],
        );
        let store = RecordingStore::new(None);

        let err = load_batch(&store, &config(dir.path(), source, 200)).await.unwrap_err();

        assert!(matches!(err, Error::Coercion { row: 3, .. }));
        assert!(store.inserted.lock().is_empty());
        assert!(!dir.path().join("archive").exists());
    }

    fn sqlite_config(dir: &Path, source_path: PathBuf) -> IngestConfig {
        let mut config = config(dir, source_path, 200);
        config.setup_schema = true;
        config.store.backend = StoreBackend::Sqlite;
        config.store.sqlite_path = dir.join("posts.db");
        config
    }

    #[tokio::test]
    async fn test_run_ingestion_into_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &[",Video,2024-01-01 10:00,100,5,2,1000,0.1"]);
        let config = sqlite_config(dir.path(), source);

        let report = run_ingestion(&config).await.unwrap();
        assert_eq!(report.inserted, 1);

        let store = SqliteTableStore::open(&config.store.sqlite_path, DEFAULT_TABLE).unwrap();
        assert_eq!(store.row_count().unwrap(), 1);

        let archive = fs::read_to_string(&report.archive_path).unwrap();
        let mut lines = archive.lines();
        assert_eq!(
            lines.next(),
            Some("post_id,post_type,timestamp,likes,comments,shares,reach,engagement_rate")
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",reel,2024-01-01 10:00:00,100,5,2,1000,0.1"));
        let id = row.split(',').next().unwrap();
        assert_eq!(store.post_ids().unwrap(), vec![Uuid::parse_str(id).unwrap()]);
    }

    #[tokio::test]
    async fn test_rerun_without_post_ids_duplicates_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            dir.path(),
            &[
                ",Video,2024-01-01,1,0,0,10,0.1",
                ",Image,2024-01-02,2,0,0,10,0.1",
            ],
        );
        let config = sqlite_config(dir.path(), source);

        run_ingestion(&config).await.unwrap();
        run_ingestion(&config).await.unwrap();

        let store = SqliteTableStore::open(&config.store.sqlite_path, DEFAULT_TABLE).unwrap();
        assert_eq!(store.row_count().unwrap(), 4);
        let ids: HashSet<Uuid> = store.post_ids().unwrap().into_iter().collect();
        assert_eq!(ids.len(), 4);
        // Each run keeps its own archive
        assert_eq!(fs::read_dir(dir.path().join("archive")).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_rerun_with_post_ids_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let source = write_source(dir.path(), &[format!("{id},Video,2024-01-01,1,0,0,10,0.1").as_str()]);
        let config = sqlite_config(dir.path(), source);

        run_ingestion(&config).await.unwrap();
        run_ingestion(&config).await.unwrap();

        let store = SqliteTableStore::open(&config.store.sqlite_path, DEFAULT_TABLE).unwrap();
        assert_eq!(store.post_ids().unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn test_missing_astra_settings_fail_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), dir.path().join("missing.xlsx"), 200);

        let err = run_ingestion(&config).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(!dir.path().join("archive").exists());
    }
}
