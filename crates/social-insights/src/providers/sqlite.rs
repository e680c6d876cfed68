//! SQLite table store for offline runs

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::NormalizedRecord;

use super::table_store::TableStore;

/// Post table in a local SQLite database
pub struct SqliteTableStore {
    conn: Mutex<Option<Connection>>,
    table: String,
}

impl SqliteTableStore {
    /// Create or open the database at the given path
    pub fn open<P: AsRef<Path>>(path: P, table: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;
        Self::with_connection(conn, table)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory(table: impl Into<String>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::config(format!("invalid table name '{table}'")));
        }
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            table,
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| Error::store("sqlite connection is closed"))?;
        f(conn)
    }

    /// Number of rows in the post table
    pub fn row_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", self.table),
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    /// All stored post ids
    pub fn post_ids(&self) -> Result<Vec<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT post_id FROM {}", self.table))?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids.iter()
                .map(|id| {
                    Uuid::parse_str(id)
                        .map_err(|e| Error::store(format!("stored post_id '{id}' is not a UUID: {e}")))
                })
                .collect()
        })
    }
}

#[async_trait]
impl TableStore for SqliteTableStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    post_id TEXT PRIMARY KEY,
                    post_type TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    likes INTEGER NOT NULL,
                    shares INTEGER NOT NULL,
                    comments INTEGER NOT NULL,
                    reach INTEGER NOT NULL,
                    engagement_rate REAL NOT NULL
                );
                "#,
                table = self.table
            ))?;
            Ok(())
        })?;
        tracing::info!("Database setup completed");
        Ok(())
    }

    async fn insert(&self, record: &NormalizedRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    r#"
                    INSERT INTO {} (
                        post_id, post_type, timestamp,
                        likes, comments, shares, reach, engagement_rate
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(post_id) DO UPDATE SET
                        post_type = excluded.post_type,
                        timestamp = excluded.timestamp,
                        likes = excluded.likes,
                        comments = excluded.comments,
                        shares = excluded.shares,
                        reach = excluded.reach,
                        engagement_rate = excluded.engagement_rate
                    "#,
                    self.table
                ),
                params![
                    record.post_id.to_string(),
                    record.post_type.as_str(),
                    record.timestamp,
                    record.likes,
                    record.comments,
                    record.shares,
                    record.reach,
                    record.engagement_rate,
                ],
            )?;
            Ok(())
        })
    }

    fn close(&self) -> Result<()> {
        match self.conn.lock().take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| Error::store(format!("failed to close sqlite connection: {e}"))),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
