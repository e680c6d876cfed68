//! Table store provider trait and the scoped session that owns it

use async_trait::async_trait;

use crate::error::Result;
use crate::types::NormalizedRecord;

/// Trait for the store receiving normalized posts
///
/// Implementations:
/// - `AstraTableStore`: hosted Astra DB via the Data API
/// - `SqliteTableStore`: local SQLite file
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the post table if it does not exist. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert one record. Rows with an existing `post_id` are overwritten.
    async fn insert(&self, record: &NormalizedRecord) -> Result<()>;

    /// Release the underlying connection. Further calls fail.
    fn close(&self) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Owns the run's single store connection and releases it exactly once.
///
/// Call [`StoreSession::close`] on every exit path; if a session is dropped
/// without it (early return, panic unwind) the connection is closed on drop.
pub struct StoreSession {
    store: Box<dyn TableStore>,
    closed: bool,
}

impl StoreSession {
    /// Take ownership of an opened store
    pub fn open(store: Box<dyn TableStore>) -> Self {
        tracing::info!("Opened {} table store session", store.name());
        Self {
            store,
            closed: false,
        }
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }

    /// Close the connection
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let result = self.store.close();
        tracing::info!("Closed {} table store session", self.store.name());
        result
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!(
            "{} table store session dropped without close, closing now",
            self.store.name()
        );
        if let Err(e) = self.store.close() {
            tracing::warn!("Failed to close {} table store: {}", self.store.name(), e);
        }
    }
}
