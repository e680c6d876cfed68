//! Provider abstractions for the table store and the chat workflow
//!
//! The table store can be the hosted Astra database or a local SQLite file;
//! the workflow is the hosted Langflow run API.

pub mod astra;
pub mod langflow;
pub mod sqlite;
pub mod table_store;
pub mod workflow;

pub use astra::AstraTableStore;
pub use langflow::LangflowClient;
pub use sqlite::SqliteTableStore;
pub use table_store::{StoreSession, TableStore};
pub use workflow::{extract_answer, WorkflowClient};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result};

/// Open the configured table store backend
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn TableStore>> {
    config.validate()?;
    match config.backend {
        StoreBackend::Astra => {
            let astra = config
                .astra
                .as_ref()
                .ok_or_else(|| Error::config("astra connection is not configured"))?;
            Ok(Box::new(AstraTableStore::new(
                astra,
                &config.keyspace,
                &config.table,
            )?))
        }
        StoreBackend::Sqlite => Ok(Box::new(SqliteTableStore::open(
            &config.sqlite_path,
            config.table.clone(),
        )?)),
    }
}
