//! social-insights: post analytics ingestion and a chat client for the analysis workflow
//!
//! The crate backs two programs. `social-insights-ingest` reads a spreadsheet
//! export of post metrics, normalizes the rows, archives them to CSV, and
//! inserts them into a table store. `social-insights-chat` forwards questions
//! to a hosted Langflow workflow and prints its answers.
//!
//! Re-running ingestion on the same export inserts the rows again under new
//! ids whenever the export has no valid `Post ID`; nothing deduplicates them.

pub mod chat;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod processing;
pub mod providers;
pub mod types;

pub use chat::{ChatSession, PendingTurn, TurnOutcome, TurnState};
pub use config::{ChatConfig, IngestConfig, StoreBackend, StoreConfig};
pub use error::{Error, Result};
pub use processing::{run_ingestion, IngestReport};
pub use types::{NormalizedRecord, PostType, SourceRecord, Transcript};
