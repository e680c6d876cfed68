//! Core types for post ingestion and chat

pub mod record;
pub mod transcript;

pub use record::{columns, NormalizedRecord, PostType, RawCell, SourceRecord};
pub use transcript::{Role, Transcript, Turn};
