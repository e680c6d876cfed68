//! Post ingestion: source readers, normalization, and the local CSV archive

pub mod archive;
pub mod normalizer;
pub mod source;

pub use archive::{archive_file_name, write_archive};
pub use normalizer::{Normalizer, DEFAULT_LIMIT};
pub use source::{read_source, SourceFormat};
