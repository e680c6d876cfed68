//! Post analytics records: raw spreadsheet rows and their normalized form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source column headers, in the order the pipeline reads them
pub mod columns {
    pub const POST_ID: &str = "Post ID";
    pub const POST_TYPE: &str = "Post Type";
    pub const POST_TIMESTAMP: &str = "Post Timestamp";
    pub const LIKES: &str = "Likes";
    pub const COMMENTS: &str = "Comments";
    pub const SHARES: &str = "Shares";
    pub const REACH: &str = "Reach";
    pub const ENGAGEMENT_RATE: &str = "Engagement Rate";

    /// Every column a source file must provide
    pub const REQUIRED: [&str; 8] = [
        POST_ID,
        POST_TYPE,
        POST_TIMESTAMP,
        LIKES,
        COMMENTS,
        SHARES,
        REACH,
        ENGAGEMENT_RATE,
    ];
}

/// A single spreadsheet cell before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Blank cell
    Empty,
    /// Text cell (CSV sources produce only text)
    Text(String),
    /// Numeric cell
    Number(f64),
}

impl RawCell {
    /// Build a cell from CSV text, treating whitespace-only fields as blank
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }

    /// Whether the cell holds nothing
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text content of a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell the way it appeared in the source, for labels and errors
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One spreadsheet row as read from the source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// 1-based row number in the source (header is row 1)
    pub row: usize,
    /// `Post ID`; `None` unless the cell holds text
    pub post_id: Option<String>,
    /// `Post Type` label
    pub post_type: String,
    /// `Post Timestamp`, unparsed
    pub timestamp: String,
    pub likes: RawCell,
    pub comments: RawCell,
    pub shares: RawCell,
    pub reach: RawCell,
    pub engagement_rate: RawCell,
}

/// Post category stored in the table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    /// Short-form video
    Reel,
    /// Single image or link preview
    Static,
    /// Multi-image post
    Carousel,
}

impl PostType {
    /// Look up a source label in the fixed category table.
    ///
    /// Returns `None` for labels outside the table; matching is exact.
    pub fn mapped(label: &str) -> Option<Self> {
        match label {
            "Video" => Some(Self::Reel),
            "Image" => Some(Self::Static),
            "Carousel" => Some(Self::Carousel),
            "Link" => Some(Self::Static),
            _ => None,
        }
    }

    /// Map a source label, falling back to `Static` for unknown labels
    pub fn from_label(label: &str) -> Self {
        Self::mapped(label).unwrap_or(Self::Static)
    }

    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reel => "reel",
            Self::Static => "static",
            Self::Carousel => "carousel",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated post record ready for the archive and the table store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    pub post_id: Uuid,
    pub post_type: PostType,
    pub timestamp: DateTime<Utc>,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub reach: i32,
    pub engagement_rate: f64,
}
