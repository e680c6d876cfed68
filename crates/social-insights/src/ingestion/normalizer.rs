//! Reshapes raw source rows into [`NormalizedRecord`]s
//!
//! Policies:
//! - unknown post type labels become `static`
//! - unparseable timestamps become the wall-clock time at processing, which
//!   loses the posted time; a warning is logged for every such row
//! - rows without a valid UUID get a fresh one, so re-running a batch
//!   produces duplicate posts under new ids
//! - the first numeric coercion failure aborts the whole batch

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{columns, NormalizedRecord, PostType, RawCell, SourceRecord};

/// Default maximum number of rows loaded per run
pub const DEFAULT_LIMIT: usize = 200;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Normalizes rows into records
#[derive(Debug, Clone)]
pub struct Normalizer {
    limit: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl Normalizer {
    /// Create a normalizer producing at most `limit` records
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Normalize the first `limit` rows, in source order.
    ///
    /// Returns exactly `min(limit, rows.len())` records or the first error.
    pub fn normalize_batch(&self, rows: &[SourceRecord]) -> Result<Vec<NormalizedRecord>> {
        rows.iter()
            .take(self.limit)
            .map(normalize_record)
            .collect()
    }
}

/// Normalize one row
pub fn normalize_record(row: &SourceRecord) -> Result<NormalizedRecord> {
    let timestamp = parse_timestamp(&row.timestamp).unwrap_or_else(|| {
        tracing::warn!(
            "Row {}: unparseable timestamp '{}', using current time",
            row.row,
            row.timestamp
        );
        Utc::now()
    });

    Ok(NormalizedRecord {
        post_id: resolve_post_id(row.post_id.as_deref()),
        post_type: PostType::from_label(&row.post_type),
        timestamp,
        likes: coerce_count(row.row, columns::LIKES, &row.likes)?,
        comments: coerce_count(row.row, columns::COMMENTS, &row.comments)?,
        shares: coerce_count(row.row, columns::SHARES, &row.shares)?,
        reach: coerce_count(row.row, columns::REACH, &row.reach)?,
        engagement_rate: coerce_rate(row.row, columns::ENGAGEMENT_RATE, &row.engagement_rate)?,
    })
}

/// Reuse a syntactically valid UUID, otherwise generate one
pub fn resolve_post_id(raw: Option<&str>) -> Uuid {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Best-effort timestamp parse. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Coerce a counter cell to a non-negative integer. Floats truncate toward zero.
pub fn coerce_count(row: usize, column: &str, cell: &RawCell) -> Result<i32> {
    let fail = || Error::coercion(row, column, cell.display());

    let value = match cell {
        RawCell::Empty => return Err(fail()),
        RawCell::Number(n) => *n,
        RawCell::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i as f64,
                Err(_) => s.parse::<f64>().map_err(|_| fail())?,
            }
        }
    };

    if !value.is_finite() {
        return Err(fail());
    }
    let truncated = value.trunc();
    if truncated < 0.0 || truncated > i32::MAX as f64 {
        return Err(fail());
    }
    Ok(truncated as i32)
}

/// Coerce a ratio cell to a float
pub fn coerce_rate(row: usize, column: &str, cell: &RawCell) -> Result<f64> {
    let fail = || Error::coercion(row, column, cell.display());

    let value = match cell {
        RawCell::Empty => return Err(fail()),
        RawCell::Number(n) => *n,
        RawCell::Text(s) => s.trim().parse::<f64>().map_err(|_| fail())?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(fail())
    }
}
