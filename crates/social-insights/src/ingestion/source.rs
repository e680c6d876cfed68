//! Source readers for post analytics exports (Excel workbooks and CSV)

use calamine::{Data, DataType, Reader};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{columns, RawCell, SourceRecord};

/// Format used to render native spreadsheet date cells as timestamp text
const SPREADSHEET_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Workbook read through calamine (first worksheet)
    Spreadsheet,
    /// Comma-separated values with a header row
    Csv,
}

impl SourceFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Spreadsheet),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect the format from a path
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedSource(path.display().to_string()))
    }
}

/// Read every data row of a source file, in file order
pub fn read_source(path: &Path) -> Result<Vec<SourceRecord>> {
    let records = match SourceFormat::from_path(path)? {
        SourceFormat::Spreadsheet => read_spreadsheet(path)?,
        SourceFormat::Csv => read_csv(path)?,
    };
    tracing::info!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Position of each required column in the header row
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn new(header: &[String]) -> Result<Self> {
        let mut positions = HashMap::new();
        for name in columns::REQUIRED {
            let pos = header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
            positions.insert(name, pos);
        }
        Ok(Self { positions })
    }

    fn cell(&self, cells: &[RawCell], name: &str) -> RawCell {
        self.positions
            .get(name)
            .and_then(|&pos| cells.get(pos))
            .cloned()
            .unwrap_or(RawCell::Empty)
    }

    fn record(&self, row: usize, cells: &[RawCell]) -> SourceRecord {
        let post_id = match self.cell(cells, columns::POST_ID) {
            RawCell::Text(s) => Some(s),
            _ => None,
        };

        SourceRecord {
            row,
            post_id,
            post_type: self.cell(cells, columns::POST_TYPE).display(),
            timestamp: self.cell(cells, columns::POST_TIMESTAMP).display(),
            likes: self.cell(cells, columns::LIKES),
            comments: self.cell(cells, columns::COMMENTS),
            shares: self.cell(cells, columns::SHARES),
            reach: self.cell(cells, columns::REACH),
            engagement_rate: self.cell(cells, columns::ENGAGEMENT_RATE),
        }
    }
}

fn read_spreadsheet(path: &Path) -> Result<Vec<SourceRecord>> {
    let filename = path.display().to_string();
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| Error::source_parse(&filename, e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::source_parse(&filename, "workbook has no worksheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::source_parse(&filename, e.to_string()))?;

    // Rows are reported 1-based, counting from the sheet's first used row
    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| Error::source_parse(&filename, "worksheet is empty"))?
        .iter()
        .map(|cell| spreadsheet_cell(cell).display())
        .collect();
    let index = ColumnIndex::new(&header)?;

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        let cells: Vec<RawCell> = row.iter().map(spreadsheet_cell).collect();
        if cells.iter().all(RawCell::is_empty) {
            continue;
        }
        records.push(index.record(header_row + 1 + offset, &cells));
    }

    Ok(records)
}

fn spreadsheet_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::from_text(s),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| RawCell::Text(dt.format(SPREADSHEET_DATETIME).to_string()))
            .unwrap_or(RawCell::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from_text(s),
        Data::Error(e) => RawCell::Text(e.to_string()),
    }
}

fn read_csv(path: &Path) -> Result<Vec<SourceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let index = ColumnIndex::new(&header)?;

    let mut records = Vec::new();
    for (offset, result) in reader.records().enumerate() {
        let record = result?;
        let cells: Vec<RawCell> = record.iter().map(RawCell::from_text).collect();
        if cells.iter().all(RawCell::is_empty) {
            continue;
        }
        // The reader skips empty lines, so the offset alone undercounts
        let row = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(offset + 2);
        records.push(index.record(row, &cells));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str =
        "Post ID,Post Type,Post Timestamp,Likes,Comments,Shares,Reach,Engagement Rate";

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("XLSX"), Some(SourceFormat::Spreadsheet));
        assert_eq!(SourceFormat::from_extension("csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("json"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_source(Path::new("posts.json")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSource(_)));
    }

    #[test]
    fn test_read_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        fs::write(
            &path,
            format!(
                "{HEADER}\n\
                 ,Video,2024-01-01 10:00,100,5,2,1000,0.1\n\
                 ,,,,,,,\n\
                 6f1c1b6e-3b9a-4a3c-9d0e-2f4f3c1a7b10,Image,bad,7,1,0,50,0.02\n"
            ),
        )
        .unwrap();

        let rows = read_source(&path).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].post_id, None);
        assert_eq!(rows[0].post_type, "Video");
        assert_eq!(rows[0].timestamp, "2024-01-01 10:00");
        assert_eq!(rows[0].likes, RawCell::Text("100".to_string()));

        assert_eq!(rows[1].row, 4);
        assert_eq!(
            rows[1].post_id.as_deref(),
            Some("6f1c1b6e-3b9a-4a3c-9d0e-2f4f3c1a7b10")
        );
    }

    #[test]
    fn test_csv_rows_numbered_by_file_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        fs::write(
            &path,
            format!(
                "{HEADER}\n\
                 ,Video,2024-01-01,1,0,0,10,0.1\n\
                 \n\
                 ,Video,2024-01-01,bad,0,0,10,0.1\n"
            ),
        )
        .unwrap();

        let rows = read_source(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[1].row, 4);

        let err = crate::ingestion::Normalizer::default()
            .normalize_batch(&rows)
            .unwrap_err();
        assert_eq!(err.to_string(), "Row 4: cannot convert Likes value 'bad'");
    }

    #[test]
    fn test_read_spreadsheet_rows() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
        let posted = ExcelDateTime::parse_from_str("2024-01-01 10:00:00").unwrap();
        let sheet = workbook.add_worksheet();
        for (col, name) in HEADER.split(',').enumerate() {
            sheet.write_string(0, col as u16, name).unwrap();
        }
        // Row 2: numeric id, native date cell
        sheet.write_number(1, 0, 12345.0).unwrap();
        sheet.write_string(1, 1, "Video").unwrap();
        sheet.write_datetime_with_format(1, 2, &posted, &date_format).unwrap();
        for (col, value) in [(3, 100.0), (4, 5.0), (5, 2.0), (6, 1000.0), (7, 0.1)] {
            sheet.write_number(1, col, value).unwrap();
        }
        // Row 3 left blank. Row 4: text id and text timestamp
        sheet.write_string(3, 0, "6f1c1b6e-3b9a-4a3c-9d0e-2f4f3c1a7b10").unwrap();
        sheet.write_string(3, 1, "Carousel").unwrap();
        sheet.write_string(3, 2, "2024-02-02 08:30").unwrap();
        for (col, value) in [(3, 7.0), (4, 1.0), (5, 0.0), (6, 50.0), (7, 0.02)] {
            sheet.write_number(3, col, value).unwrap();
        }
        workbook.save(&path).unwrap();

        let rows = read_source(&path).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].post_id, None);
        assert_eq!(rows[0].post_type, "Video");
        assert_eq!(rows[0].timestamp, "2024-01-01 10:00:00");
        assert_eq!(rows[0].likes, RawCell::Number(100.0));
        assert_eq!(rows[0].engagement_rate, RawCell::Number(0.1));

        assert_eq!(rows[1].row, 4);
        assert_eq!(
            rows[1].post_id.as_deref(),
            Some("6f1c1b6e-3b9a-4a3c-9d0e-2f4f3c1a7b10")
        );
        assert_eq!(rows[1].timestamp, "2024-02-02 08:30");
        assert_eq!(rows[1].reach, RawCell::Number(50.0));
    }

    #[test]
    fn test_columns_matched_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        fs::write(
            &path,
            "Likes,Post Type,Reach,Shares,Comments,Post Timestamp,Engagement Rate,Post ID\n\
             10,Carousel,300,1,2,2024-02-02,0.5,\n",
        )
        .unwrap();

        let rows = read_source(&path).unwrap();
        assert_eq!(rows[0].post_type, "Carousel");
        assert_eq!(rows[0].likes, RawCell::Text("10".to_string()));
        assert_eq!(rows[0].reach, RawCell::Text("300".to_string()));
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "Post ID,Post Type,Likes\n,Video,1\n").unwrap();

        let err = read_source(&path).unwrap_err();
        match err {
            Error::MissingColumn(name) => assert_eq!(name, "Post Timestamp"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
