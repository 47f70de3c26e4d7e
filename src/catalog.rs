//! Event catalog reading and timestamp handling.
//!
//! A catalog is a CSV table with one row per recorded event. Two columns are
//! used: `filename` (the stem of the per-station sample file) and the column
//! whose header starts with `time_abs`, holding the absolute time of the
//! sample file's relative time zero.
//!
//! Fields are split on bare commas. Quoted fields are not supported and are
//! rejected with [`DetectError::Catalog`] rather than split incorrectly.

use chrono::NaiveDateTime;
use std::io::BufRead;
use std::path::Path;

use crate::constants::{TIMESTAMP_FORMAT, TIMESTAMP_PARSE_FORMAT};
use crate::error::{DetectError, Result};

/// One catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub filename: String,
    pub reference_time: NaiveDateTime,
}

/// Parse `%Y-%m-%dT%H:%M:%S` with an optional fractional part.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| DetectError::Catalog(format!("invalid timestamp {:?}: {}", s, e)))
}

/// Format with exactly six fractional digits.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Index of the first header column whose name starts with `prefix`.
pub(crate) fn column_index(header: &[&str], prefix: &str) -> Result<usize> {
    header
        .iter()
        .position(|name| name.trim().starts_with(prefix))
        .ok_or_else(|| DetectError::Catalog(format!("missing column {:?}", prefix)))
}

/// Split one CSV line on commas, refusing quoted fields. Row 0 is the header.
pub(crate) fn split_fields(line: &str, row: usize) -> Result<Vec<&str>> {
    if line.contains('"') {
        return Err(DetectError::Catalog(format!(
            "row {}: quoted CSV fields are not supported",
            row
        )));
    }
    Ok(line.split(',').collect())
}

/// Read every row of a catalog.
pub fn parse_catalog<R: BufRead>(reader: R) -> Result<Vec<CatalogEntry>> {
    let mut lines = reader.lines();
    let header_line = match lines.next() {
        Some(line) => line?,
        None => return Err(DetectError::Catalog("empty catalog".to_string())),
    };
    let header = split_fields(&header_line, 0)?;
    let filename_col = column_index(&header, "filename")?;
    let time_col = column_index(&header, "time_abs")?;

    let mut entries = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line, line_no + 1)?;
        let field = |col: usize| {
            fields.get(col).copied().map(str::trim).ok_or_else(|| {
                DetectError::Catalog(format!("row {} has no column {}", line_no + 1, col))
            })
        };
        entries.push(CatalogEntry {
            filename: field(filename_col)?.to_string(),
            reference_time: parse_timestamp(field(time_col)?)?,
        });
    }

    log::debug!("read {} catalog entries", entries.len());
    Ok(entries)
}

/// Read a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let file = std::fs::File::open(path)?;
    parse_catalog(std::io::BufReader::new(file))
}
