//! Consolidated CSV report writing.
//!
//! One report per batch run, named from the UTC wall clock at write time.
//! The dialect is fixed: semicolon delimiter, backslash escaping, UTF-8
//! with a byte-order mark so spreadsheet tools pick the encoding up. The
//! corpus of columns is fixed too — records carrying more than three
//! categories simply have the surplus dropped at write time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::record::{PlaceRecord, PLACEHOLDER};
use crate::ReportError;

/// Fixed, ordered report header.
pub const CSV_HEADERS: [&str; 23] = [
    "QUERY",
    "TOTAL_API",
    "TOTAL_EXTRACTED",
    "SOURCE_LINK",
    "API_SOURCE",
    "ID",
    "NAME",
    "IS_CLOSED",
    "CATEGORY_1",
    "CATEGORY_2",
    "CATEGORY_3",
    "RATING",
    "REVIEWS_AMOUNT",
    "LIKES_AMOUNT",
    "CHECKINS",
    "PRICE",
    "LATITUDE",
    "LONGITUDE",
    "ADDRESS",
    "PHONE",
    "WEBSITE",
    "CREATED_AT_DATE",
    "RUN_TIMESTAMP",
];

/// Writes the consolidated report into `dir` and returns its path.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be written. This is the
/// one failure the batch does not absorb.
pub fn write_report(dir: &Path, records: &[PlaceRecord]) -> Result<PathBuf, ReportError> {
    let filename = format!("output_{}.csv", Utc::now().format("%d%m%Y_%H%M%S"));
    let path = dir.join(filename);

    let mut out = String::from('\u{feff}');
    out.push_str(&CSV_HEADERS.join(";"));
    out.push('\n');
    for record in records {
        let row: Vec<String> = CSV_HEADERS
            .iter()
            .map(|header| escape_field(&cell(record, header)))
            .collect();
        out.push_str(&row.join(";"));
        out.push('\n');
    }

    fs::write(&path, out).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Resolves one header to its rendered cell value.
///
/// Absent fields and fields that are blank after trimming both render as
/// the placeholder dash.
fn cell(record: &PlaceRecord, header: &str) -> String {
    let value: Option<&str> = match header {
        "QUERY" => Some(record.query.as_str()),
        "API_SOURCE" => Some(record.api_source.as_str()),
        "TOTAL_API" => record.total_api.as_deref(),
        "TOTAL_EXTRACTED" => record.total_extracted.as_deref(),
        "SOURCE_LINK" => record.source_link.as_deref(),
        "ID" => record.id.as_deref(),
        "NAME" => record.name.as_deref(),
        "IS_CLOSED" => record.is_closed.as_deref(),
        "CATEGORY_1" => record.category(0),
        "CATEGORY_2" => record.category(1),
        "CATEGORY_3" => record.category(2),
        "RATING" => record.rating.as_deref(),
        "REVIEWS_AMOUNT" => record.reviews_amount.as_deref(),
        "LIKES_AMOUNT" => record.likes_amount.as_deref(),
        "CHECKINS" => record.checkins.as_deref(),
        "PRICE" => record.price.as_deref(),
        "LATITUDE" => record.latitude.as_deref(),
        "LONGITUDE" => record.longitude.as_deref(),
        "ADDRESS" => record.address.as_deref(),
        "PHONE" => record.phone.as_deref(),
        "WEBSITE" => record.website.as_deref(),
        "CREATED_AT_DATE" => record.created_at_date.as_deref(),
        "RUN_TIMESTAMP" => Some(record.run_timestamp.as_str()),
        _ => None,
    };
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => PLACEHOLDER.to_owned(),
    }
}

/// Escapes the report dialect's special characters with a backslash.
///
/// Newlines inside a field would break the row structure, so they are
/// folded into escaped spaces.
fn escape_field(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            '\n' | '\r' => escaped.push_str("\\ "),
            _ => escaped.push(c),
        }
    }
    escaped
}
