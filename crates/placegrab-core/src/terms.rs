//! Search-term input parsing.
//!
//! Every file in the input directory whose name ends in `_input.csv` is a
//! term source: semicolon-delimited, UTF-8 with an optional byte-order mark,
//! first row ignored. Rows are zipped *positionally* against the calling
//! adapter's expected column list, not against the file's own header row —
//! the same input file feeds all three providers, each reading the columns
//! under its own names. That structural coupling is deliberate and must be
//! preserved: the zip truncates at the shorter of the row and the expected
//! list.

use std::fs;
use std::path::{Path, PathBuf};

use crate::InputError;

/// Filename suffix identifying a term source file.
pub const INPUT_SUFFIX: &str = "_input.csv";

/// Expected-column prefix marking a position an adapter does not consume.
pub const DROP_PREFIX: &str = "drop_";

/// Template columns written into a freshly created default input file.
pub const TEMPLATE_COLUMNS: [&str; 8] = [
    "term",
    "location",
    "latitude",
    "longitude",
    "radius",
    "limit",
    "foursquare_id",
    "facebook_id",
];

const DEFAULT_INPUT: &str = "_input.csv";
const BOM: char = '\u{feff}';

/// One parsed search request, sourced from one input row.
///
/// Field order follows the adapter's expected column list, which matters for
/// the pipe-joined display string and for request parameters. Fields with
/// empty values are never present: "absent" and "blank" are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Term {
    fields: Vec<(String, String)>,
}

impl Term {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field pairs in input-column order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pipe-joined field values, used to label the search in logs and in
    /// the report's `QUERY` column.
    #[must_use]
    pub fn display(&self) -> String {
        self.fields
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    fn insert(&mut self, key: &str, value: &str) {
        self.fields.push((key.to_owned(), value.to_owned()));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Term {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Loads terms from every `*_input.csv` in `dir`, in filename order.
///
/// Columns whose expected name starts with [`DROP_PREFIX`] and fields whose
/// trimmed value is empty are excluded from the resulting terms. Rows that
/// end up with no fields at all are still yielded as empty terms; adapters
/// skip them through their locator-field check.
///
/// # Errors
///
/// Returns [`InputError::Io`] if the directory or a matching file cannot
/// be read.
pub fn load_terms(dir: &Path, expected_columns: &[&str]) -> Result<Vec<Term>, InputError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| InputError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(INPUT_SUFFIX))
        })
        .collect();
    files.sort();

    let mut terms = Vec::new();
    for path in files {
        let text = fs::read_to_string(&path).map_err(|source| InputError::Io {
            path: path.clone(),
            source,
        })?;
        let text = text.strip_prefix(BOM).unwrap_or(&text);

        // First row is the file's own header; it is never consulted.
        for line in text.lines().skip(1) {
            if line.is_empty() {
                continue;
            }
            let row = split_row(line);
            let mut term = Term::default();
            for (name, value) in expected_columns.iter().zip(row.iter()) {
                if name.starts_with(DROP_PREFIX) || value.trim().is_empty() {
                    continue;
                }
                term.insert(name, value);
            }
            terms.push(term);
        }
    }
    Ok(terms)
}

/// Creates the default `_input.csv` template in `dir` when that exact file
/// is missing. Other `*_input.csv` files do not suppress it; the template
/// contributes no terms of its own, so an extra copy is harmless.
///
/// Returns `true` when the template was created on this call.
///
/// # Errors
///
/// Returns [`InputError::Io`] if the file cannot be written.
pub fn ensure_default_input(dir: &Path) -> Result<bool, InputError> {
    let path = dir.join(DEFAULT_INPUT);
    if path.exists() {
        return Ok(false);
    }
    let content = format!("{BOM}{}\n", TEMPLATE_COLUMNS.join(";"));
    fs::write(&path, content).map_err(|source| InputError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(true)
}

/// Splits one report-dialect row: `;`-delimited, backslash-escaped.
///
/// A backslash takes the following character literally, so `\;` is a field
/// character rather than a delimiter. A trailing lone backslash is dropped.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ';' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
