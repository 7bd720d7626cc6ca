//! API credential parsing from the requirements file.
//!
//! Credentials live in commented-out lines of `requirements_dev.txt` (picked
//! first when present) or `requirements.txt`:
//!
//! ```text
//! # yelp_apikey = abc123
//! # foursquare_client_id = xyz
//! ```
//!
//! A line is recognized only when it starts with `#` and contains ` = `.
//! The header left of ` = ` is lowercased; a credential belongs to a provider
//! alias when the alias occurs anywhere in the header, and is stored under
//! the header with the alias and surrounding underscores removed
//! (`yelp_apikey` → `apikey` for alias `yelp`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::InputError;

/// Sentinel value shipped in the template file; never treated as a real key.
pub const KEY_PLACEHOLDER: &str = "set_key_here";

const DEV_FILE: &str = "requirements_dev.txt";
const RELEASE_FILE: &str = "requirements.txt";

/// Parsed credential lines, queried per provider alias.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<(String, String)>,
    source: Option<PathBuf>,
}

impl CredentialStore {
    /// Reads and parses the credential file found in `dir`.
    ///
    /// A missing file is not an error: it yields an empty store, and every
    /// provider then reports itself as not configured.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Io`] if a credential file exists but cannot
    /// be read.
    pub fn load(dir: &Path) -> Result<Self, InputError> {
        let dev = dir.join(DEV_FILE);
        let path = if dev.is_file() {
            dev
        } else {
            dir.join(RELEASE_FILE)
        };
        if !path.is_file() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|source| InputError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            entries: parse_lines(&text),
            source: Some(path),
        })
    }

    /// The file the credentials were parsed from, when one was found.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Extracts the credentials belonging to `alias`.
    ///
    /// Empty and placeholder values are excluded, so an unconfigured
    /// provider always comes back as an empty map — callers treat that as
    /// "skip this provider", never as a fatal error.
    #[must_use]
    pub fn for_provider(&self, alias: &str) -> HashMap<String, String> {
        let mut keys = HashMap::new();
        for (header, value) in &self.entries {
            if !header.contains(alias) || value.is_empty() || value == KEY_PLACEHOLDER {
                continue;
            }
            let key = header.replace(alias, "");
            keys.insert(key.trim_matches('_').to_owned(), value.clone());
        }
        keys
    }
}

/// Extracts `header = value` pairs from comment lines.
///
/// The header is lowercased; the value keeps its case. Lines without a
/// leading `#` or without the ` = ` separator are ignored entirely.
fn parse_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|line| line.starts_with('#') && line.trim().contains(" = "))
        .filter_map(|line| {
            let stripped = line.replace('#', "");
            let (header, value) = stripped.trim().split_once(" = ")?;
            Some((header.to_lowercase(), value.to_owned()))
        })
        .collect()
}
