//! The flattened report row shared by all provider adapters.

use chrono::Utc;

/// Rendered in the report wherever a field is absent or blank.
pub const PLACEHOLDER: &str = "-";

/// One extracted entity, flattened into the report's fixed column schema.
///
/// Every named field maps to exactly one report column. Category lists are
/// the one multi-valued source field, so they sit in an overflow list and
/// the writer takes however many numbered `CATEGORY_n` columns the header
/// allows. Records are append-only: built once per entity at flattening
/// time, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct PlaceRecord {
    pub query: String,
    pub api_source: String,
    pub total_api: Option<String>,
    pub total_extracted: Option<String>,
    pub source_link: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub is_closed: Option<String>,
    pub categories: Vec<String>,
    pub rating: Option<String>,
    pub reviews_amount: Option<String>,
    pub likes_amount: Option<String>,
    pub checkins: Option<String>,
    pub price: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at_date: Option<String>,
    pub run_timestamp: String,
}

impl PlaceRecord {
    /// Starts a record for one extracted entity.
    ///
    /// The run timestamp is stamped from the wall clock *here*, at
    /// flattening time, so records from one batch may differ to the second.
    #[must_use]
    pub fn new(api_source: &str, query: &str) -> Self {
        Self {
            query: query.to_owned(),
            api_source: api_source.to_owned(),
            run_timestamp: Utc::now().format("%d.%m.%Y/%H:%M:%S").to_string(),
            ..Self::default()
        }
    }

    /// The zero-based numbered category, if the source had that many.
    #[must_use]
    pub fn category(&self, index: usize) -> Option<&str> {
        self.categories.get(index).map(String::as_str)
    }
}

/// Converts a repeated-currency-symbol price indicator (`"$$$"`) into its
/// count. Indicators without a `$` (including tier numbers already) yield
/// `None` and render as the placeholder.
#[must_use]
pub fn price_from_symbols(raw: &str) -> Option<String> {
    if raw.contains('$') {
        Some(raw.matches('$').count().to_string())
    } else {
        None
    }
}

/// Converts a numeric epoch creation timestamp to the report's date format.
#[must_use]
pub fn date_from_epoch(epoch: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(epoch, 0).map(|dt| dt.format("%d-%m-%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_stamps_run_timestamp() {
        let record = PlaceRecord::new("yelp", "pizza|Berlin");
        assert_eq!(record.api_source, "yelp");
        assert_eq!(record.query, "pizza|Berlin");
        // %d.%m.%Y/%H:%M:%S
        assert_eq!(record.run_timestamp.len(), 19);
        assert_eq!(&record.run_timestamp[10..11], "/");
    }

    #[test]
    fn price_symbols_count() {
        assert_eq!(price_from_symbols("$$$"), Some("3".to_owned()));
        assert_eq!(price_from_symbols("$"), Some("1".to_owned()));
        assert_eq!(price_from_symbols("cheap"), None);
        assert_eq!(price_from_symbols(""), None);
    }

    #[test]
    fn epoch_converts_to_fixed_date_format() {
        // 2009-02-13 23:31:30 UTC
        assert_eq!(date_from_epoch(1_234_567_890), Some("13-02-2009".to_owned()));
    }
}
