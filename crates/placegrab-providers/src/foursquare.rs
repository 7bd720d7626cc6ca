//! Foursquare venues adapter.
//!
//! Two-phase collection: venue search yields candidate IDs only, and the
//! full rows come from one venue-details call per ID. All detail work is
//! queued under the originating search string first, then the queue drains
//! in one pass — search and detail phases never interleave per term. A
//! term that carries a `foursquare_id` of its own enqueues directly and
//! skips search.
//!
//! Auth is `client_id`/`client_secret` query params plus the mandatory `v`
//! versioning date.

use std::collections::HashMap;

use chrono::Utc;

use placegrab_core::{record, PlaceRecord, Term, PLACEHOLDER};

use crate::client::{ApiClient, ApiResponse};
use crate::error::ProviderError;
use crate::provider::Provider;

pub const API_ALIAS: &str = "foursquare";

/// Expected input columns, mapped positionally onto input rows. The input
/// template has 8 columns; this list names 7, so the trailing
/// `facebook_id` column is dropped by truncation.
pub const TERMS_COLUMNS: [&str; 7] = [
    "query",
    "near",
    "latitude",
    "longitude",
    "radius",
    "limit",
    "foursquare_id",
];

const LOCATOR_FIELDS: [&str; 5] = ["query", "near", "latitude", "longitude", "foursquare_id"];

const STATS_HEADERS: [&str; 3] = ["X-RateLimit-Limit", "X-RateLimit-Remaining", "Date"];

const DEFAULT_BASE_URL: &str = "https://api.foursquare.com";

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareSearchResponse {
    #[serde(default)]
    pub response: FoursquareSearchBody,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct FoursquareSearchBody {
    #[serde(default)]
    pub venues: Vec<FoursquareSearchHit>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareSearchHit {
    #[serde(default)]
    pub id: Option<String>,
}

/// Envelope of the venue-details endpoint. Both levels are required: a
/// response without a venue is a shape error and aborts the run.
#[derive(Debug, serde::Deserialize)]
pub struct FoursquareDetailResponse {
    pub response: FoursquareDetailBody,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareDetailBody {
    pub venue: FoursquareVenue,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareVenue {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "canonicalUrl")]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub contact: Option<FoursquareContact>,
    #[serde(default)]
    pub location: Option<FoursquareVenueLocation>,
    #[serde(default)]
    pub categories: Vec<FoursquareCategory>,
    #[serde(default)]
    pub stats: Option<FoursquareStats>,
    /// The venue's own website, distinct from `canonical_url`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub price: Option<FoursquarePrice>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "ratingSignals")]
    pub rating_signals: Option<i64>,
    /// Venue creation time as a Unix epoch.
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub likes: Option<FoursquareLikes>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareContact {
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareVenueLocation {
    #[serde(default, rename = "formattedAddress")]
    pub formatted_address: Vec<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareCategory {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareStats {
    #[serde(default, rename = "checkinsCount")]
    pub checkins_count: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquarePrice {
    #[serde(default)]
    pub tier: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FoursquareLikes {
    #[serde(default)]
    pub count: Option<i64>,
}

pub struct FoursquareAdapter {
    client: ApiClient,
    base_url: String,
    client_id: String,
    client_secret: String,
    /// Foursquare's `v` API versioning parameter, today's date.
    version: String,
    terms: Vec<Term>,
    last_response: Option<ApiResponse>,
}

impl FoursquareAdapter {
    /// Builds the adapter from extracted credentials and parsed terms.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingCredentials`] when `keys` is empty.
    pub fn new(
        client: ApiClient,
        keys: &HashMap<String, String>,
        terms: Vec<Term>,
    ) -> Result<Self, ProviderError> {
        if keys.is_empty() {
            return Err(ProviderError::MissingCredentials {
                provider: API_ALIAS,
            });
        }
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            client_id: keys.get("client_id").cloned().unwrap_or_default(),
            client_secret: keys.get("client_secret").cloned().unwrap_or_default(),
            version: Utc::now().format("%Y%m%d").to_string(),
            terms,
            last_response: None,
        })
    }

    /// Points the adapter at a different host. Test seam for wiremock.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn credential_params(&self) -> Vec<(String, String)> {
        vec![
            ("client_id".to_owned(), self.client_id.clone()),
            ("client_secret".to_owned(), self.client_secret.clone()),
            ("v".to_owned(), self.version.clone()),
        ]
    }

    async fn venue_search(&mut self, term: &Term) -> Result<Vec<String>, ProviderError> {
        let mut params = merge_coordinates(term);
        params.extend(self.credential_params());
        let url = format!("{}/v2/venues/search", self.base_url);
        let response = self.client.get_json(&url, &params, &[]).await?;
        let parsed: Result<FoursquareSearchResponse, _> = response.parse("foursquare venue search");
        self.last_response = Some(response);
        Ok(parsed?
            .response
            .venues
            .into_iter()
            .filter_map(|venue| venue.id)
            .collect())
    }

    async fn venue_details(&mut self, venue_id: &str) -> Result<FoursquareVenue, ProviderError> {
        let url = format!("{}/v2/venues/{venue_id}", self.base_url);
        let response = self
            .client
            .get_json(&url, &self.credential_params(), &[])
            .await?;
        let parsed: Result<FoursquareDetailResponse, _> = response.parse("foursquare venue details");
        self.last_response = Some(response);
        Ok(parsed?.response.venue)
    }
}

impl Provider for FoursquareAdapter {
    fn name(&self) -> &'static str {
        API_ALIAS
    }

    fn stats(&self) -> Vec<(String, String)> {
        self.last_response
            .as_ref()
            .map(|r| r.stats(&STATS_HEADERS))
            .unwrap_or_default()
    }

    fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }

    async fn run(&mut self, buffer: &mut Vec<PlaceRecord>) -> Result<(), ProviderError> {
        // Phase 1: collect venue IDs per search string. A search returning
        // zero candidates and a failed-but-empty response look identical
        // here; both simply contribute nothing to the queue.
        let mut detail_queue: Vec<(String, Vec<String>)> = Vec::new();
        let terms = self.terms.clone();
        for term in &terms {
            if !LOCATOR_FIELDS.iter().any(|f| term.get(f).is_some()) {
                continue;
            }
            let query = term.display();
            tracing::info!(provider = API_ALIAS, term = %query, "searching");

            if let Some(id) = term.get("foursquare_id") {
                tracing::debug!(provider = API_ALIAS, venue_id = id, "direct id queued");
                enqueue(&mut detail_queue, &query, vec![id.to_owned()]);
                continue;
            }

            let ids = self.venue_search(term).await?;
            tracing::info!(provider = API_ALIAS, candidates = ids.len(), "venues found");
            enqueue(&mut detail_queue, &query, ids);
        }

        // Phase 2: one details call per queued ID.
        for (query, ids) in detail_queue {
            for id in ids {
                let venue = self.venue_details(&id).await?;
                buffer.push(flatten(&venue, &query));
            }
        }
        Ok(())
    }
}

/// Adds `ids` to the queue entry for `query`, creating it when absent.
/// Duplicate search strings share one entry.
fn enqueue(queue: &mut Vec<(String, Vec<String>)>, query: &str, ids: Vec<String>) {
    if let Some((_, existing)) = queue.iter_mut().find(|(q, _)| q == query) {
        existing.extend(ids);
    } else {
        queue.push((query.to_owned(), ids));
    }
}

/// Search parameters from a term: `latitude` and `longitude` merge into a
/// single `ll` pair; everything else passes through under its own name.
fn merge_coordinates(term: &Term) -> Vec<(String, String)> {
    let latitude = term.get("latitude");
    let longitude = term.get("longitude");
    let mut params: Vec<(String, String)> = term
        .fields()
        .filter(|(k, _)| *k != "latitude" && *k != "longitude")
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    if let (Some(lat), Some(lng)) = (latitude, longitude) {
        params.push(("ll".to_owned(), format!("{lat},{lng}")));
    }
    params
}

fn flatten(venue: &FoursquareVenue, query: &str) -> PlaceRecord {
    let mut row = PlaceRecord::new(API_ALIAS, query);
    row.source_link = venue.canonical_url.clone();
    row.id = venue.id.clone();
    row.name = venue.name.clone();
    row.phone = venue.contact.as_ref().and_then(|c| c.phone.clone());
    if let Some(location) = &venue.location {
        row.address = Some(location.formatted_address.join(", "));
        row.latitude = location.lat.map(|v| v.to_string());
        row.longitude = location.lng.map(|v| v.to_string());
    }
    row.categories = venue
        .categories
        .iter()
        .map(|c| c.name.clone().unwrap_or_else(|| PLACEHOLDER.to_owned()))
        .collect();
    row.checkins = venue
        .stats
        .as_ref()
        .and_then(|s| s.checkins_count)
        .map(|n| n.to_string());
    row.website = venue.url.clone();
    row.price = venue
        .price
        .as_ref()
        .and_then(|p| p.tier)
        .map(|t| t.to_string());
    row.rating = venue.rating.map(|r| r.to_string());
    row.reviews_amount = venue.rating_signals.map(|n| n.to_string());
    row.created_at_date = venue.created_at.and_then(record::date_from_epoch);
    row.likes_amount = venue
        .likes
        .as_ref()
        .and_then(|l| l.count)
        .map(|n| n.to_string());
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_maps_every_populated_field() {
        let venue: FoursquareVenue = serde_json::from_value(json!({
            "id": "v1",
            "name": "Kumpelnest",
            "canonicalUrl": "https://foursquare.test/v1",
            "contact": {"phone": "+4930555"},
            "location": {
                "formattedAddress": ["Lützowstr. 23", "Berlin"],
                "lat": 52.5,
                "lng": 13.36
            },
            "categories": [{"name": "Bar"}, {}],
            "stats": {"checkinsCount": 1500},
            "url": "https://kumpelnest3000.test",
            "price": {"tier": 2},
            "rating": 9.1,
            "ratingSignals": 321,
            "createdAt": 1_234_567_890,
            "likes": {"count": 77}
        }))
        .unwrap();
        let row = flatten(&venue, "bar|Berlin");
        assert_eq!(row.api_source, "foursquare");
        assert_eq!(row.source_link.as_deref(), Some("https://foursquare.test/v1"));
        assert_eq!(row.phone.as_deref(), Some("+4930555"));
        assert_eq!(row.address.as_deref(), Some("Lützowstr. 23, Berlin"));
        assert_eq!(row.categories, vec!["Bar", "-"]);
        assert_eq!(row.checkins.as_deref(), Some("1500"));
        assert_eq!(row.website.as_deref(), Some("https://kumpelnest3000.test"));
        assert_eq!(row.price.as_deref(), Some("2"));
        assert_eq!(row.rating.as_deref(), Some("9.1"));
        assert_eq!(row.reviews_amount.as_deref(), Some("321"));
        assert_eq!(row.created_at_date.as_deref(), Some("13-02-2009"));
        assert_eq!(row.likes_amount.as_deref(), Some("77"));
    }

    #[test]
    fn coordinates_merge_into_ll() {
        let term: Term = [
            ("query", "bar"),
            ("latitude", "52.5"),
            ("longitude", "13.36"),
            ("radius", "800"),
        ]
        .into_iter()
        .collect();
        let params = merge_coordinates(&term);
        assert!(params.contains(&("ll".to_owned(), "52.5,13.36".to_owned())));
        assert!(params.contains(&("radius".to_owned(), "800".to_owned())));
        assert!(!params.iter().any(|(k, _)| k == "latitude" || k == "longitude"));
    }

    #[test]
    fn lone_latitude_does_not_merge() {
        let term: Term = [("query", "bar"), ("latitude", "52.5")].into_iter().collect();
        let params = merge_coordinates(&term);
        assert!(!params.iter().any(|(k, _)| k == "ll"));
        // An unpaired coordinate is dropped rather than sent half-formed.
        assert!(!params.iter().any(|(k, _)| k == "latitude"));
    }

    #[test]
    fn enqueue_merges_duplicate_search_strings() {
        let mut queue = Vec::new();
        enqueue(&mut queue, "a", vec!["1".to_owned()]);
        enqueue(&mut queue, "b", vec!["2".to_owned()]);
        enqueue(&mut queue, "a", vec!["3".to_owned()]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].1, vec!["1", "3"]);
    }
}
