//! Yelp Fusion business-search adapter.
//!
//! Single search endpoint, bearer-token auth. Yelp caps one page at 50
//! results and the whole result set at 1000, so a term asking for more
//! than 50 paginates by offset until the user limit, the API ceiling, or
//! an empty page is reached.

use std::collections::HashMap;

use placegrab_core::{record, PlaceRecord, Term, PLACEHOLDER};

use crate::client::{ApiClient, ApiResponse};
use crate::error::ProviderError;
use crate::provider::Provider;

pub const API_ALIAS: &str = "yelp";

/// Expected input columns, mapped positionally onto input rows.
pub const TERMS_COLUMNS: [&str; 6] = ["term", "location", "latitude", "longitude", "radius", "limit"];

/// A term searchable on Yelp needs at least one of these.
const LOCATOR_FIELDS: [&str; 3] = ["location", "latitude", "longitude"];

const STATS_HEADERS: [&str; 3] = [
    "RateLimit-DailyLimit",
    "RateLimit-Remaining",
    "RateLimit-ResetTime",
];

const DEFAULT_BASE_URL: &str = "https://api.yelp.com";

/// Hard API ceiling on results per search; do not raise unless Yelp does.
const RESULTS_CEILING: u32 = 1000;
/// Maximum results per page/offset; do not raise unless Yelp does.
const PAGE_LIMIT: u32 = 50;

#[derive(Debug, serde::Deserialize)]
pub struct YelpSearchResponse {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub businesses: Vec<YelpBusiness>,
}

#[derive(Debug, serde::Deserialize)]
pub struct YelpBusiness {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Canonical Yelp page URL.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_closed: Option<bool>,
    #[serde(default)]
    pub categories: Vec<YelpCategory>,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Price indicator as repeated currency symbols, e.g. `"$$"`.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub coordinates: Option<YelpCoordinates>,
    #[serde(default)]
    pub location: Option<YelpLocation>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct YelpCategory {
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct YelpCoordinates {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct YelpLocation {
    /// Pre-formatted address lines, joined with `", "` for the report.
    #[serde(default)]
    pub display_address: Vec<String>,
}

pub struct YelpAdapter {
    client: ApiClient,
    base_url: String,
    auth_header: String,
    terms: Vec<Term>,
    last_response: Option<ApiResponse>,
}

impl YelpAdapter {
    /// Builds the adapter from extracted credentials and parsed terms.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingCredentials`] when `keys` is empty —
    /// the runner logs this as a configuration error and skips the provider.
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
        let api_key = keys.get("apikey").cloned().unwrap_or_default();
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_header: format!("Bearer {api_key}"),
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

    fn search_url(&self) -> String {
        format!("{}/v3/businesses/search", self.base_url)
    }

    async fn search_page(
        &mut self,
        params: Vec<(String, String)>,
    ) -> Result<YelpSearchResponse, ProviderError> {
        let response = self
            .client
            .get_json(
                &self.search_url(),
                &params,
                &[("Authorization", self.auth_header.as_str())],
            )
            .await?;
        let parsed = response.parse("yelp business search");
        self.last_response = Some(response);
        parsed
    }
}

impl Provider for YelpAdapter {
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
        let terms = self.terms.clone();
        for term in &terms {
            if !LOCATOR_FIELDS.iter().any(|f| term.get(f).is_some()) {
                continue;
            }
            let query = term.display();
            tracing::info!(provider = API_ALIAS, term = %query, "searching");

            let user_limit: Option<u32> = term.get("limit").and_then(|raw| match raw.parse() {
                Ok(limit) => Some(limit),
                Err(_) => {
                    tracing::warn!(
                        provider = API_ALIAS,
                        limit = raw,
                        "unparseable limit, passing it through unpaginated"
                    );
                    None
                }
            });
            let mut businesses = Vec::new();
            let mut total = None;

            match user_limit {
                Some(limit) if limit > PAGE_LIMIT => {
                    let mut offset = 0u32;
                    while offset < limit && offset < RESULTS_CEILING {
                        let page = self
                            .search_page(search_params(term, Some(PAGE_LIMIT), Some(offset)))
                            .await?;
                        tracing::debug!(provider = API_ALIAS, offset, "page fetched");
                        offset += PAGE_LIMIT;
                        total = page.total;
                        if page.businesses.is_empty() {
                            break;
                        }
                        businesses.extend(page.businesses);
                    }
                }
                _ => {
                    let page = self.search_page(search_params(term, None, None)).await?;
                    total = page.total;
                    businesses.extend(page.businesses);
                }
            }

            tracing::info!(
                provider = API_ALIAS,
                extracted = businesses.len(),
                total_api = total.unwrap_or(-1),
                "term finished"
            );
            let extracted = businesses.len();
            for business in &businesses {
                buffer.push(flatten(business, &query, total, extracted));
            }
        }
        Ok(())
    }
}

/// Request parameters for one search page: the term's own fields, with the
/// `limit` overridden and an `offset` appended when paginating.
fn search_params(
    term: &Term,
    limit_override: Option<u32>,
    offset: Option<u32>,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = term
        .fields()
        .map(|(k, v)| match (k, limit_override) {
            ("limit", Some(limit)) => (k.to_owned(), limit.to_string()),
            _ => (k.to_owned(), v.to_owned()),
        })
        .collect();
    if let Some(offset) = offset {
        params.push(("offset".to_owned(), offset.to_string()));
    }
    params
}

/// Flattens one business into a report record.
///
/// `total` is the API's own count from the last search page; `extracted`
/// is how many businesses all pages of this term actually yielded.
fn flatten(
    business: &YelpBusiness,
    query: &str,
    total: Option<i64>,
    extracted: usize,
) -> PlaceRecord {
    let mut row = PlaceRecord::new(API_ALIAS, query);
    row.total_api = total.map(|t| t.to_string());
    row.total_extracted = Some(extracted.to_string());
    row.source_link = business.url.clone();
    row.id = business.id.clone();
    row.name = business.name.clone();
    row.is_closed = business.is_closed.map(|c| c.to_string());
    row.categories = business
        .categories
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| PLACEHOLDER.to_owned()))
        .collect();
    row.reviews_amount = business.review_count.map(|n| n.to_string());
    row.rating = business.rating.map(|r| r.to_string());
    row.price = business.price.as_deref().and_then(record::price_from_symbols);
    if let Some(coordinates) = &business.coordinates {
        row.latitude = coordinates.latitude.map(|v| v.to_string());
        row.longitude = coordinates.longitude.map(|v| v.to_string());
    }
    row.address = business
        .location
        .as_ref()
        .map(|l| l.display_address.join(", "));
    row.phone = business.phone.as_ref().map(|p| p.replace('+', ""));
    row
}
