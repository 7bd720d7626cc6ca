//! Facebook Graph places adapter.
//!
//! Same two-phase shape as the Foursquare adapter: a place search collects
//! candidate IDs into a queue keyed by the search string, then one
//! place-information call per ID produces the rows. Every detail call asks
//! for the same fixed field list; search defaults to 100 results when the
//! term does not set a limit. Auth is a single `access_token` query param.

use std::collections::HashMap;

use placegrab_core::{record, PlaceRecord, Term, PLACEHOLDER};

use crate::client::{ApiClient, ApiResponse};
use crate::error::ProviderError;
use crate::provider::Provider;

pub const API_ALIAS: &str = "facebook";

/// Expected input columns. The shared input template's `location` and
/// `foursquare_id` positions mean nothing to this adapter, so they carry
/// drop markers; `term` is read under Graph's `q` parameter name.
pub const TERMS_COLUMNS: [&str; 8] = [
    "q",
    "drop_1",
    "latitude",
    "longitude",
    "radius",
    "limit",
    "drop_3",
    "facebook_id",
];

const LOCATOR_FIELDS: [&str; 4] = ["q", "latitude", "longitude", "facebook_id"];

const STATS_HEADERS: [&str; 1] = ["x-app-usage"];

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Result size applied to searches whose term sets no limit of its own.
const DEFAULT_SEARCH_LIMIT: &str = "100";

/// Fields requested on every place-information call.
const DETAIL_FIELDS: [&str; 25] = [
    "about",
    "website",
    "category_list",
    "checkins",
    "cover",
    "engagement",
    "hours",
    "id",
    "is_always_open",
    "app_links",
    "is_permanently_closed",
    "is_verified",
    "description",
    "link",
    "location",
    "name",
    "overall_star_rating",
    "parking",
    "payment_options",
    "phone",
    "price_range",
    "rating_count",
    "restaurant_services",
    "restaurant_specialties",
    "single_line_address",
];

#[derive(Debug, serde::Deserialize)]
pub struct FacebookSearchResponse {
    #[serde(default)]
    pub data: Vec<FacebookSearchHit>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FacebookSearchHit {
    #[serde(default)]
    pub id: Option<String>,
}

/// Place-information response; unlike the other providers the detail
/// payload is the top-level object.
#[derive(Debug, serde::Deserialize)]
pub struct FacebookPlace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Facebook page URL.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub single_line_address: Option<String>,
    #[serde(default)]
    pub location: Option<FacebookLocation>,
    #[serde(default)]
    pub category_list: Vec<FacebookCategory>,
    #[serde(default)]
    pub website: Option<String>,
    /// Price indicator as repeated currency symbols, e.g. `"$$"`.
    #[serde(default)]
    pub price_range: Option<String>,
    /// Review count. Graph serves this as a plain integer for most pages
    /// but fractional values do arrive, so it is kept as a float and the
    /// decimal point rendered as a comma.
    #[serde(default)]
    pub rating_count: Option<f64>,
    #[serde(default)]
    pub overall_star_rating: Option<f64>,
    #[serde(default)]
    pub is_permanently_closed: Option<bool>,
    #[serde(default)]
    pub engagement: Option<FacebookEngagement>,
    #[serde(default)]
    pub checkins: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FacebookLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FacebookCategory {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FacebookEngagement {
    #[serde(default)]
    pub count: Option<i64>,
}

pub struct FacebookAdapter {
    client: ApiClient,
    base_url: String,
    access_token: String,
    terms: Vec<Term>,
    last_response: Option<ApiResponse>,
}

impl FacebookAdapter {
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
            access_token: keys.get("access_token").cloned().unwrap_or_default(),
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

    async fn place_search(&mut self, term: &Term) -> Result<Vec<String>, ProviderError> {
        let mut params = search_params(term);
        params.push(("access_token".to_owned(), self.access_token.clone()));
        let url = format!("{}/v3.2/search", self.base_url);
        let response = self.client.get_json(&url, &params, &[]).await?;
        let parsed: Result<FacebookSearchResponse, _> = response.parse("facebook place search");
        self.last_response = Some(response);
        Ok(parsed?
            .data
            .into_iter()
            .filter_map(|place| place.id)
            .collect())
    }

    async fn place_information(&mut self, place_id: &str) -> Result<FacebookPlace, ProviderError> {
        let params = vec![
            ("fields".to_owned(), DETAIL_FIELDS.join(",")),
            ("access_token".to_owned(), self.access_token.clone()),
        ];
        let url = format!("{}/v3.3/{place_id}", self.base_url);
        let response = self.client.get_json(&url, &params, &[]).await?;
        let parsed: Result<FacebookPlace, _> = response.parse("facebook place information");
        self.last_response = Some(response);
        parsed
    }
}

impl Provider for FacebookAdapter {
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
        let mut detail_queue: Vec<(String, Vec<String>)> = Vec::new();
        let terms = self.terms.clone();
        for term in &terms {
            if !LOCATOR_FIELDS.iter().any(|f| term.get(f).is_some()) {
                continue;
            }
            let query = term.display();
            tracing::info!(provider = API_ALIAS, term = %query, "searching");

            if let Some(id) = term.get("facebook_id") {
                tracing::debug!(provider = API_ALIAS, place_id = id, "direct id queued");
                enqueue(&mut detail_queue, &query, vec![id.to_owned()]);
                continue;
            }

            let ids = self.place_search(term).await?;
            tracing::info!(provider = API_ALIAS, candidates = ids.len(), "places found");
            enqueue(&mut detail_queue, &query, ids);
        }

        for (query, ids) in detail_queue {
            for id in ids {
                let place = self.place_information(&id).await?;
                buffer.push(flatten(&place, &query));
            }
        }
        Ok(())
    }
}

fn enqueue(queue: &mut Vec<(String, Vec<String>)>, query: &str, ids: Vec<String>) {
    if let Some((_, existing)) = queue.iter_mut().find(|(q, _)| q == query) {
        existing.extend(ids);
    } else {
        queue.push((query.to_owned(), ids));
    }
}

/// Search parameters from a term: always `type=place`, a default `limit`
/// when the term sets none, and `latitude`/`longitude` merged into
/// `center`.
fn search_params(term: &Term) -> Vec<(String, String)> {
    let latitude = term.get("latitude");
    let longitude = term.get("longitude");
    let mut params: Vec<(String, String)> = term
        .fields()
        .filter(|(k, _)| *k != "latitude" && *k != "longitude")
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    params.push(("type".to_owned(), "place".to_owned()));
    if term.get("limit").is_none() {
        params.push(("limit".to_owned(), DEFAULT_SEARCH_LIMIT.to_owned()));
    }
    if let (Some(lat), Some(lng)) = (latitude, longitude) {
        params.push(("center".to_owned(), format!("{lat},{lng}")));
    }
    params
}

fn flatten(place: &FacebookPlace, query: &str) -> PlaceRecord {
    let mut row = PlaceRecord::new(API_ALIAS, query);
    row.source_link = place.link.clone();
    // Leading apostrophe keeps spreadsheet tools from mangling the long
    // numeric page IDs.
    row.id = place.id.as_ref().map(|id| format!("'{id}"));
    row.name = place.name.clone();
    row.phone = place.phone.clone();
    row.address = place.single_line_address.clone();
    if let Some(location) = &place.location {
        row.latitude = location.latitude.map(|v| v.to_string());
        row.longitude = location.longitude.map(|v| v.to_string());
    }
    row.categories = place
        .category_list
        .iter()
        .map(|c| c.name.clone().unwrap_or_else(|| PLACEHOLDER.to_owned()))
        .collect();
    row.website = place.website.clone();
    row.price = place
        .price_range
        .as_deref()
        .and_then(record::price_from_symbols);
    row.reviews_amount = place.rating_count.map(|n| n.to_string().replace('.', ","));
    row.rating = place.overall_star_rating.map(|r| r.to_string());
    row.is_closed = place.is_permanently_closed.map(|c| c.to_string());
    row.likes_amount = place
        .engagement
        .as_ref()
        .and_then(|e| e.count)
        .map(|n| n.to_string());
    row.checkins = place.checkins.map(|n| n.to_string());
    row
}
