//! Batch run orchestration.
//!
//! One run walks the configured providers in a fixed order, feeds each the
//! terms parsed for its column layout, and writes everything collected into
//! a single timestamped report. Per-provider failures are logged and
//! skipped rather than propagated so one misbehaving API does not abort the
//! full run.

use std::path::PathBuf;

use placegrab_core::{
    ensure_default_input, load_terms, write_report, AppConfig, CredentialStore, PlaceRecord,
};
use placegrab_providers::{
    facebook, foursquare, yelp, ApiClient, FacebookAdapter, FoursquareAdapter, Provider,
    ProviderError, YelpAdapter,
};

/// Base-URL overrides for the providers. `None` means the provider's real
/// host. Exists so integration tests can point adapters at wiremock.
#[derive(Debug, Default)]
pub(crate) struct Endpoints {
    pub yelp: Option<String>,
    pub foursquare: Option<String>,
    pub facebook: Option<String>,
}

pub(crate) async fn run_batch(config: &AppConfig) -> anyhow::Result<PathBuf> {
    run_batch_with_endpoints(config, Endpoints::default()).await
}

/// Runs every configured provider and writes the consolidated report.
///
/// The report always lands, even when every provider was skipped or the
/// input directory was empty and only the blank template got created; a
/// header-only report is this run's whole output then.
pub(crate) async fn run_batch_with_endpoints(
    config: &AppConfig,
    endpoints: Endpoints,
) -> anyhow::Result<PathBuf> {
    let dir = config.input_dir.as_path();

    if ensure_default_input(dir)? {
        tracing::warn!(dir = %dir.display(), "wrote a blank input template, fill it in for the next run");
    }

    let credentials = CredentialStore::load(dir)?;
    let client = ApiClient::new(config)?;
    let mut records: Vec<PlaceRecord> = Vec::new();

    let yelp_keys = credentials.for_provider(yelp::API_ALIAS);
    let terms = load_terms(dir, &yelp::TERMS_COLUMNS)?;
    let yelp = YelpAdapter::new(client.clone(), &yelp_keys, terms).map(|a| match endpoints.yelp {
        Some(url) => a.with_base_url(url),
        None => a,
    });
    drive(yelp, &mut records).await;

    let foursquare_keys = credentials.for_provider(foursquare::API_ALIAS);
    let terms = load_terms(dir, &foursquare::TERMS_COLUMNS)?;
    let foursquare = FoursquareAdapter::new(client.clone(), &foursquare_keys, terms).map(|a| {
        match endpoints.foursquare {
            Some(url) => a.with_base_url(url),
            None => a,
        }
    });
    drive(foursquare, &mut records).await;

    let facebook_keys = credentials.for_provider(facebook::API_ALIAS);
    let terms = load_terms(dir, &facebook::TERMS_COLUMNS)?;
    let facebook = FacebookAdapter::new(client, &facebook_keys, terms).map(|a| {
        match endpoints.facebook {
            Some(url) => a.with_base_url(url),
            None => a,
        }
    });
    drive(facebook, &mut records).await;

    tracing::info!(rows = records.len(), "run finished");
    let path = write_report(dir, &records)?;
    Ok(path)
}

/// Drives one provider to completion, collecting its rows into `buffer`.
///
/// A provider with no credentials is skipped quietly; a provider that fails
/// mid-run keeps whatever rows it produced before the failure, and the last
/// API response body is logged when it was a non-success status.
async fn drive<P: Provider>(adapter: Result<P, ProviderError>, buffer: &mut Vec<PlaceRecord>) {
    let mut provider = match adapter {
        Ok(provider) => provider,
        Err(ProviderError::MissingCredentials { provider }) => {
            tracing::info!(provider, "no credentials configured, skipping");
            return;
        }
        Err(err) => {
            tracing::error!(error = %err, "provider could not be constructed, skipping");
            return;
        }
    };

    let name = provider.name();
    tracing::info!(provider = name, "starting");
    let before = buffer.len();

    if let Err(err) = provider.run(buffer).await {
        tracing::error!(provider = name, error = %err, "provider run failed");
    }

    if let Some(response) = provider.last_response() {
        if !response.is_success() {
            tracing::warn!(
                provider = name,
                status = response.status,
                body = %response.body,
                "last API response was not a success"
            );
        }
    }
    for (header, value) in provider.stats() {
        tracing::info!(provider = name, header, value, "rate limit");
    }
    tracing::info!(provider = name, rows = buffer.len() - before, "finished");
}
