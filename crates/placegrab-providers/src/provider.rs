//! Common surface the batch runner drives for every adapter.

use placegrab_core::PlaceRecord;

use crate::client::ApiResponse;
use crate::error::ProviderError;

/// One provider adapter, built from its credentials and terms, consumed by
/// a single sequential `run`.
///
/// `run` processes the adapter's terms in order and appends one
/// [`PlaceRecord`] per extracted entity to `buffer`. The first request
/// failure aborts the whole run, not just the current term, but rows
/// already appended stay in the buffer; the runner logs the failure and
/// moves on to the next provider.
#[allow(async_fn_in_trait)]
pub trait Provider {
    fn name(&self) -> &'static str;

    /// Rate-limit stats extracted from the last response's headers.
    fn stats(&self) -> Vec<(String, String)>;

    /// The last response this adapter received, if any request was made.
    fn last_response(&self) -> Option<&ApiResponse>;

    async fn run(&mut self, buffer: &mut Vec<PlaceRecord>) -> Result<(), ProviderError>;
}
