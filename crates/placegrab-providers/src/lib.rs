pub mod client;
pub mod error;
pub mod facebook;
pub mod foursquare;
pub mod provider;
pub mod yelp;

pub use client::{ApiClient, ApiResponse};
pub use error::ProviderError;
pub use facebook::FacebookAdapter;
pub use foursquare::FoursquareAdapter;
pub use provider::Provider;
pub use yelp::YelpAdapter;
