pub mod config;
pub mod credentials;
pub mod error;
pub mod record;
pub mod report;
pub mod terms;

pub use config::{load_app_config, load_app_config_from_env, AppConfig};
pub use credentials::CredentialStore;
pub use error::{ConfigError, InputError, ReportError};
pub use record::{PlaceRecord, PLACEHOLDER};
pub use report::{write_report, CSV_HEADERS};
pub use terms::{ensure_default_input, load_terms, Term};
