mod client;
mod errors;
mod query;
pub mod session;
pub mod token;
pub mod user_agent;
pub use self::client::{Client, DEFAULT_DATA_URL, DEFAULT_PAGE_URL};
pub use self::errors::Error;
pub use self::query::{to_epoch_seconds, HistoryQuery, Interval, DEFAULT_RETRIES};
pub use self::session::Credentials;
pub use self::token::{extract_token, CrumbStoreExtractor, RegexExtractor, TokenExtractor};
