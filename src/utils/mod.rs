//! HTTP client and retry utilities shared by the fetchers.

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::{api_retry_config, with_retry, RetryConfig};
