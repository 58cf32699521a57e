//! Shared HTTP client.
//!
//! One client is shared by every feed fetch in the process. It carries the
//! connect, read and write timeouts, retries a failed connection once, and
//! resolves hostnames through the [`CachingResolver`](crate::dns::CachingResolver).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use aelf_lectures_net::http::HttpClient;
//!
//! // Process-wide client
//! let client = HttpClient::shared()?;
//!
//! // Dedicated client with its own resolver
//! let client = HttpClient::builder()
//!     .connect_timeout(Duration::from_secs(5))
//!     .resolver(resolver)
//!     .build()?;
//!
//! let response = client.get(url).send().await?;
//! let body = response.error_for_status()?.bytes().await?;
//! ```

mod client;
mod request;
mod response;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::HttpRequestBuilder;
pub use response::HttpResponse;
