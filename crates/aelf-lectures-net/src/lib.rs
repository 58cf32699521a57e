//! Networking for AELF Lectures.
//!
//! This crate loads liturgical office feeds over HTTP:
//!
//! - **DNS**: a caching resolver with a static fallback table for the AELF
//!   API hosts, pluggable into the HTTP client
//! - **HTTP Client**: one shared client with connect, read and write
//!   timeouts and a single retry on connection failure
//! - **Fetch**: cancellable, retrying feed fetches that publish exactly one
//!   outcome, with blocking and async waits
//! - **Network Info**: online/offline detection consulted before retrying
//!
//! # Fetching an office
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use aelf_lectures_core::{Office, OfficeDate, Settings};
//! use aelf_lectures_net::{FetchContext, NetworkMonitor, DEFAULT_RETRY_BUDGET};
//!
//! let settings = Arc::new(Settings::load_toml("aelf.toml")?);
//! let context = FetchContext::new(settings, Arc::new(NetworkMonitor::new()))?;
//!
//! let future = context.fetch(Office::Vespers, OfficeDate::today(), DEFAULT_RETRY_BUDGET)?;
//!
//! // Bounded wait; the fetch keeps running on timeout
//! match future.get_timeout(Duration::from_secs(5)) {
//!     Ok(lectures) => println!("{} lectures", lectures.len()),
//!     Err(err) => println!("not yet: {err}"),
//! }
//!
//! // Give up
//! future.cancel();
//! ```
//!
//! # Name resolution
//!
//! ```ignore
//! use aelf_lectures_net::dns::CachingResolver;
//!
//! // Shared by every client built without an explicit resolver
//! let resolver = CachingResolver::shared();
//! let addresses = resolver.resolve("api.app.epitre.co").await?;
//! ```
//!
//! # Logging
//!
//! Events are emitted with [`tracing`] under the `aelf_lectures_net::dns`,
//! `::http`, `::fetch` and `::network_info` targets. Installing a subscriber
//! is left to the application.

pub mod dns;
mod error;
pub mod fetch;
pub mod http;
pub mod network_info;
pub mod runtime;

pub use error::{FetchError, Result};

// Re-export commonly used types at the crate root
pub use dns::{CachingResolver, FallbackTable, HostLookup, SystemLookup};
pub use fetch::{
    CompletionGate, DEFAULT_RETRY_BUDGET, FetchContext, FetchOutcome, FetchRequest,
    LectureFuture, LectureListener,
};
pub use http::{HttpClient, HttpClientBuilder, HttpClientConfig, HttpResponse};
pub use network_info::{NetworkMonitor, NetworkStatus, StaticNetworkStatus};
