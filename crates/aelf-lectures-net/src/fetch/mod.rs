//! Cancellable lecture fetches.
//!
//! A fetch requests one office feed for one date, retries failed attempts
//! while its retry budget and the network allow, and publishes exactly one
//! outcome: the parsed lectures, the last error, or a cancellation.
//!
//! # Lifecycle
//!
//! ```text
//!            start
//!              |
//!              v
//!   +----> attempt ---- lectures ----> Loaded
//!   |          |
//!   |        error
//!   |          |
//!   +- retry --+-- no budget / offline / not retryable --> Failed
//!
//!   cancel() before Loaded or Failed --> Cancelled
//! ```
//!
//! Each attempt rebuilds its request from the current preferences, so a
//! preference changed between attempts applies to the retry.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aelf_lectures_core::{LectureItem, Office, OfficeDate, Settings};
//! use aelf_lectures_net::fetch::{FetchContext, DEFAULT_RETRY_BUDGET};
//! use aelf_lectures_net::network_info::NetworkMonitor;
//!
//! let context = FetchContext::new(Arc::new(Settings::new()), Arc::new(NetworkMonitor::new()))?;
//!
//! let future = context.fetch_with_listener(
//!     Office::Lauds,
//!     OfficeDate::today(),
//!     DEFAULT_RETRY_BUDGET,
//!     |office: Office, date: OfficeDate, lectures: &[LectureItem]| {
//!         println!("{office} {date}: {} lectures", lectures.len())
//!     },
//! )?;
//!
//! let lectures = future.wait().await?;
//! ```

mod context;
mod future;
mod gate;
mod request;

pub use context::FetchContext;
pub use future::{DEFAULT_RETRY_BUDGET, FetchOutcome, LectureFuture, LectureListener};
pub use gate::CompletionGate;
pub use request::{API_ENDPOINT, FetchRequest, NO_CACHE_HEADER};
