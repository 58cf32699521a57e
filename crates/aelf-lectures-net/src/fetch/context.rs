//! Collaborators shared by fetches.

use std::sync::Arc;

use aelf_lectures_core::{FeedParser, Office, OfficeDate, Preferences, RssFeedParser};

use super::future::{LectureFuture, LectureListener};
use crate::error::Result;
use crate::http::HttpClient;
use crate::network_info::NetworkStatus;

/// Everything a fetch needs besides what it fetches.
///
/// Cheap to clone; every fetch started from a context keeps its own clone.
#[derive(Clone)]
pub struct FetchContext {
    client: HttpClient,
    preferences: Arc<dyn Preferences>,
    network: Arc<dyn NetworkStatus>,
    parser: Arc<dyn FeedParser>,
}

impl FetchContext {
    /// Create a context over the shared HTTP client and the RSS parser.
    pub fn new(preferences: Arc<dyn Preferences>, network: Arc<dyn NetworkStatus>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::shared()?,
            preferences,
            network,
            parser: Arc::new(RssFeedParser::new()),
        })
    }

    /// Use `client` instead of the shared client.
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Use `parser` instead of the RSS parser.
    pub fn with_parser(mut self, parser: impl FeedParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// The HTTP client requests are sent with.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// The preferences requests are built from.
    pub fn preferences(&self) -> &dyn Preferences {
        self.preferences.as_ref()
    }

    /// The network availability predicate consulted before retrying.
    pub fn network(&self) -> &dyn NetworkStatus {
        self.network.as_ref()
    }

    /// The feed body parser.
    pub fn parser(&self) -> &dyn FeedParser {
        self.parser.as_ref()
    }

    /// Start fetching the lectures of `office` on `date`.
    ///
    /// `retry_budget` is the number of retries allowed after the first
    /// failed attempt.
    pub fn fetch(&self, office: Office, date: OfficeDate, retry_budget: u32) -> Result<LectureFuture> {
        LectureFuture::start(self.clone(), office, date, retry_budget, None)
    }

    /// Start a fetch that notifies `listener` when the lectures are loaded.
    pub fn fetch_with_listener(
        &self,
        office: Office,
        date: OfficeDate,
        retry_budget: u32,
        listener: impl LectureListener + 'static,
    ) -> Result<LectureFuture> {
        LectureFuture::start(self.clone(), office, date, retry_budget, Some(Arc::new(listener)))
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
