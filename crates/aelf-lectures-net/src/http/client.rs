//! HTTP client implementation.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::redirect::Policy;

use super::request::HttpRequestBuilder;
use crate::dns::CachingResolver;
use crate::error::Result;

/// Process-wide client, created on first use.
static SHARED_CLIENT: OnceLock<HttpClient> = OnceLock::new();

/// Configuration for the HTTP client.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Read timeout, applied to each read of the response.
    pub read_timeout: Duration,
    /// Write timeout.
    ///
    /// reqwest has no write timeout. This bound is only enforced through
    /// [`request_timeout`](Self::request_timeout), the overall ceiling of one
    /// request, so a slow body that is still progressing is cut off once the
    /// sum of all three timeouts elapses.
    pub write_timeout: Duration,
    /// Whether a request that failed to connect is retried once.
    pub retry_on_connection_failure: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Default user agent.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
            retry_on_connection_failure: true,
            max_redirects: 10,
            user_agent: Some(format!("AelfLectures/{} (Rust)", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpClientConfig {
    /// Overall ceiling for one request: connect, write and read combined.
    pub fn request_timeout(&self) -> Duration {
        self.connect_timeout + self.write_timeout + self.read_timeout
    }
}

/// Builder for creating an HTTP client with custom configuration.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    resolver: Option<CachingResolver>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            resolver: None,
        }
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Do not retry requests that failed to connect.
    pub fn no_connection_retry(mut self) -> Self {
        self.config.retry_on_connection_failure = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Use `resolver` for name resolution instead of the shared resolver.
    pub fn resolver(mut self, resolver: CachingResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the HTTP client.
    pub fn build(self) -> Result<HttpClient> {
        let resolver = self.resolver.unwrap_or_else(CachingResolver::shared);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .read_timeout(self.config.read_timeout)
            .timeout(self.config.request_timeout())
            .dns_resolver(Arc::new(resolver.clone()));

        // Redirect policy
        builder = builder.redirect(Policy::limited(self.config.max_redirects));

        // User agent
        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        let client = builder.build()?;

        Ok(HttpClient {
            inner: Arc::new(HttpClientInner {
                client,
                config: self.config,
                resolver,
            }),
        })
    }
}

/// Internal state for the HTTP client.
struct HttpClientInner {
    client: reqwest::Client,
    config: HttpClientConfig,
    resolver: CachingResolver,
}

/// HTTP client used for feed requests.
///
/// The client is cheaply cloneable and thread-safe. Clones share the same
/// connection pool, configuration and resolver.
///
/// # Example
///
/// ```ignore
/// use aelf_lectures_net::http::HttpClient;
///
/// let client = HttpClient::shared()?;
/// let response = client
///     .get("https://api.app.epitre.co/-1/office/laudes/2024-03-01.rss")
///     .header("x-aelf-nocache", "1")
///     .send()
///     .await?;
/// println!("Status: {}", response.status());
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

impl HttpClient {
    /// The process-wide client, built with the default configuration and the
    /// shared resolver on first use. Later calls return the same instance.
    pub fn shared() -> Result<Self> {
        if let Some(client) = SHARED_CLIENT.get() {
            return Ok(client.clone());
        }
        let client = HttpClientBuilder::new().build()?;
        // Another thread may have won the race; its client is kept.
        Ok(SHARED_CLIENT.get_or_init(|| client).clone())
    }

    /// Create a builder for configuring a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Get the client's configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.inner.config
    }

    /// The resolver this client resolves hostnames with.
    pub fn resolver(&self) -> &CachingResolver {
        &self.inner.resolver
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl AsRef<str>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(self.clone(), reqwest::Method::GET, url.as_ref().to_string())
    }

    /// Returns true if both handles share the same underlying client.
    pub fn ptr_eq(&self, other: &HttpClient) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get a reference to the underlying reqwest client.
    pub(crate) fn reqwest_client(&self) -> &reqwest::Client {
        &self.inner.client
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish()
    }
}
