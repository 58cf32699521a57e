//! HTTP request builder.

use url::Url;

use super::client::HttpClient;
use super::response::HttpResponse;
use crate::error::{FetchError, Result};

/// Builder for constructing HTTP requests.
pub struct HttpRequestBuilder {
    client: HttpClient,
    method: reqwest::Method,
    url: String,
    headers: http::HeaderMap,
}

impl HttpRequestBuilder {
    /// Create a new request builder.
    pub(crate) fn new(client: HttpClient, method: reqwest::Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: http::HeaderMap::new(),
        }
    }

    /// Add a header to the request.
    ///
    /// Invalid header names or values are ignored.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add multiple headers to the request.
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Send the request and wait for the response headers.
    ///
    /// A request that fails to connect is retried once, immediately, when
    /// the client is configured to do so.
    pub async fn send(self) -> Result<HttpResponse> {
        let url = Url::parse(&self.url)?;
        let request = self
            .client
            .reqwest_client()
            .request(self.method, url)
            .headers(self.headers)
            .build()?;

        let client = self.client.reqwest_client();
        let retry = if self.client.config().retry_on_connection_failure {
            request.try_clone()
        } else {
            None
        };

        let response = match client.execute(request).await {
            Ok(response) => response,
            Err(err) if err.is_connect() => match retry {
                Some(request) => {
                    tracing::debug!(
                        target: "aelf_lectures_net::http",
                        "Connection to {} failed, retrying once: {}",
                        request.url(),
                        err
                    );
                    client.execute(request).await?
                }
                None => return Err(FetchError::from(err)),
            },
            Err(err) => return Err(FetchError::from(err)),
        };

        Ok(HttpResponse::from_reqwest(response))
    }
}
