//! Feed request construction.

use aelf_lectures_core::preferences::keys;
use aelf_lectures_core::{Office, OfficeDate, Preferences};
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::{FetchError, Result};

/// Built-in API endpoint.
pub const API_ENDPOINT: &str = "https://api.app.epitre.co";

/// Header asking the server to bypass its cache.
pub const NO_CACHE_HEADER: &str = "x-aelf-nocache";

/// Descriptor of a single feed request attempt.
///
/// Built from the current preferences for every attempt, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    office: Office,
    date: OfficeDate,
    url: Url,
    no_cache: bool,
}

impl FetchRequest {
    /// Build the request for `office` on `date` from the current preferences.
    ///
    /// The URL has the form
    /// `{endpoint}/{version}/office/{office}/{date}.rss?region={region}`.
    pub fn build(preferences: &dyn Preferences, office: Office, date: OfficeDate) -> Result<Self> {
        let endpoint = endpoint(preferences);
        let version = preferences.get_int(keys::API_VERSION, keys::DEFAULT_API_VERSION);
        let region = preferences.get_string(keys::REGION, keys::DEFAULT_REGION);

        let mut url = Url::parse(&format!(
            "{}/{}/office/{}/{}.rss",
            endpoint.trim_end_matches('/'),
            version,
            office.url_name(),
            date.to_iso_string()
        ))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        url.query_pairs_mut().append_pair("region", &region);

        Ok(Self {
            office,
            date,
            url,
            no_cache: preferences.get_bool(keys::NO_CACHE, false),
        })
    }

    /// The requested office.
    pub fn office(&self) -> Office {
        self.office
    }

    /// The requested date.
    pub fn date(&self) -> OfficeDate {
        self.date
    }

    /// The target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the server-side cache should be bypassed.
    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    /// Extra headers to send with the request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.no_cache {
            headers.insert(NO_CACHE_HEADER, HeaderValue::from_static("1"));
        }
        headers
    }
}

/// The API endpoint selected by the preferences.
///
/// An explicit server wins; otherwise the built-in endpoint, moved to its
/// `beta.` subdomain when the beta channel is enabled.
fn endpoint(preferences: &dyn Preferences) -> String {
    let server = preferences.get_string(keys::SERVER, "");
    let server = server.trim();
    if !server.is_empty() {
        return server.to_string();
    }

    if preferences.get_bool(keys::BETA, false) {
        for scheme in ["https://", "http://"] {
            if let Some(host) = API_ENDPOINT.strip_prefix(scheme) {
                return format!("{scheme}beta.{host}");
            }
        }
    }
    API_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aelf_lectures_core::Settings;

    fn lauds() -> (Office, OfficeDate) {
        (Office::Lauds, OfficeDate::from_ymd(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_default_url() {
        let (office, date) = lauds();
        let request = FetchRequest::build(&Settings::new(), office, date).unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.app.epitre.co/-1/office/laudes/2024-03-01.rss?region=romain"
        );
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_beta_endpoint() {
        let settings = Settings::new();
        settings.set(keys::BETA, true);
        settings.set(keys::API_VERSION, 61);
        let (office, date) = lauds();
        let request = FetchRequest::build(&settings, office, date).unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://beta.api.app.epitre.co/61/office/laudes/2024-03-01.rss?region=romain"
        );
    }

    #[test]
    fn test_server_override_wins_over_beta() {
        let settings = Settings::new();
        settings.set(keys::BETA, true);
        settings.set(keys::SERVER, "http://127.0.0.1:8080/");
        settings.set(keys::REGION, "france");
        let request =
            FetchRequest::build(&settings, Office::Compline, OfficeDate::from_ymd(2024, 12, 25).unwrap())
                .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:8080/-1/office/complies/2024-12-25.rss?region=france"
        );
    }

    #[test]
    fn test_no_cache_header() {
        let settings = Settings::new();
        settings.set(keys::NO_CACHE, true);
        let (office, date) = lauds();
        let request = FetchRequest::build(&settings, office, date).unwrap();
        assert!(request.no_cache());
        assert_eq!(request.headers().get(NO_CACHE_HEADER).unwrap(), "1");
    }

    #[test]
    fn test_invalid_server() {
        let (office, date) = lauds();

        let settings = Settings::new();
        settings.set(keys::SERVER, "not a url");
        assert!(matches!(
            FetchRequest::build(&settings, office, date),
            Err(FetchError::InvalidUrl(_))
        ));

        settings.set(keys::SERVER, "ftp://files.example.com");
        assert!(matches!(
            FetchRequest::build(&settings, office, date),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
