//! Fetch controller tests against a mock feed server.

use std::sync::Arc;
use std::time::Duration;

use aelf_lectures_core::preferences::keys;
use aelf_lectures_core::{LectureItem, Office, OfficeDate, ParseError, Settings};
use aelf_lectures_net::fetch::{FetchContext, LectureFuture, LectureListener, NO_CACHE_HEADER};
use aelf_lectures_net::http::HttpClient;
use aelf_lectures_net::network_info::{NetworkStatus, StaticNetworkStatus};
use aelf_lectures_net::FetchError;
use parking_lot::Mutex;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAUDS_PATH: &str = "/-1/office/laudes/2024-03-01.rss";

const LAUDS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Laudes du 1er mars 2024</title>
    <item>
      <key>hymne</key>
      <title>Hymne : Voici le temps</title>
      <short_title>Hymne</short_title>
      <description><![CDATA[<p>Voici le temps, Seigneur...</p>]]></description>
    </item>
    <item>
      <key>psaume1</key>
      <title>Psaume 62</title>
      <reference>Ps 62</reference>
      <description><![CDATA[<p>Dieu, tu es mon Dieu...</p>]]></description>
    </item>
    <item>
      <key>cantique_zacharie</key>
      <title>Cantique de Zacharie</title>
      <reference>Lc 1</reference>
      <description><![CDATA[<p>Beni soit le Seigneur...</p>]]></description>
    </item>
  </channel>
</rss>"#;

const EMPTY_FEED: &str = r#"<rss version="2.0"><channel><title>Vide</title></channel></rss>"#;

const TRUNCATED_FEED: &str = r#"<rss version="2.0"><channel><item><title>Hymne</title>"#;

type Loaded = Arc<Mutex<Vec<(Office, OfficeDate, Vec<LectureItem>)>>>;

fn lauds_date() -> OfficeDate {
    OfficeDate::from_ymd(2024, 3, 1).unwrap()
}

fn feed(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/rss+xml")
        .set_body_string(body)
}

/// Settings pointing at `endpoint`, and a context with a dedicated client.
fn context_for(endpoint: &str, network: Arc<dyn NetworkStatus>) -> (Arc<Settings>, FetchContext) {
    let settings = Arc::new(Settings::new());
    settings.set(keys::SERVER, endpoint);
    settings.set(keys::REGION, "romain");

    // A client per test: pooled connections must not outlive the test runtime.
    let client = HttpClient::builder().build().unwrap();
    let context = FetchContext::new(settings.clone(), network)
        .unwrap()
        .with_client(client);
    (settings, context)
}

fn online() -> Arc<dyn NetworkStatus> {
    Arc::new(StaticNetworkStatus::new(true))
}

fn fetch_recording(context: &FetchContext, retry_budget: u32) -> (LectureFuture, Loaded) {
    let loaded: Loaded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&loaded);
    let future = context
        .fetch_with_listener(
            Office::Lauds,
            lauds_date(),
            retry_budget,
            move |office: Office, date: OfficeDate, lectures: &[LectureItem]| {
                sink.lock().push((office, date, lectures.to_vec()));
            },
        )
        .unwrap();
    (future, loaded)
}

/// An address nothing listens on.
fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn test_lauds_loaded_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LAUDS_PATH))
        .and(query_param("region", "romain"))
        .respond_with(feed(LAUDS_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let (future, loaded) = fetch_recording(&context, 3);

    let lectures = future.wait().await.unwrap();
    assert_eq!(lectures.len(), 3);
    assert_eq!(lectures[0].key, "hymne");
    assert_eq!(lectures[1].short_title, "Psaume 62");
    assert_eq!(lectures[2].reference, "Lc 1");

    let loaded = loaded.lock();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].0, Office::Lauds);
    assert_eq!(loaded[0].1, lauds_date());
    assert_eq!(loaded[0].2, lectures);

    assert_eq!(future.attempts(), 1);
    assert_eq!(future.remaining_retries(), 3);
    assert!(future.is_done());
    assert!(!future.is_cancelled());
    assert_eq!(future.url().path(), LAUDS_PATH);
    assert_eq!(future.url().query(), Some("region=romain"));
}

#[tokio::test]
async fn test_malformed_bodies_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LAUDS_PATH))
        .respond_with(feed(TRUNCATED_FEED))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LAUDS_PATH))
        .respond_with(feed(LAUDS_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let (future, loaded) = fetch_recording(&context, 3);

    let lectures = future.wait().await.unwrap();
    assert_eq!(lectures.len(), 3);
    assert_eq!(future.attempts(), 3);
    assert_eq!(future.remaining_retries(), 1);
    assert_eq!(loaded.lock().len(), 1);
}

#[tokio::test]
async fn test_transport_failures_exhaust_budget() {
    for budget in [0u32, 1, 3] {
        let (_settings, context) = context_for(&closed_endpoint(), online());
        let (future, loaded) = fetch_recording(&context, budget);

        let err = future.wait().await.unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)), "unexpected error: {err:?}");
        assert_eq!(future.attempts(), budget + 1, "budget {budget}");
        assert_eq!(future.remaining_retries(), 0);
        assert!(loaded.lock().is_empty());

        // The stored cause is returned to every caller.
        assert_eq!(future.wait().await.unwrap_err(), err);
        assert!(!future.cancel());
    }
}

#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let future = context.fetch(Office::Lauds, lauds_date(), 1).unwrap();

    assert_eq!(future.wait().await.unwrap().len(), 3);
    assert_eq!(future.attempts(), 2);
    assert_eq!(future.remaining_retries(), 0);
}

#[tokio::test]
async fn test_no_retry_while_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let network = Arc::new(StaticNetworkStatus::new(false));
    let (_settings, context) = context_for(&server.uri(), network);
    let (future, loaded) = fetch_recording(&context, 3);

    assert_eq!(future.wait().await, Err(FetchError::HttpStatus { status: 500 }));
    assert_eq!(future.attempts(), 1);
    assert_eq!(future.remaining_retries(), 3);
    assert!(loaded.lock().is_empty());
}

#[tokio::test]
async fn test_cancel_before_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let (future, loaded) = fetch_recording(&context, 3);

    assert!(!future.is_done());
    assert!(future.cancel());
    assert!(!future.cancel());
    assert!(future.is_cancelled());
    assert!(future.is_done());

    assert_eq!(future.wait().await, Err(FetchError::Cancelled));
    assert_eq!(
        future.wait_timeout(Duration::from_millis(10)).await,
        Err(FetchError::Cancelled)
    );
    assert_eq!(future.try_get(), Some(Err(FetchError::Cancelled)));
    assert_eq!(future.get(), Err(FetchError::Cancelled));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(loaded.lock().is_empty());
    assert_eq!(future.attempts(), 1);
}

#[tokio::test]
async fn test_cancel_after_success_keeps_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let future = context.fetch(Office::Lauds, lauds_date(), 3).unwrap();

    let lectures = future.wait().await.unwrap();
    assert!(!future.cancel());
    assert!(!future.is_cancelled());
    assert_eq!(future.wait().await.unwrap(), lectures);
    assert_eq!(future.try_get(), Some(Ok(lectures)));
}

#[tokio::test]
async fn test_wait_timeout_leaves_fetch_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let (future, loaded) = fetch_recording(&context, 3);

    assert_eq!(
        future.wait_timeout(Duration::from_millis(20)).await,
        Err(FetchError::Timeout)
    );
    assert!(!future.is_done());
    assert!(!future.is_cancelled());
    assert_eq!(future.try_get(), None);

    let lectures = future.wait_timeout(Duration::from_secs(10)).await.unwrap();
    assert_eq!(lectures.len(), 3);
    assert_eq!(loaded.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_get_from_plain_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let future = context.fetch(Office::Lauds, lauds_date(), 3).unwrap();

    let waiter = future.clone();
    let (timed_out, result) = tokio::task::spawn_blocking(move || {
        let timed_out = waiter.get_timeout(Duration::from_millis(20));
        (timed_out, waiter.get())
    })
    .await
    .unwrap();

    assert_eq!(timed_out, Err(FetchError::Timeout));
    assert_eq!(result.unwrap().len(), 3);
    assert_eq!(
        future.get_timeout(Duration::from_millis(1)).unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_empty_feed_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(EMPTY_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let (future, loaded) = fetch_recording(&context, 3);

    assert_eq!(future.wait().await, Ok(Vec::new()));
    assert_eq!(future.attempts(), 1);

    let loaded = loaded.lock();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].2.is_empty());
}

struct PanickingListener;

impl LectureListener for PanickingListener {
    fn on_lectures_loaded(&self, _office: Office, _date: OfficeDate, _lectures: &[LectureItem]) {
        panic!("listener failed");
    }
}

#[tokio::test]
async fn test_panicking_listener_still_releases_waiters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed(LAUDS_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let future = context
        .fetch_with_listener(
            Office::Lauds,
            lauds_date(),
            3,
            PanickingListener,
        )
        .unwrap();

    let lectures = future.wait_timeout(Duration::from_secs(5)).await.unwrap();
    assert_eq!(lectures.len(), 3);
    assert!(future.is_done());
    assert!(!future.is_cancelled());
    assert_eq!(future.attempts(), 1);

    // Blocking waiters are released too.
    let blocking = future.clone();
    let result = tokio::task::spawn_blocking(move || blocking.get_timeout(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(result.map(|items| items.len()), Ok(3));
}

#[tokio::test]
async fn test_retry_uses_current_preferences() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header(NO_CACHE_HEADER, "1"))
        .respond_with(feed(LAUDS_FEED))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Arc::new(Settings::new());
    settings.set(keys::SERVER, server.uri());

    // The availability check runs before each retry; use it to flip the
    // cache-bypass preference between the two attempts.
    let flip = Arc::clone(&settings);
    let network: Arc<dyn NetworkStatus> = Arc::new(move || {
        flip.set(keys::NO_CACHE, true);
        true
    });

    let context = FetchContext::new(settings, network)
        .unwrap()
        .with_client(HttpClient::builder().build().unwrap());
    let future = context.fetch(Office::Lauds, lauds_date(), 3).unwrap();

    assert_eq!(future.wait().await.unwrap().len(), 3);
    assert_eq!(future.attempts(), 2);
    assert_eq!(future.remaining_retries(), 2);
}

#[tokio::test]
async fn test_parse_failures_surface_last_cause() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed("<html>maintenance</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let future = context.fetch(Office::Lauds, lauds_date(), 1).unwrap();

    assert_eq!(
        future.wait().await,
        Err(FetchError::Parse(ParseError::UnexpectedRoot("html".to_string())))
    );
    assert_eq!(future.attempts(), 2);
}

#[tokio::test]
async fn test_custom_parser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(feed("anything"))
        .mount(&server)
        .await;

    let (_settings, context) = context_for(&server.uri(), online());
    let context = context.with_parser(|body: &[u8]| -> aelf_lectures_core::Result<Vec<LectureItem>> {
        Ok(vec![LectureItem::new(
            String::from_utf8_lossy(body).to_string(),
            String::new(),
        )])
    });

    let lectures = context
        .fetch(Office::Mass, lauds_date(), 0)
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(lectures[0].title, "anything");
}

#[tokio::test]
async fn test_invalid_endpoint_fails_synchronously() {
    let (_settings, context) = context_for("not a url", online());
    let err = context.fetch(Office::Lauds, lauds_date(), 3).unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}
