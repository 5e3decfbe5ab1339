use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Security Wire</title>
    <link>https://wire.example.com</link>
    <description>Test feed</description>
    <item>
      <title>Zero-day in VPN &amp; firewall appliances</title>
      <link>https://wire.example.com/zero-day</link>
      <description><![CDATA[<p>Attackers are <b>actively</b> exploiting&nbsp;the flaw &amp; vendors scramble.</p>]]></description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link here</title>
      <description>Should be skipped</description>
    </item>
    <item>
      <title>Second story</title>
      <link>https://wire.example.com/second</link>
      <description>Plain text body.</description>
    </item>
  </channel>
</rss>"#;

const ATOM_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Wire</title>
  <id>urn:atom-wire</id>
  <updated>2025-01-06T10:00:00Z</updated>
  <entry>
    <title>Patch Tuesday roundup</title>
    <id>urn:atom-wire:1</id>
    <updated>2025-01-06T10:00:00Z</updated>
    <link rel="alternate" href="https://atom.example.com/patch-tuesday"/>
    <summary>Seventy fixes this month.</summary>
  </entry>
</feed>"#;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 2,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

fn feed_for(server: &MockServer, route: &str) -> RssSourceFeed {
    let config = FeedConfig {
        name: "Security Wire".to_string(),
        url: format!("{}{}", server.uri(), route),
        enabled: true,
    };
    RssSourceFeed::new(&config, 10, 1000, fast_retry()).unwrap()
}

#[tokio::test]
async fn test_fetch_rss_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    let feed = feed_for(&server, "/rss");
    let candidates = feed.fetch_candidates().await.unwrap();

    assert_eq!(candidates.len(), 2, "entry without link is skipped");

    let first = &candidates[0];
    assert_eq!(first.source_name, "Security Wire");
    assert_eq!(first.source_url, "https://wire.example.com/zero-day");
    assert_eq!(first.title, "Zero-day in VPN & firewall appliances");
    assert_eq!(
        first.content,
        "Attackers are actively exploiting the flaw & vendors scramble."
    );
    assert!(first.published_at.is_some());

    assert_eq!(candidates[1].title, "Second story");
    assert_eq!(candidates[1].published_at, None);
}

#[tokio::test]
async fn test_fetch_falls_back_to_atom() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atom"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ATOM_BODY))
        .mount(&server)
        .await;

    let candidates = feed_for(&server, "/atom").fetch_candidates().await.unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Patch Tuesday roundup");
    assert_eq!(
        candidates[0].source_url,
        "https://atom.example.com/patch-tuesday"
    );
    assert_eq!(candidates[0].content, "Seventy fixes this month.");
    assert!(candidates[0].published_at.is_some());
}

#[tokio::test]
async fn test_not_found_is_a_fetch_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = feed_for(&server, "/missing")
        .fetch_candidates()
        .await
        .unwrap_err();

    match err {
        Error::Fetch(msg) => assert!(msg.contains("HTTP 404"), "{msg}"),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    let candidates = feed_for(&server, "/flaky").fetch_candidates().await.unwrap();
    assert_eq!(candidates.len(), 2);
}

#[tokio::test]
async fn test_garbage_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
        .mount(&server)
        .await;

    let err = feed_for(&server, "/html").fetch_candidates().await.unwrap_err();
    assert!(matches!(err, Error::Fetch(_)));
}

#[test]
fn test_parse_limits_items_and_content() {
    let config = FeedConfig {
        name: "Wire".to_string(),
        url: "https://wire.example.com/rss".to_string(),
        enabled: true,
    };
    let feed = RssSourceFeed::new(&config, 1, 12, RetryConfig::default()).unwrap();

    let candidates = feed.parse(RSS_BODY).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].content, "Attackers ar");
}

#[test]
fn test_clean_html() {
    assert_eq!(clean_html("<p>Hello <i>world</i></p>"), "Hello world");
    assert_eq!(clean_html("Tom &amp; Jerry"), "Tom & Jerry");
    assert_eq!(clean_html("&#8220;quoted&#8221; &#x2014; dash"), "\u{201c}quoted\u{201d} \u{2014} dash");
    assert_eq!(clean_html("&amp;lt;kept&amp;gt;"), "&lt;kept&gt;");
    assert_eq!(clean_html("  lots\n\n of   space "), "lots of space");
}

#[test]
fn test_truncate_chars_respects_code_points() {
    assert_eq!(truncate_chars("héllo wörld", 4), "héll");
    assert_eq!(truncate_chars("short", 100), "short");
    assert_eq!(truncate_chars("", 3), "");
}
