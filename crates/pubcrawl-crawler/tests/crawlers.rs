use chrono::{Duration, Utc};
use pubcrawl_crawler::{ArxivCrawler, CrawlError, Crawler, NewsCrawler, RssCrawler};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn atom_entry(id: &str, published: &str, title: &str) -> String {
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}</id>
    <updated>{published}</updated>
    <published>{published}</published>
    <title>{title}</title>
    <summary>Abstract of {id}.</summary>
    <author><name>Grace Hopper</name></author>
    <link title="pdf" href="http://arxiv.org/pdf/{id}" rel="related" type="application/pdf"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
  </entry>"#
    )
}

fn atom_feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/q</id>
  <updated>2024-05-02T00:00:00Z</updated>
  {}
</feed>"#,
        entries.join("\n")
    )
}

fn atom_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/atom+xml")
        .set_body_string(body)
}

#[tokio::test]
async fn arxiv_search_sends_query_and_drops_old_papers() {
    let server = MockServer::start().await;
    let recent = (Utc::now() - Duration::days(1)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "all:medical imaging"))
        .and(query_param("sortBy", "submittedDate"))
        .and(query_param("sortOrder", "descending"))
        .and(query_param("max_results", "5"))
        .respond_with(atom_response(atom_feed(&[
            atom_entry("2405.00001v1", &recent, "Fresh paper"),
            atom_entry("1901.00001v1", "2019-01-01T00:00:00Z", "Old paper"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = ArxivCrawler::with_base_url(5, "pubcrawl-test", &server.uri())
        .unwrap()
        .with_max_results(5);
    let papers = crawler
        .fetch("medical imaging", Duration::days(7))
        .await
        .unwrap();

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].id, "2405.00001v1");
    assert_eq!(papers[0].title, "Fresh paper");
    assert_eq!(papers[0].authors, vec!["Grace Hopper"]);
    assert_eq!(papers[0].link, "http://arxiv.org/pdf/2405.00001v1");
    assert_eq!(papers[0].category.as_deref(), Some("cs.CV"));
}

#[tokio::test]
async fn arxiv_get_by_id_returns_the_paper() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("id_list", "2301.00001"))
        .respond_with(atom_response(atom_feed(&[atom_entry(
            "2301.00001v3",
            "2023-01-01T00:00:00Z",
            "Known paper",
        )])))
        .mount(&server)
        .await;

    let crawler = ArxivCrawler::with_base_url(5, "pubcrawl-test", &server.uri()).unwrap();
    let paper = crawler.get_by_id("2301.00001").await.unwrap();
    assert_eq!(paper.id, "2301.00001v3");
    assert_eq!(paper.summary, "Abstract of 2301.00001v3.");
}

#[tokio::test]
async fn arxiv_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(atom_response(atom_feed(&[])))
        .mount(&server)
        .await;

    let crawler = ArxivCrawler::with_base_url(5, "pubcrawl-test", &server.uri()).unwrap();
    let err = crawler.get_by_id("9999.99999").await.unwrap_err();
    assert!(
        matches!(err, CrawlError::NotFound { ref id } if id == "9999.99999"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn arxiv_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let crawler = ArxivCrawler::with_base_url(5, "pubcrawl-test", &server.uri()).unwrap();
    let err = crawler.search("x", Duration::days(1)).await.unwrap_err();
    assert!(
        matches!(err, CrawlError::Api { status: 503, ref message, .. } if message == "Service Unavailable"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn news_sends_everything_params_and_maps_articles() {
    let server = MockServer::start().await;
    let from = (Utc::now() - Duration::days(2)).format("%Y-%m-%d").to_string();
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "technology"))
        .and(query_param("from", from.as_str()))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param("language", "en"))
        .and(query_param("pageSize", "10"))
        .and(query_param("apiKey", "key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": "wired", "name": "Wired"},
                    "author": "A. Writer",
                    "title": "Robots",
                    "description": "About robots",
                    "url": "https://example.org/robots",
                    "publishedAt": "2024-05-01T08:00:00Z",
                    "content": "Robot text"
                },
                {
                    "source": {"id": null, "name": "Removed"},
                    "title": "[Removed]",
                    "url": null
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = NewsCrawler::with_base_url(
        Some("key-123".to_string()),
        false,
        5,
        "pubcrawl-test",
        &server.uri(),
    )
    .unwrap();
    let articles = crawler.fetch("technology", Duration::days(2)).await.unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Robots");
    assert_eq!(articles[0].source, "Wired");
    assert_eq!(articles[0].link, "https://example.org/robots");
    assert_eq!(articles[0].content.as_deref(), Some("Robot text"));
}

#[tokio::test]
async fn news_api_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let crawler = NewsCrawler::with_base_url(
        Some("bad".to_string()),
        true,
        5,
        "pubcrawl-test",
        &server.uri(),
    )
    .unwrap();
    let err = crawler.everything("ai", Duration::days(1)).await.unwrap_err();
    match err {
        CrawlError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Your API key is invalid or incorrect.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn news_without_key_serves_samples_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let crawler =
        NewsCrawler::with_base_url(None, true, 5, "pubcrawl-test", &server.uri()).unwrap();
    let articles = crawler.everything("ai", Duration::days(1)).await.unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Sample Tech News: AI Breakthrough");
    assert_eq!(articles[1].source, "Dev News");
}

#[tokio::test]
async fn news_without_key_and_no_fallback_is_missing_credential() {
    let crawler = NewsCrawler::with_base_url(
        Some("   ".to_string()),
        false,
        5,
        "pubcrawl-test",
        "http://127.0.0.1:9",
    )
    .unwrap();
    let err = crawler.everything("ai", Duration::days(1)).await.unwrap_err();
    assert!(
        matches!(err, CrawlError::MissingCredential(ref var) if var == "NEWSAPI_KEY"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn rss_feed_is_read_and_capped() {
    let server = MockServer::start().await;
    let items: String = (1..=15)
        .map(|n| {
            format!(
                "<item><title>Item {n}</title><link>https://example.com/{n}</link>\
                 <description>Text {n}</description></item>"
            )
        })
        .collect();
    let body = format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Daily AI</title>{items}</channel></rss>"#
    );
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let crawler = RssCrawler::new(5, "pubcrawl-test").unwrap();
    let records = crawler
        .fetch(&format!("{}/feed.xml", server.uri()), Duration::days(1))
        .await
        .unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(records[0].title, "Item 1");
    assert_eq!(records[0].source, "Daily AI");
    assert_eq!(records[0].summary, "Text 1");
}

#[tokio::test]
async fn rss_not_found_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = RssCrawler::new(5, "pubcrawl-test").unwrap();
    let err = crawler
        .read_feed(&format!("{}/missing.xml", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CrawlError::Api { status: 404, ref message, .. } if message == "no response body"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn out_of_range_window_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let window = Duration::days(i64::from(u32::MAX));

    let arxiv = ArxivCrawler::with_base_url(5, "pubcrawl-test", &server.uri()).unwrap();
    let err = arxiv.search("x", window).await.unwrap_err();
    assert!(matches!(err, CrawlError::Invalid(_)), "got {err:?}");

    let news = NewsCrawler::with_base_url(
        Some("key-123".to_string()),
        false,
        5,
        "pubcrawl-test",
        &server.uri(),
    )
    .unwrap();
    let err = news.everything("x", window).await.unwrap_err();
    assert!(matches!(err, CrawlError::Invalid(_)), "got {err:?}");
}
