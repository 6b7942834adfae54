//! Integration tests for `TwitterClient` using wiremock HTTP mocks.

use pubcrawl_core::{
    MediaRef, PublishError, PublishOutcome, PublishRequest, Publisher, RetryPolicy,
    TwitterCredentials,
};
use pubcrawl_twitter::TwitterClient;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_attempts: u32) -> TwitterClient {
    let credentials = TwitterCredentials {
        access_token: "test-token".to_string(),
    };
    TwitterClient::with_base_url(
        &credentials,
        30,
        "pubcrawl-test",
        RetryPolicy::immediate(max_attempts),
        base_url,
    )
    .expect("client construction should not fail")
}

fn created(id: &str, text: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "data": { "id": id, "text": text }
    }))
}

#[tokio::test]
async fn post_tweet_returns_id_with_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({ "text": "Hello Twitter!" })))
        .respond_with(created("1790000000000000001", "Hello Twitter!"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 4);
    let posted = client
        .post_tweet("Hello Twitter!", &[])
        .await
        .expect("should post");

    assert_eq!(posted.id(), "1790000000000000001");
    assert_eq!(posted.text(), "Hello Twitter!");
}

#[tokio::test]
async fn rate_limit_exhaustion_fails_without_posting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-limit", "50")
                .insert_header("x-rate-limit-remaining", "0")
                .set_body_json(serde_json::json!({ "title": "Too Many Requests" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client
        .post_tweet("will never land", &[])
        .await
        .expect_err("should be rate limited");

    match err {
        PublishError::RateLimited { action, attempts } => {
            assert_eq!(action, "post_tweet");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_then_success_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(created("42", "second time lucky"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 4);
    let posted = client
        .post_tweet("second time lucky", &[])
        .await
        .expect("should succeed after one retry");
    assert_eq!(posted.id(), "42");
}

#[tokio::test]
async fn thread_chains_each_reply_to_previous_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({
            "text": "three",
            "reply": { "in_reply_to_tweet_id": "200" }
        })))
        .respond_with(created("300", "three"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({
            "text": "two",
            "reply": { "in_reply_to_tweet_id": "100" }
        })))
        .respond_with(created("200", "two"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({ "text": "one" })))
        .respond_with(created("100", "one"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let ids = client
        .post_thread(&["one", "two", "three"])
        .await
        .expect("thread should post");

    assert_eq!(ids, vec!["100", "200", "300"]);

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(first.get("reply").is_none(), "first tweet must not be a reply");
}

#[tokio::test]
async fn thread_failure_reports_already_posted_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({ "text": "two" })))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "title": "Forbidden",
            "detail": "duplicate content"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({ "text": "one" })))
        .respond_with(created("100", "one"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client
        .post_thread(&["one", "two", "three"])
        .await
        .expect_err("second tweet is rejected");

    match err {
        PublishError::ThreadInterrupted { posted, source } => {
            assert_eq!(posted, vec!["100"]);
            assert!(matches!(
                *source,
                PublishError::SubmissionRejected { status: 403, .. }
            ));
        }
        other => panic!("expected ThreadInterrupted, got {other:?}"),
    }
}

#[tokio::test]
async fn thread_with_overlong_entry_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(created("1", "x"))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let long = "x".repeat(281);
    let err = client
        .post_thread(&["fine", long.as_str()])
        .await
        .expect_err("should reject");
    assert!(matches!(err, PublishError::Invalid(_)), "got {err:?}");
}

#[tokio::test]
async fn delete_missing_tweet_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/2/tweets/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "title": "Not Found Error"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client.delete_tweet("999").await.expect_err("should fail");
    match err {
        PublishError::NotFound { id } => assert_eq!(id, "999"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_reporting_not_deleted_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/2/tweets/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": { "deleted": false } })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client.delete_tweet("5").await.expect_err("should fail");
    assert!(matches!(err, PublishError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn delete_owned_tweet_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/2/tweets/77"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": { "deleted": true } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    client.delete_tweet("77").await.expect("should delete");
}

#[tokio::test]
async fn delete_rejects_non_numeric_ids_without_a_request() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    for id in ["", "1/../../users/x", "1?x", " 12"] {
        let err = client.delete_tweet(id).await.expect_err("should fail");
        assert!(matches!(err, PublishError::Invalid(_)), "{id:?}: got {err:?}");
    }
}

#[tokio::test]
async fn unauthorized_is_session_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "title": "Unauthorized",
            "detail": "Unauthorized",
            "status": 401
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 4);
    let err = client.post_tweet("hi", &[]).await.expect_err("should fail");
    assert!(matches!(err, PublishError::SessionInvalid(_)), "got {err:?}");
}

#[tokio::test]
async fn overlong_tweet_is_rejected_before_any_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(created("1", "x"))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client
        .post_tweet(&"a".repeat(281), &[])
        .await
        .expect_err("should reject");
    assert!(matches!(err, PublishError::Invalid(_)), "got {err:?}");
}

#[tokio::test]
async fn media_is_uploaded_and_attached() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("chart.png");
    std::fs::write(&image, b"\x89PNG fake image bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/2/media/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": { "id": "media-1" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({
            "text": "with a chart",
            "media": { "media_ids": ["media-1"] }
        })))
        .respond_with(created("555", "with a chart"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let posted = client
        .post_tweet("with a chart", &[MediaRef { path: image }])
        .await
        .expect("should post with media");
    assert_eq!(posted.id(), "555");
}

#[tokio::test]
async fn publisher_impl_reports_published_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(serde_json::json!({ "text": "Title\n\nBody" })))
        .respond_with(created("9", "Title\n\nBody"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 1);
    let outcome = client
        .publish(&PublishRequest::new("Title", "Body"))
        .await
        .expect("should publish");
    assert_eq!(
        outcome,
        PublishOutcome::Published {
            id: "9".to_string()
        }
    );
}

#[tokio::test]
#[ignore = "posts to the live X API; needs TWITTER_ACCESS_TOKEN"]
async fn live_post_and_delete() {
    let config = pubcrawl_core::load_app_config().expect("config");
    let client = TwitterClient::from_config(&config).expect("client");
    let posted = client
        .post_tweet("pubcrawl live check", &[])
        .await
        .expect("post");
    client.delete_tweet(posted.id()).await.expect("delete");
}
