use pubcrawl_browser::{
    BrowserCookie, ElementRef, Locator, PageDriver, SessionOptions, WebDriverClient,
};
use pubcrawl_core::PublishError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ELEMENT_KEY: &str = "element-6066-11e4-a07c-4a16-b5d7-8ee0e9e1ba09";

fn ok(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

async fn started_session(server: &MockServer) -> pubcrawl_browser::WebDriverSession {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ok(json!({ "sessionId": "s1", "capabilities": {} })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/goog/cdp/execute"))
        .respond_with(ok(json!({})))
        .mount(server)
        .await;

    WebDriverClient::new(&server.uri(), 5)
        .expect("client")
        .new_session(&SessionOptions::default())
        .await
        .expect("session starts")
}

#[tokio::test]
async fn new_session_sends_chrome_capabilities() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_partial_json(json!({
            "capabilities": { "alwaysMatch": { "browserName": "chrome" } }
        })))
        .respond_with(ok(json!({ "sessionId": "abc", "capabilities": {} })))
        .expect(1)
        .mount(&server)
        .await;
    // Drivers without the CDP endpoint answer 404; the session still starts.
    Mock::given(method("POST"))
        .and(path("/session/abc/goog/cdp/execute"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": { "error": "unknown command", "message": "no cdp" }
        })))
        .mount(&server)
        .await;

    let session = WebDriverClient::new(&format!("{}/", server.uri()), 5)
        .unwrap()
        .new_session(&SessionOptions {
            headless: true,
            user_data_dir: None,
        })
        .await
        .unwrap();
    assert_eq!(session.session_id(), "abc");
}

#[tokio::test]
async fn session_refusal_is_a_webdriver_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "session not created", "message": "Chrome failed to start" }
        })))
        .mount(&server)
        .await;

    let err = WebDriverClient::new(&server.uri(), 5)
        .unwrap()
        .new_session(&SessionOptions::default())
        .await
        .err()
        .expect("should fail");
    match err {
        PublishError::WebDriver { command, message } => {
            assert_eq!(command, "new session");
            assert_eq!(message, "session not created: Chrome failed to start");
        }
        other => panic!("expected WebDriver error, got {other:?}"),
    }
}

#[tokio::test]
async fn navigate_and_read_url() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .and(body_partial_json(json!({ "url": "https://zhuanlan.zhihu.com/write" })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/url"))
        .respond_with(ok(json!("https://zhuanlan.zhihu.com/write")))
        .mount(&server)
        .await;

    session
        .navigate("https://zhuanlan.zhihu.com/write")
        .await
        .unwrap();
    assert_eq!(
        session.current_url().await.unwrap(),
        "https://zhuanlan.zhihu.com/write"
    );
}

#[tokio::test]
async fn find_by_css_returns_first_element() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/session/s1/elements"))
        .and(body_partial_json(json!({ "using": "css selector", "value": ".editor" })))
        .respond_with(ok(json!([{ ELEMENT_KEY: "e1" }, { ELEMENT_KEY: "e2" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/elements"))
        .and(body_partial_json(json!({ "using": "xpath" })))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    assert_eq!(
        session.find(&Locator::css(".editor")).await.unwrap(),
        Some(ElementRef("e1".to_string()))
    );
    assert_eq!(
        session
            .find(&Locator::xpath("//button[contains(.,'发布')]"))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn find_by_text_runs_the_lookup_script() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/session/s1/execute/sync"))
        .and(body_partial_json(json!({ "args": ["下一步"] })))
        .respond_with(ok(json!({ ELEMENT_KEY: "next-btn" })))
        .mount(&server)
        .await;

    assert_eq!(
        session.find(&Locator::text("下一步")).await.unwrap(),
        Some(ElementRef("next-btn".to_string()))
    );
}

#[tokio::test]
async fn click_falls_back_to_script_when_intercepted() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/session/s1/execute/sync"))
        .respond_with(ok(json!(null)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/e1/click"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "value": { "error": "element click intercepted", "message": "overlay" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    session
        .click(&ElementRef("e1".to_string()))
        .await
        .expect("script click succeeds");
}

#[tokio::test]
async fn cookies_windows_and_quit() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/session/s1/cookie"))
        .and(body_partial_json(json!({
            "cookie": { "name": "a1", "value": "x", "domain": ".xiaohongshu.com" }
        })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/window/handles"))
        .respond_with(ok(json!(["w1", "w2"])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    session
        .add_cookie(&BrowserCookie {
            name: "a1".to_string(),
            value: "x".to_string(),
            domain: ".xiaohongshu.com".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.window_count().await.unwrap(), 2);

    session.quit().await.unwrap();
    // Second quit is a no-op; the DELETE expectation above stays at one.
    session.quit().await.unwrap();
}

#[tokio::test]
async fn stale_session_surfaces_driver_error() {
    let server = MockServer::start().await;
    let mut session = started_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/session/s1/url"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": { "error": "invalid session id", "message": "session deleted" }
        })))
        .mount(&server)
        .await;

    let err = session.current_url().await.unwrap_err();
    assert!(
        matches!(err, PublishError::WebDriver { ref message, .. } if message.starts_with("invalid session id")),
        "got {err:?}"
    );
}
