//! Minimal W3C WebDriver client over `reqwest`.
//!
//! Talks to a chromedriver (or any W3C-compliant endpoint) at
//! `WEBDRIVER_URL`. Only the commands the publish flows use are covered.

use std::path::PathBuf;
use std::time::Duration;

use pubcrawl_core::{AppConfig, PublishError};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::driver::{BrowserCookie, ElementRef, PageDriver};
use crate::locator::{By, Locator};

/// Key under which W3C drivers wrap element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a07c-4a16-b5d7-8ee0e9e1ba09";

const HIDE_WEBDRIVER_FLAG: &str =
    r#"Object.defineProperty(navigator, "webdriver", {get: () => undefined})"#;

/// Finds the first visible clickable element whose text contains the label.
const FIND_BY_TEXT_SCRIPT: &str = r#"
const label = arguments[0];
function visible(el) { return el.offsetParent !== null || el.getClientRects().length > 0; }
function matches(el) {
  const text = (el.innerText || el.textContent || '').trim();
  return text && text.includes(label);
}
for (const sel of ['button', 'div[role="button"]', 'a', 'span', 'div']) {
  for (const node of document.querySelectorAll(sel)) {
    if (visible(node) && matches(node)) { return node; }
  }
}
return null;
"#;

const FILL_EDITOR_SCRIPT: &str = r#"
const el = arguments[0];
const value = arguments[1];
function trigger(target) {
  ['focus', 'click', 'input', 'change', 'blur', 'keyup', 'keydown'].forEach(evt => {
    target.dispatchEvent(new Event(evt, { bubbles: true }));
  });
}
el.focus();
if (el.tagName === 'TEXTAREA' || el.tagName === 'INPUT') {
  el.value = value;
} else {
  el.click();
  el.innerHTML = '';
  value.split('\n').forEach(line => {
    const p = document.createElement('p');
    if (line.trim() === '') { p.innerHTML = '<br />'; } else { p.textContent = line; }
    el.appendChild(p);
  });
}
trigger(el);
"#;

const SCROLL_INTO_VIEW_SCRIPT: &str =
    "arguments[0].scrollIntoView({behavior: 'instant', block: 'center'});";

/// How to launch the browser for a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub headless: bool,
    /// Chrome profile directory holding an existing login.
    pub user_data_dir: Option<PathBuf>,
}

impl SessionOptions {
    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": args,
                        "excludeSwitches": ["enable-automation"],
                        "useAutomationExtension": false
                    }
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Entry point: opens sessions against one WebDriver endpoint.
#[derive(Clone)]
pub struct WebDriverClient {
    client: Client,
    base_url: Url,
}

impl WebDriverClient {
    /// # Errors
    ///
    /// Returns [`PublishError::NetworkFailure`] if the HTTP client cannot be
    /// built, or [`PublishError::Invalid`] for a malformed `base_url`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            PublishError::Invalid(format!("invalid WebDriver URL '{base_url}': {e}"))
        })?;
        Ok(Self { client, base_url })
    }

    /// # Errors
    ///
    /// As [`WebDriverClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, PublishError> {
        // Browser commands such as navigation can block far longer than an
        // API call; give them the step timeout on top of the HTTP timeout.
        let timeout = config
            .http_timeout_secs
            .saturating_add(config.browser_step_timeout_secs);
        Self::new(&config.webdriver_url, timeout)
    }

    /// Start a browser and return its session.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::WebDriver`] when the driver refuses the
    /// session, or [`PublishError::NetworkFailure`] when it is unreachable.
    pub async fn new_session(
        &self,
        options: &SessionOptions,
    ) -> Result<WebDriverSession, PublishError> {
        let value = send(
            &self.client,
            Method::POST,
            self.url("session")?,
            Some(&options.capabilities()),
            "new session",
        )
        .await?;
        let created: NewSession =
            serde_json::from_value(value).map_err(|e| PublishError::Deserialize {
                context: "new session".to_string(),
                source: e,
            })?;
        tracing::info!(
            session = %created.session_id,
            headless = options.headless,
            "browser session started"
        );

        let session = WebDriverSession {
            client: self.client.clone(),
            session_url: self.url(&format!("session/{}/", created.session_id))?,
            session_id: created.session_id,
            closed: false,
        };
        session.hide_automation_flag().await;
        Ok(session)
    }

    fn url(&self, path: &str) -> Result<Url, PublishError> {
        self.base_url
            .join(path)
            .map_err(|e| PublishError::Invalid(format!("invalid WebDriver path '{path}': {e}")))
    }
}

/// One live browser session.
pub struct WebDriverSession {
    client: Client,
    session_url: Url,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        name: &str,
    ) -> Result<Value, PublishError> {
        let url = self
            .session_url
            .join(path)
            .map_err(|e| PublishError::Invalid(format!("invalid WebDriver path '{path}': {e}")))?;
        send(&self.client, method, url, body, name).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, PublishError> {
        self.command(
            Method::POST,
            "execute/sync",
            Some(&json!({ "script": script, "args": args })),
            "execute script",
        )
        .await
    }

    /// Chrome-only; other drivers simply keep the flag.
    async fn hide_automation_flag(&self) {
        let body = json!({
            "cmd": "Page.addScriptToEvaluateOnNewDocument",
            "params": { "source": HIDE_WEBDRIVER_FLAG }
        });
        if let Err(e) = self
            .command(Method::POST, "goog/cdp/execute", Some(&body), "cdp execute")
            .await
        {
            tracing::debug!(error = %e, "could not hide navigator.webdriver");
        }
    }
}

fn element_arg(element: &ElementRef) -> Value {
    json!({ ELEMENT_KEY: element.0 })
}

fn element_from(value: &Value) -> Option<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
}

impl PageDriver for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), PublishError> {
        tracing::debug!(url, "navigate");
        self.command(Method::POST, "url", Some(&json!({ "url": url })), "navigate")
            .await?;
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), PublishError> {
        self.command(Method::POST, "refresh", Some(&json!({})), "refresh")
            .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, PublishError> {
        let value = self.command(Method::GET, "url", None, "current url").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementRef>, PublishError> {
        let using = match locator.by {
            By::Css => "css selector",
            By::Xpath => "xpath",
            By::Text => {
                let value = self
                    .execute(FIND_BY_TEXT_SCRIPT, vec![json!(locator.value)])
                    .await?;
                return Ok(element_from(&value));
            }
        };
        let value = self
            .command(
                Method::POST,
                "elements",
                Some(&json!({ "using": using, "value": locator.value })),
                "find elements",
            )
            .await?;
        Ok(value
            .as_array()
            .and_then(|elements| elements.iter().find_map(element_from)))
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), PublishError> {
        self.execute(SCROLL_INTO_VIEW_SCRIPT, vec![element_arg(element)])
            .await?;
        let path = format!("element/{}/click", element.0);
        if let Err(e) = self
            .command(Method::POST, &path, Some(&json!({})), "click")
            .await
        {
            // Overlays intercept native clicks; a script click still fires
            // the handlers.
            tracing::debug!(error = %e, "native click failed, retrying via script");
            self.execute("arguments[0].click();", vec![element_arg(element)])
                .await?;
        }
        Ok(())
    }

    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), PublishError> {
        self.command(
            Method::POST,
            &format!("element/{}/clear", element.0),
            Some(&json!({})),
            "clear",
        )
        .await?;
        self.command(
            Method::POST,
            &format!("element/{}/value", element.0),
            Some(&json!({ "text": text })),
            "send keys",
        )
        .await?;
        Ok(())
    }

    async fn fill_editor(&mut self, element: &ElementRef, text: &str) -> Result<(), PublishError> {
        self.execute(FILL_EDITOR_SCRIPT, vec![element_arg(element), json!(text)])
            .await?;
        Ok(())
    }

    async fn page_text(&mut self) -> Result<String, PublishError> {
        let value = self
            .execute("return document.body ? document.body.innerText : '';", vec![])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn add_cookie(&mut self, cookie: &BrowserCookie) -> Result<(), PublishError> {
        let body = json!({
            "cookie": {
                "name": cookie.name,
                "value": cookie.value,
                "domain": cookie.domain,
                "path": "/"
            }
        });
        self.command(Method::POST, "cookie", Some(&body), "add cookie")
            .await?;
        Ok(())
    }

    async fn delete_all_cookies(&mut self) -> Result<(), PublishError> {
        self.command(Method::DELETE, "cookie", None, "delete cookies")
            .await?;
        Ok(())
    }

    async fn window_count(&mut self) -> Result<usize, PublishError> {
        let value = self
            .command(Method::GET, "window/handles", None, "window handles")
            .await?;
        Ok(value.as_array().map_or(0, Vec::len))
    }

    async fn quit(&mut self) -> Result<(), PublishError> {
        if self.closed {
            return Ok(());
        }
        let url = Url::parse(self.session_url.as_str().trim_end_matches('/'))
            .map_err(|e| PublishError::Invalid(format!("invalid session URL: {e}")))?;
        send(&self.client, Method::DELETE, url, None, "delete session").await?;
        self.closed = true;
        tracing::info!(session = %self.session_id, "browser session closed");
        Ok(())
    }
}

/// Issue one command and unwrap the `{"value": ...}` envelope.
async fn send(
    client: &Client,
    method: Method,
    url: Url,
    body: Option<&Value>,
    name: &str,
) -> Result<Value, PublishError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    let envelope: WireResponse =
        serde_json::from_str(&text).map_err(|e| PublishError::Deserialize {
            context: format!("WebDriver {name}"),
            source: e,
        })?;

    if !status.is_success() {
        let message = serde_json::from_value::<WireError>(envelope.value).map_or_else(
            |_| format!("HTTP {}", status.as_u16()),
            |err| format!("{}: {}", err.error, err.message),
        );
        tracing::warn!(
            command = name,
            status = status.as_u16(),
            message = %message,
            "WebDriver command failed"
        );
        return Err(PublishError::WebDriver {
            command: name.to_string(),
            message,
        });
    }
    Ok(envelope.value)
}
