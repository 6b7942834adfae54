//! The [`PageDriver`] seam between publish flows and a real browser.

use pubcrawl_core::PublishError;

use crate::locator::Locator;

/// Opaque handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// A cookie to inject into the browser before navigating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// Page-level operations a publish flow needs from a browser.
///
/// [`crate::WebDriverSession`] implements this against chromedriver; tests
/// use scripted fakes.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), PublishError>;

    async fn refresh(&mut self) -> Result<(), PublishError>;

    async fn current_url(&mut self) -> Result<String, PublishError>;

    /// First element matching `locator`, or `None` when nothing matches yet.
    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementRef>, PublishError>;

    async fn click(&mut self, element: &ElementRef) -> Result<(), PublishError>;

    /// Clear an input and type `text` into it.
    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), PublishError>;

    /// Replace a rich-text editor's content with `text`, one paragraph per
    /// line, and fire the input events the page listens for.
    async fn fill_editor(&mut self, element: &ElementRef, text: &str) -> Result<(), PublishError>;

    /// Visible text of the whole page.
    async fn page_text(&mut self) -> Result<String, PublishError>;

    async fn add_cookie(&mut self, cookie: &BrowserCookie) -> Result<(), PublishError>;

    async fn delete_all_cookies(&mut self) -> Result<(), PublishError>;

    /// Number of open windows; zero once the user closed the browser.
    async fn window_count(&mut self) -> Result<usize, PublishError>;

    /// End the browser session.
    async fn quit(&mut self) -> Result<(), PublishError>;
}
