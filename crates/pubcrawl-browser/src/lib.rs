//! Browser-driven publishers for platforms without a usable write API
//! (Xiaohongshu, Zhihu).
//!
//! Flows talk to the browser through [`PageDriver`]; [`WebDriverSession`]
//! implements it against a W3C WebDriver endpoint such as chromedriver.
//! Every control a flow touches comes from a [`LocatorTable`], and a step
//! whose control never shows up ends the flow with
//! [`pubcrawl_core::PublishOutcome::ManualInterventionRequired`] while the
//! browser stays open for a person to finish.

pub mod cookie;
pub mod driver;
pub mod flow;
pub mod locator;
pub mod webdriver;
pub mod xiaohongshu;
pub mod zhihu;

pub use driver::{BrowserCookie, ElementRef, PageDriver};
pub use flow::StepWait;
pub use locator::{By, Locator, LocatorTable, XiaohongshuLocators, ZhihuLocators};
pub use webdriver::{SessionOptions, WebDriverClient, WebDriverSession};
pub use xiaohongshu::XiaohongshuPublisher;
pub use zhihu::ZhihuPublisher;
