//! Versioned tables of UI locators.
//!
//! Platform pages change their button labels and class names often, so every
//! control a flow touches is looked up through a [`LocatorTable`] instead of
//! being hard-coded. A table can be loaded from YAML; the built-in defaults
//! match the pages as last observed.
//!
//! ```yaml
//! version: 1
//! xiaohongshu:
//!   publish:
//!     - { by: text, value: 发布 }
//!     - { by: xpath, value: "//button[contains(.,'发布')]" }
//! ```

use std::path::Path;

use pubcrawl_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Table layout this build understands.
pub const LOCATOR_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum By {
    Css,
    Xpath,
    /// A visible clickable element whose text contains `value`.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            by: By::Css,
            value: value.into(),
        }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            by: By::Xpath,
            value: value.into(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            by: By::Text,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let by = match self.by {
            By::Css => "css",
            By::Xpath => "xpath",
            By::Text => "text",
        };
        write!(f, "{by}={}", self.value)
    }
}

fn texts(labels: &[&str]) -> Vec<Locator> {
    labels.iter().map(|l| Locator::text(*l)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XiaohongshuLocators {
    #[serde(default)]
    pub new_creation: Vec<Locator>,
    pub title: Vec<Locator>,
    pub body: Vec<Locator>,
    #[serde(default)]
    pub auto_format: Vec<Locator>,
    pub preview_next: Vec<Locator>,
    pub publish: Vec<Locator>,
}

impl Default for XiaohongshuLocators {
    fn default() -> Self {
        Self {
            new_creation: texts(&["新的创作", "开始创作", "新建创作", "立即创作"]),
            title: vec![
                Locator::css(r#"input[placeholder*="标题"]"#),
                Locator::css(r#"textarea[placeholder*="标题"]"#),
                Locator::css(r#"input[placeholder*="title"]"#),
                Locator::css(r#"input[type="text"]"#),
            ],
            body: vec![
                Locator::css(r#"div[contenteditable="true"][data-placeholder*="内容"]"#),
                Locator::css(r#"div[contenteditable="true"][data-placeholder*="正文"]"#),
                Locator::css(r#"textarea[placeholder*="内容"]"#),
                Locator::css(r#"textarea[placeholder*="正文"]"#),
                Locator::css(r#".ql-editor[contenteditable="true"]"#),
                Locator::css(".public-DraftEditor-content"),
                Locator::css(r#"div[role="textbox"]"#),
            ],
            auto_format: texts(&["一键排版", "智能排版", "自动排版"]),
            preview_next: {
                let mut next = texts(&["下一步", "下一步发布", "下一步，发布", "下一步（发布）"]);
                next.push(Locator::xpath("//button[contains(.,'下一步')]"));
                next.push(Locator::xpath("//span[contains(.,'下一步')]/ancestor::button[1]"));
                next.push(Locator::xpath("//div[@role='button' and contains(.,'下一步')]"));
                next
            },
            publish: vec![
                Locator::text("发布"),
                Locator::xpath("//button[contains(.,'发布')]"),
                Locator::xpath("//span[contains(.,'发布')]/ancestor::button[1]"),
                Locator::xpath("//div[@role='button' and contains(.,'发布')]"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZhihuLocators {
    pub title: Vec<Locator>,
    pub body: Vec<Locator>,
    #[serde(default)]
    pub markdown_confirm: Vec<Locator>,
    pub publish: Vec<Locator>,
    pub publish_confirm: Vec<Locator>,
}

impl Default for ZhihuLocators {
    fn default() -> Self {
        Self {
            title: vec![Locator::css(r#"textarea[placeholder*="标题"]"#)],
            body: vec![
                Locator::css(".DraftEditor-root"),
                Locator::css(r#"div[contenteditable="true"]"#),
            ],
            markdown_confirm: vec![Locator::xpath("//*[contains(text(), '确认并解析')]")],
            publish: vec![Locator::xpath("//button[contains(text(), '发布')]")],
            publish_confirm: vec![Locator::css(".Modal-wrapper button.Button--primary")],
        }
    }
}

/// All locators for all browser-driven platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorTable {
    pub version: u32,
    #[serde(default)]
    pub xiaohongshu: XiaohongshuLocators,
    #[serde(default)]
    pub zhihu: ZhihuLocators,
}

impl Default for LocatorTable {
    fn default() -> Self {
        Self {
            version: LOCATOR_TABLE_VERSION,
            xiaohongshu: XiaohongshuLocators::default(),
            zhihu: ZhihuLocators::default(),
        }
    }
}

impl LocatorTable {
    /// Parse a YAML table. Platforms missing from the document keep their
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileParse`] on malformed YAML, an unsupported
    /// `version`, or a required step with no locators.
    pub fn from_yaml_str(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let table: Self = serde_yaml::from_str(source).map_err(|e| ConfigError::FileParse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        table.validate(origin)?;
        Ok(table)
    }

    /// Load a YAML table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileIo`] if the file cannot be read, otherwise
    /// as [`LocatorTable::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        let table = Self::from_yaml_str(&source, &path.display().to_string())?;
        tracing::info!(path = %path.display(), version = table.version, "loaded locator table");
        Ok(table)
    }

    /// The table at `path` when given, the built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// As [`LocatorTable::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    fn validate(&self, origin: &str) -> Result<(), ConfigError> {
        if self.version != LOCATOR_TABLE_VERSION {
            return Err(ConfigError::FileParse {
                path: origin.to_string(),
                reason: format!(
                    "locator table version {} is not supported (expected {LOCATOR_TABLE_VERSION})",
                    self.version
                ),
            });
        }
        let required = [
            ("xiaohongshu.title", &self.xiaohongshu.title),
            ("xiaohongshu.body", &self.xiaohongshu.body),
            ("xiaohongshu.preview_next", &self.xiaohongshu.preview_next),
            ("xiaohongshu.publish", &self.xiaohongshu.publish),
            ("zhihu.title", &self.zhihu.title),
            ("zhihu.body", &self.zhihu.body),
            ("zhihu.publish", &self.zhihu.publish),
            ("zhihu.publish_confirm", &self.zhihu.publish_confirm),
        ];
        if let Some((step, _)) = required.iter().find(|(_, locators)| locators.is_empty()) {
            return Err(ConfigError::FileParse {
                path: origin.to_string(),
                reason: format!("required step {step} has no locators"),
            });
        }
        Ok(())
    }
}
