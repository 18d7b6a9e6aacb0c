//! Browser capability surface.
//!
//! Components consume this capability set instead of a concrete automation
//! backend; new backends conform to the same trait without inheritance.
//! `WebDriverBrowser` is the one conforming implementation.

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use webdriver::WebDriverBrowser;

use crate::errors::BrowserError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A persisted cookie record. The on-disk storage state is a JSON list of
/// these, written on successful login and on close, restored on initialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// Unix-epoch seconds; session cookies have no expiry
    pub expires: Option<i64>,
}

/// Durable browser storage state blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
    pub cookies: Vec<StoredCookie>,
}

impl StorageState {
    /// Load persisted state, or None when no file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>, std::io::Error> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                ::log::error!("Failed to parse storage state, ignoring it: {}", e);
                Ok(None)
            }
        }
    }

    /// Overwrite the durable state file in full.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Capability set every automation backend must provide.
///
/// Selectors starting with `/` are treated as XPath, everything else as CSS.
/// All methods may fail with a timeout-flavored or generic browser error;
/// callers decide whether to degrade or propagate.
pub trait Browser {
    /// Navigate to a URL. Outbound navigations are traffic-shaped by the
    /// implementation; the call blocks until the shaper admits the request
    /// and the main content is present.
    async fn navigate(&self, url: &str, timeout: Option<Duration>) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Wait for an element; with `visible` set, the element must also be
    /// displayed.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Option<Duration>,
        visible: bool,
    ) -> Result<(), BrowserError>;

    /// Short-timeout visibility probe; absence is `Ok(false)`, not an error.
    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    async fn element_text(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<String, BrowserError>;

    /// Inner HTML of the first matching element.
    async fn element_html(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<String, BrowserError>;

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Execute a script body in the page and return its value.
    async fn execute(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError>;

    async fn scroll_to(&self, position: i64) -> Result<(), BrowserError>;

    async fn page_height(&self) -> Result<i64, BrowserError>;

    /// Open a scratch page and make it current.
    async fn new_page(&self) -> Result<(), BrowserError>;

    /// Replace the current page's content wholesale. Not traffic-shaped:
    /// no outbound request is made.
    async fn set_content(&self, html: &str) -> Result<(), BrowserError>;

    /// Close the current scratch page and return to the previous one.
    async fn close_page(&self) -> Result<(), BrowserError>;

    /// Snapshot the cookie jar.
    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError>;

    /// Restore a cookie snapshot. The browser must already be on the
    /// cookies' origin.
    async fn restore_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError>;

    /// Release the browsing session. Idempotent.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
