//! Scripted in-memory [`Browser`] used by session and discovery tests.

use crate::browser::{Browser, StoredCookie};
use crate::errors::BrowserError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A browser whose observable behavior is scripted up front: navigation
/// redirects, element visibility, element text, script results and page
/// heights are all plain data. Every call is recorded for assertions.
#[derive(Default)]
pub(crate) struct FakeBrowser {
    pub calls: Mutex<Vec<String>>,
    pub redirects: Mutex<HashMap<String, String>>,
    pub visible: Mutex<HashMap<String, bool>>,
    pub texts: Mutex<HashMap<String, String>>,
    pub script_results: Mutex<VecDeque<Value>>,
    pub heights: Mutex<VecDeque<i64>>,
    pub cookie_jar: Mutex<Vec<StoredCookie>>,
    pub current: Mutex<String>,
    pub closed: Mutex<bool>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect(&self, from: &str, to: &str) {
        self.redirects
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
    }

    pub fn set_visible(&self, selector: &str, visible: bool) {
        self.visible
            .lock()
            .unwrap()
            .insert(selector.to_string(), visible);
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(selector.to_string(), text.to_string());
    }

    pub fn push_script_result(&self, value: Value) {
        self.script_results.lock().unwrap().push_back(value);
    }

    pub fn push_height(&self, height: i64) {
        self.heights.lock().unwrap().push_back(height);
    }

    pub fn seed_cookie(&self, name: &str, value: &str) {
        self.cookie_jar.lock().unwrap().push(StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: Some(".linkedin.com".to_string()),
            path: Some("/".to_string()),
            secure: true,
            http_only: true,
            expires: None,
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Browser for FakeBrowser {
    async fn navigate(&self, url: &str, _wait: Option<Duration>) -> Result<(), BrowserError> {
        self.record(format!("navigate:{}", url));
        let landed = self
            .redirects
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.current.lock().unwrap() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _wait: Option<Duration>,
        _visible: bool,
    ) -> Result<(), BrowserError> {
        self.record(format!("wait:{}", selector));
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(*self.visible.lock().unwrap().get(selector).unwrap_or(&false))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.record(format!("click:{}", selector));
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.record(format!("fill:{}={}", selector, value));
        Ok(())
    }

    async fn element_text(
        &self,
        selector: &str,
        _wait: Option<Duration>,
    ) -> Result<String, BrowserError> {
        match self.texts.lock().unwrap().get(selector) {
            Some(text) => Ok(text.clone()),
            None => Err(BrowserError::Timeout(selector.to_string())),
        }
    }

    async fn element_html(
        &self,
        selector: &str,
        _wait: Option<Duration>,
    ) -> Result<String, BrowserError> {
        match self.texts.lock().unwrap().get(selector) {
            Some(html) => Ok(html.clone()),
            None => Err(BrowserError::Timeout(selector.to_string())),
        }
    }

    async fn attribute(
        &self,
        _selector: &str,
        _name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(None)
    }

    async fn execute(&self, _script: &str) -> Result<Value, BrowserError> {
        self.record("execute".to_string());
        Ok(self
            .script_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Value::Null))
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.record("scroll_to_bottom".to_string());
        Ok(())
    }

    async fn scroll_to(&self, position: i64) -> Result<(), BrowserError> {
        self.record(format!("scroll_to:{}", position));
        Ok(())
    }

    async fn page_height(&self) -> Result<i64, BrowserError> {
        Ok(self.heights.lock().unwrap().pop_front().unwrap_or(0))
    }

    async fn new_page(&self) -> Result<(), BrowserError> {
        self.record("new_page".to_string());
        Ok(())
    }

    async fn set_content(&self, _html: &str) -> Result<(), BrowserError> {
        self.record("set_content".to_string());
        Ok(())
    }

    async fn close_page(&self) -> Result<(), BrowserError> {
        self.record("close_page".to_string());
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError> {
        Ok(self.cookie_jar.lock().unwrap().clone())
    }

    async fn restore_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError> {
        self.record(format!("restore_cookies:{}", cookies.len()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}
