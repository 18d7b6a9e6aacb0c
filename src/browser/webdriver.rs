use crate::browser::{Browser, StoredCookie};
use crate::config::HarvestConfig;
use crate::errors::BrowserError;
use crate::limiter::RateLimiter;
use fantoccini::cookies::Cookie;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use rand::seq::SliceRandom;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;

/// Realistic desktop user agents, rotated at connect time.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

/// The WebDriver-backed implementation of the [`Browser`] capability set.
///
/// Owns the traffic shaper: every outbound `navigate` is gated through it.
/// Scratch pages are separate windows; `set_content` rewrites the current
/// document without an outbound request.
pub struct WebDriverBrowser {
    client: Client,
    limiter: tokio::sync::Mutex<RateLimiter>,
    /// Window handles to return to when a scratch page closes
    windows: Mutex<Vec<WindowHandle>>,
    default_timeout: Duration,
    closed: AtomicBool,
}

impl WebDriverBrowser {
    /// Connect to the WebDriver instance named in the configuration.
    ///
    /// This is the only fatal resource acquisition: a failure here
    /// propagates to the caller of the top-level run.
    pub async fn connect(config: &HarvestConfig) -> Result<Self, BrowserError> {
        let user_agent = random_user_agent();
        ::log::debug!("Using user agent: {}", user_agent);

        let mut chrome_args = vec![format!("--user-agent={}", user_agent)];
        if config.headless {
            chrome_args.push("--headless=new".to_string());
            chrome_args.push("--disable-gpu".to_string());
        }

        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": chrome_args }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|source| BrowserError::Connection {
                url: config.webdriver_url.clone(),
                source,
            })?;

        ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);

        let limiter = RateLimiter::new(
            config.rate_limit.clone(),
            config.rate_limiter_state_path(),
        );

        Ok(Self {
            client,
            limiter: tokio::sync::Mutex::new(limiter),
            windows: Mutex::new(Vec::new()),
            default_timeout: config.default_timeout(),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::NotInitialized);
        }
        Ok(())
    }

    /// Wait for an element, mapping the wait timeout to a typed error.
    async fn resolve(&self, selector: &str, wait: Duration) -> Result<Element, BrowserError> {
        self.ensure_open()?;
        match self
            .client
            .wait()
            .at_most(wait)
            .for_element(locator_for(selector))
            .await
        {
            Ok(element) => Ok(element),
            Err(CmdError::WaitTimeout) => Err(BrowserError::Timeout(selector.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn wait_or_default(&self, wait: Option<Duration>) -> Duration {
        wait.unwrap_or(self.default_timeout)
    }
}

impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str, wait: Option<Duration>) -> Result<(), BrowserError> {
        self.ensure_open()?;

        // Gate every outbound request through the traffic shaper.
        self.limiter.lock().await.acquire().await;

        let deadline = self.wait_or_default(wait);
        timeout(deadline, self.client.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {}", url)))?
            .map_err(|source| BrowserError::Navigation {
                url: url.to_string(),
                source,
            })?;

        // Let the main content appear before callers start querying.
        self.wait_for_selector("main", Some(deadline), true).await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        Ok(self.client.current_url().await?.to_string())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        wait: Option<Duration>,
        visible: bool,
    ) -> Result<(), BrowserError> {
        let element = self.resolve(selector, self.wait_or_default(wait)).await?;
        if visible && !element.is_displayed().await? {
            return Err(BrowserError::Timeout(format!("{} (visible)", selector)));
        }
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError> {
        match self.resolve(selector, Duration::from_secs(1)).await {
            Ok(element) => Ok(element.is_displayed().await?),
            Err(BrowserError::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.resolve(selector, self.default_timeout).await?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.resolve(selector, self.default_timeout).await?;
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    async fn element_text(
        &self,
        selector: &str,
        wait: Option<Duration>,
    ) -> Result<String, BrowserError> {
        let element = self.resolve(selector, self.wait_or_default(wait)).await?;
        Ok(element.text().await?.trim().to_string())
    }

    async fn element_html(
        &self,
        selector: &str,
        wait: Option<Duration>,
    ) -> Result<String, BrowserError> {
        let element = self.resolve(selector, self.wait_or_default(wait)).await?;
        Ok(element.html(true).await?)
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let element = self.resolve(selector, self.default_timeout).await?;
        Ok(element.attr(name).await?)
    }

    async fn execute(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        self.ensure_open()?;
        Ok(self.client.execute(script, vec![]).await?)
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.execute("window.scrollTo(0, document.body.scrollHeight); return true;")
            .await?;
        Ok(())
    }

    async fn scroll_to(&self, position: i64) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.client
            .execute(
                "window.scrollTo(0, arguments[0]); return true;",
                vec![serde_json::json!(position)],
            )
            .await?;
        Ok(())
    }

    async fn page_height(&self) -> Result<i64, BrowserError> {
        let value = self.execute("return document.body.scrollHeight;").await?;
        Ok(value.as_i64().unwrap_or(0))
    }

    async fn new_page(&self) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let current = self.client.window().await?;
        let response = self.client.new_window(true).await?;
        self.client.switch_to_window(response.handle).await?;
        self.windows
            .lock()
            .expect("window stack poisoned")
            .push(current);
        Ok(())
    }

    async fn set_content(&self, html: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        // about:blank is not an outbound request, so it bypasses the shaper.
        self.client.goto("about:blank").await?;
        self.client
            .execute(
                "document.open(); document.write(arguments[0]); document.close(); return true;",
                vec![serde_json::Value::String(html.to_string())],
            )
            .await?;
        Ok(())
    }

    async fn close_page(&self) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let previous = self.windows.lock().expect("window stack poisoned").pop();
        self.client.close_window().await?;
        if let Some(handle) = previous {
            self.client.switch_to_window(handle).await?;
        }
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError> {
        self.ensure_open()?;
        let cookies = self.client.get_all_cookies().await?;
        Ok(cookies.iter().map(to_stored).collect())
    }

    async fn restore_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError> {
        self.ensure_open()?;
        for stored in cookies {
            if let Err(e) = self.client.add_cookie(to_cookie(stored)).await {
                // A single stale cookie must not block session restoration.
                ::log::warn!("Failed to restore cookie {}: {}", stored.name, e);
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.client.clone().close().await?;
        Ok(())
    }
}

/// Dispatch on the selector prefix: `/` means XPath, anything else is CSS.
fn locator_for(selector: &str) -> Locator<'_> {
    if selector.starts_with('/') {
        Locator::XPath(selector)
    } else {
        Locator::Css(selector)
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

fn to_stored(cookie: &Cookie<'_>) -> StoredCookie {
    StoredCookie {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain: cookie.domain().map(str::to_string),
        path: cookie.path().map(str::to_string),
        secure: cookie.secure().unwrap_or(false),
        http_only: cookie.http_only().unwrap_or(false),
        expires: cookie
            .expires()
            .and_then(|e| e.datetime())
            .map(|dt| dt.unix_timestamp()),
    }
}

fn to_cookie(stored: &StoredCookie) -> Cookie<'static> {
    let mut cookie = Cookie::new(stored.name.clone(), stored.value.clone());
    if let Some(domain) = &stored.domain {
        cookie.set_domain(domain.clone());
    }
    if let Some(path) = &stored.path {
        cookie.set_path(path.clone());
    }
    cookie.set_secure(stored.secure);
    cookie.set_http_only(stored.http_only);
    if let Some(ts) = stored.expires {
        if let Ok(datetime) = time::OffsetDateTime::from_unix_timestamp(ts) {
            cookie.set_expires(datetime);
        }
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_dispatches_on_prefix() {
        assert!(matches!(
            locator_for("//*[@id='about']"),
            Locator::XPath(_)
        ));
        assert!(matches!(locator_for(".global-nav"), Locator::Css(_)));
    }

    #[test]
    fn test_cookie_conversion_round_trip() {
        let stored = StoredCookie {
            name: "li_at".to_string(),
            value: "token".to_string(),
            domain: Some(".linkedin.com".to_string()),
            path: Some("/".to_string()),
            secure: true,
            http_only: true,
            expires: Some(1_800_000_000),
        };

        let cookie = to_cookie(&stored);
        let back = to_stored(&cookie);
        assert_eq!(back.name, stored.name);
        assert_eq!(back.value, stored.value);
        // The cookie layer normalizes the leading dot away.
        assert_eq!(back.domain.as_deref(), Some("linkedin.com"));
        assert_eq!(back.secure, stored.secure);
        assert_eq!(back.expires, stored.expires);
    }
}
