use crate::browser::{Browser, StorageState};
use crate::config::HarvestConfig;
use crate::errors::BrowserError;
use crate::selectors::login;
use std::path::PathBuf;
use std::time::Duration;

/// Owns the browser lifecycle, authentication and session-validity checks.
///
/// Storage state (the cookie jar) is persisted to a durable path after every
/// successful login and on close, and restored on initialize, so a
/// subsequent process run can skip login entirely.
pub struct Session<B: Browser> {
    browser: B,
    base_url: String,
    storage_path: PathBuf,
    settle: Duration,
    logged_in: bool,
    closed: bool,
}

impl<B: Browser> Session<B> {
    pub fn new(browser: B, config: &HarvestConfig) -> Self {
        Self {
            browser,
            base_url: config.base_url.clone(),
            storage_path: config.storage_state_path(),
            settle: config.settle(),
            logged_in: false,
            closed: false,
        }
    }

    /// Acquire a browsing context, restoring persisted storage state if a
    /// previous run left one behind.
    pub async fn initialize(&mut self) -> Result<(), BrowserError> {
        match StorageState::load(&self.storage_path) {
            Ok(Some(state)) => {
                ::log::info!("Restoring {} persisted cookies", state.cookies.len());
                // Cookies can only be attached from their own origin.
                self.browser.navigate(&self.base_url, None).await?;
                self.browser.restore_cookies(&state.cookies).await?;
            }
            Ok(None) => {
                ::log::debug!("No persisted storage state at {:?}", self.storage_path);
            }
            Err(e) => {
                ::log::error!("Failed to load storage state: {}", e);
            }
        }
        Ok(())
    }

    /// Log in, reusing an existing session when one is still valid.
    ///
    /// Returns `Ok(false)` when the credentials are rejected; only
    /// infrastructure failures produce an `Err`.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool, BrowserError> {
        // A still-valid session redirects the feed probe straight to the
        // feed instead of a login or checkpoint page.
        let feed_url = format!("{}/feed", self.base_url);
        self.browser.navigate(&feed_url, None).await?;
        tokio::time::sleep(self.settle).await;

        let current = self.browser.current_url().await?;
        if current.contains("/feed") {
            ::log::info!("Using existing session");
            self.logged_in = true;
            return Ok(true);
        }

        ::log::info!("No existing session found, logging in");
        let login_url = format!("{}/login", self.base_url);
        self.browser.navigate(&login_url, None).await?;
        self.browser.fill(login::USERNAME_INPUT, username).await?;
        self.browser.fill(login::PASSWORD_INPUT, password).await?;
        self.browser.click(login::LOGIN_BUTTON).await?;

        // Wait for the post-submit navigation to land.
        if let Err(e) = self.browser.wait_for_selector("main", None, true).await {
            ::log::warn!("Post-login navigation wait failed: {}", e);
        }

        let valid = self.validate_session().await?;
        if valid {
            // Persist immediately so a crash after login still keeps the
            // session.
            self.save_storage_state().await;
            ::log::info!("Successfully logged in and saved session");
        } else {
            ::log::warn!("Login was rejected");
        }
        Ok(valid)
    }

    /// Check for the DOM signal that is only present when authenticated.
    /// Pure query: no navigation side effects.
    pub async fn validate_session(&mut self) -> Result<bool, BrowserError> {
        let valid = self.browser.is_visible(login::LOGGED_IN_INDICATOR).await?;
        self.logged_in = valid;
        Ok(valid)
    }

    /// Persist the cookie jar to the durable storage path. Failures are
    /// logged, never propagated: a missed snapshot only costs a re-login.
    pub async fn save_storage_state(&self) {
        let cookies = match self.browser.cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                ::log::error!("Failed to snapshot cookies: {}", e);
                return;
            }
        };
        let state = StorageState { cookies };
        if let Err(e) = state.save(&self.storage_path) {
            ::log::error!("Failed to save storage state: {}", e);
        } else {
            ::log::debug!("Storage state saved to {:?}", self.storage_path);
        }
    }

    /// Persist state and release the browser. Safe to call multiple times.
    pub async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.save_storage_state().await;
        self.browser.close().await?;
        self.closed = true;
        self.logged_in = false;
        Ok(())
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}
