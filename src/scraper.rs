use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::errors::BrowserError;
use crate::models::RawProfilePanels;
use crate::selectors::profile;
use rand::Rng;
use std::time::Duration;

/// Captures the raw HTML panels of one profile.
///
/// Capture is the only phase that talks to the live site; everything after
/// it runs on the returned panels. Detail sections (experience, education)
/// live on their own pages and are captured in scratch pages so the main
/// profile page keeps its state.
pub struct ProfileScraper<'a, B: Browser> {
    browser: &'a B,
    settle: Duration,
}

impl<'a, B: Browser> ProfileScraper<'a, B> {
    pub fn new(browser: &'a B, config: &HarvestConfig) -> Self {
        Self {
            browser,
            settle: config.settle(),
        }
    }

    /// Capture all panels for a profile URL.
    ///
    /// The intro panel is required; a profile page without it fails the
    /// capture. Every other panel degrades to an empty string.
    pub async fn scrape_profile(&self, url: &str) -> Result<RawProfilePanels, BrowserError> {
        ::log::info!("Scraping profile {}", url);
        self.browser.navigate(url, None).await?;
        self.browser
            .wait_for_selector(profile::INTRO_PANEL, None, true)
            .await?;
        tokio::time::sleep(self.settle).await;

        let intro_panel = self.browser.element_html(profile::INTRO_PANEL, None).await?;

        let about_panel = match self
            .browser
            .element_html(profile::ABOUT_SECTION, Some(Duration::from_secs(5)))
            .await
        {
            Ok(html) => html,
            Err(BrowserError::Timeout(_)) => {
                ::log::debug!("Profile {} has no about section", url);
                String::new()
            }
            Err(e) => return Err(e),
        };

        let experience_panel = self.detail_panel_or_empty(url, "experience").await;
        let education_panel = self.detail_panel_or_empty(url, "education").await;

        Ok(RawProfilePanels {
            url: url.to_string(),
            intro_panel,
            about_panel,
            experience_panel,
            education_panel,
        })
    }

    async fn detail_panel_or_empty(&self, url: &str, section: &str) -> String {
        match self.capture_detail_panel(url, section).await {
            Ok(html) => html,
            Err(e) => {
                ::log::warn!("Failed to capture {} panel for {}: {}", section, url, e);
                String::new()
            }
        }
    }

    /// Open a scratch page on the detail view and capture its list
    /// container. The page is closed again on every exit path.
    async fn capture_detail_panel(
        &self,
        url: &str,
        section: &str,
    ) -> Result<String, BrowserError> {
        self.browser.new_page().await?;
        let result = self.capture_in_current_page(url, section).await;
        if let Err(e) = self.browser.close_page().await {
            ::log::warn!("Failed to close {} detail page: {}", section, e);
        }
        result
    }

    async fn capture_in_current_page(
        &self,
        url: &str,
        section: &str,
    ) -> Result<String, BrowserError> {
        let detail_url = format!("{}/details/{}/", url.trim_end_matches('/'), section);
        self.browser.navigate(&detail_url, None).await?;
        self.browser
            .wait_for_selector(profile::SECTION_LIST, None, true)
            .await?;
        tokio::time::sleep(self.settle).await;

        // Scroll in two paced steps so lazily-rendered entries attach.
        let height = self.browser.page_height().await?;
        self.browser.scroll_to(height / 2).await?;
        let pause = Duration::from_secs_f64(rand::thread_rng().gen_range(1.0..2.0));
        tokio::time::sleep(pause).await;
        self.browser.scroll_to_bottom().await?;
        tokio::time::sleep(self.settle).await;

        self.browser.element_html(profile::SECTION_LIST, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;

    fn test_config() -> HarvestConfig {
        HarvestConfig {
            settle_secs: 0,
            ..HarvestConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_captures_all_panels() {
        let browser = FakeBrowser::new();
        browser.set_text(profile::INTRO_PANEL, "<div>intro</div>");
        browser.set_text(profile::ABOUT_SECTION, "<div>about</div>");
        browser.set_text(profile::SECTION_LIST, "<ul>entries</ul>");

        let scraper = ProfileScraper::new(&browser, &test_config());
        let panels = scraper
            .scrape_profile("https://www.linkedin.com/in/alice")
            .await
            .unwrap();

        assert_eq!(panels.intro_panel, "<div>intro</div>");
        assert_eq!(panels.about_panel, "<div>about</div>");
        assert_eq!(panels.experience_panel, "<ul>entries</ul>");
        assert_eq!(panels.education_panel, "<ul>entries</ul>");

        let calls = browser.calls();
        assert!(calls.contains(
            &"navigate:https://www.linkedin.com/in/alice/details/experience/".to_string()
        ));
        assert!(calls.contains(
            &"navigate:https://www.linkedin.com/in/alice/details/education/".to_string()
        ));

        // Detail captures open and close one scratch page each.
        let opened = calls.iter().filter(|c| *c == "new_page").count();
        let closed = calls.iter().filter(|c| *c == "close_page").count();
        assert_eq!(opened, 2);
        assert_eq!(opened, closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_about_section_degrades_to_empty() {
        let browser = FakeBrowser::new();
        browser.set_text(profile::INTRO_PANEL, "<div>intro</div>");
        browser.set_text(profile::SECTION_LIST, "<ul>entries</ul>");

        let scraper = ProfileScraper::new(&browser, &test_config());
        let panels = scraper
            .scrape_profile("https://www.linkedin.com/in/bob")
            .await
            .unwrap();

        assert_eq!(panels.about_panel, "");
        assert_eq!(panels.experience_panel, "<ul>entries</ul>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_detail_capture_degrades_to_empty_panel() {
        let browser = FakeBrowser::new();
        browser.set_text(profile::INTRO_PANEL, "<div>intro</div>");
        browser.set_text(profile::ABOUT_SECTION, "<div>about</div>");
        // SECTION_LIST never resolves: both detail captures fail.

        let scraper = ProfileScraper::new(&browser, &test_config());
        let panels = scraper
            .scrape_profile("https://www.linkedin.com/in/carol")
            .await
            .unwrap();

        assert_eq!(panels.experience_panel, "");
        assert_eq!(panels.education_panel, "");

        // Scratch pages were still closed.
        let calls = browser.calls();
        let opened = calls.iter().filter(|c| *c == "new_page").count();
        let closed = calls.iter().filter(|c| *c == "close_page").count();
        assert_eq!(opened, closed);
    }
}
