use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::models::ConnectionLink;
use crate::selectors::search;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Raw connection card as returned by script evaluation, validated and
/// converted at the boundary.
#[derive(Debug, Deserialize)]
struct ConnectionCard {
    name: Option<String>,
    occupation: Option<String>,
    url: Option<String>,
}

/// Finds and extracts profile URLs from search results and the connections
/// view. Both modes share one canonicalization/dedup strategy.
pub struct LinkDiscovery<'a, B: Browser> {
    browser: &'a B,
    base_url: String,
    settle: Duration,
    profile_path: Regex,
}

impl<'a, B: Browser> LinkDiscovery<'a, B> {
    pub fn new(browser: &'a B, config: &HarvestConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            browser,
            base_url: config.base_url.clone(),
            settle: config.settle(),
            profile_path: Regex::new(search::PROFILE_PATH_PATTERN)?,
        })
    }

    /// Collect profile links from people search results.
    ///
    /// Walks up to `num_pages` result pages, stopping early when no next
    /// control is visible. Results are globally deduplicated across pages;
    /// ordering is not guaranteed. Failures log and return what was
    /// gathered so far.
    pub async fn from_search(&self, keyword: &str, num_pages: usize) -> Vec<String> {
        let search_url = format!(
            "{}/search/results/people/?keywords={}",
            self.base_url, keyword
        );
        if let Err(e) = self.browser.navigate(&search_url, None).await {
            ::log::error!("Failed to open search results: {}", e);
            return Vec::new();
        }

        let mut found: HashSet<String> = HashSet::new();
        for page in 0..num_pages {
            if let Err(e) = self
                .browser
                .wait_for_selector(search::SEARCH_RESULTS, None, true)
                .await
            {
                ::log::error!("Search results container missing on page {}: {}", page, e);
                break;
            }

            // Scroll to the bottom so lazily-rendered results attach.
            if let Err(e) = self.browser.scroll_to_bottom().await {
                ::log::warn!("Scroll failed on page {}: {}", page, e);
            }
            tokio::time::sleep(self.settle).await;

            let links = self.collect_hrefs(search::PROFILE_LINKS).await;
            let insights: HashSet<String> =
                self.collect_hrefs(search::INSIGHTS_LINKS).await.into_iter().collect();

            for link in links {
                if self.is_profile_link(&link, &insights) {
                    found.insert(canonicalize_url(&link));
                }
            }

            // Advance only while a visible next control exists.
            if page + 1 < num_pages {
                match self.browser.is_visible(search::NEXT_BUTTON).await {
                    Ok(true) => {
                        if let Err(e) = self.browser.click(search::NEXT_BUTTON).await {
                            ::log::error!("Failed to advance to next page: {}", e);
                            break;
                        }
                        tokio::time::sleep(self.settle).await;
                    }
                    _ => break,
                }
            }
        }

        ::log::info!("Found {} profile links", found.len());
        found.into_iter().collect()
    }

    /// Collect connection cards from the connections view, in discovery
    /// order, capped at `max_results` when given. Stops when a full
    /// scroll-and-wait produces no page-height increase.
    pub async fn from_connections(&self, max_results: Option<usize>) -> Vec<ConnectionLink> {
        let connections_url = format!(
            "{}/mynetwork/invite-connect/connections/",
            self.base_url
        );
        if let Err(e) = self.browser.navigate(&connections_url, None).await {
            ::log::error!("Failed to open connections view: {}", e);
            return Vec::new();
        }
        if let Err(e) = self
            .browser
            .wait_for_selector(search::CONNECTIONS_CONTAINER, None, true)
            .await
        {
            ::log::error!("Connections container missing: {}", e);
            return Vec::new();
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut connections: Vec<ConnectionLink> = Vec::new();

        loop {
            for card in self.collect_cards().await {
                let Some(url) = card.url else { continue };
                let canonical = canonicalize_url(&url);
                if !seen.insert(canonical.clone()) {
                    continue;
                }
                connections.push(ConnectionLink {
                    name: card.name.unwrap_or_default(),
                    occupation: card.occupation.unwrap_or_default(),
                    url: canonical,
                });
            }

            if let Some(max) = max_results {
                if connections.len() >= max {
                    connections.truncate(max);
                    break;
                }
            }

            // A scroll that does not grow the page means end of content.
            let before = match self.browser.page_height().await {
                Ok(height) => height,
                Err(e) => {
                    ::log::error!("Failed to read page height: {}", e);
                    break;
                }
            };
            if let Err(e) = self.browser.scroll_to_bottom().await {
                ::log::warn!("Scroll failed: {}", e);
                break;
            }
            tokio::time::sleep(self.settle).await;

            match self.browser.page_height().await {
                Ok(after) if after > before => {}
                _ => break,
            }
        }

        ::log::info!("Found {} connections", connections.len());
        connections
    }

    /// Keep only links that are not insight links, match the profile path
    /// shape, and are not internal search shortcuts.
    fn is_profile_link(&self, link: &str, insights: &HashSet<String>) -> bool {
        !insights.contains(link)
            && self.profile_path.is_match(link)
            && !link.contains(search::SEARCH_SHORTCUT_MARKER)
    }

    async fn collect_hrefs(&self, selector: &str) -> Vec<String> {
        let script = format!(
            "return Array.from(document.querySelectorAll(\"{}\")).map((el) => el.href);",
            selector
        );
        match self.browser.execute(&script).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                ::log::error!("Link collection script failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn collect_cards(&self) -> Vec<ConnectionCard> {
        let script = format!(
            "return Array.from(document.querySelectorAll('{card}')).map((card) => ({{\n\
                 name: card.querySelector('{name}')?.innerText.trim() ?? null,\n\
                 occupation: card.querySelector('{occupation}')?.innerText.trim() ?? null,\n\
                 url: card.querySelector('{link}')?.href ?? null,\n\
             }}));",
            card = search::CONNECTION_CARD,
            name = search::CONNECTION_NAME,
            occupation = search::CONNECTION_OCCUPATION,
            link = search::CONNECTION_LINK,
        );
        match self.browser.execute(&script).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                ::log::error!("Connection card script failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Canonicalize a profile URL: scheme+host+path only, no query or fragment,
/// no trailing slashes. Returns the input unchanged when it does not parse.
pub fn canonicalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;
    use serde_json::json;

    fn test_config() -> HarvestConfig {
        HarvestConfig {
            settle_secs: 0,
            ..HarvestConfig::default()
        }
    }

    #[test]
    fn test_canonicalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(
            canonicalize_url("https://x.com/in/a/?x=1#y"),
            "https://x.com/in/a"
        );
        assert_eq!(canonicalize_url("https://x.com/in/a"), "https://x.com/in/a");
        assert_eq!(canonicalize_url("https://x.com"), "https://x.com");
    }

    #[test]
    fn test_canonicalize_strips_repeated_trailing_slashes() {
        assert_eq!(
            canonicalize_url("https://x.com/in/a//"),
            "https://x.com/in/a"
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for raw in [
            "https://x.com/in/a/?x=1#y",
            "https://x.com/in/a/",
            "https://x.com/in/a//",
            "https://x.com",
            "not a url at all",
        ] {
            let once = canonicalize_url(raw);
            assert_eq!(canonicalize_url(&once), once);
        }
    }

    #[test]
    fn test_canonicalize_passes_through_unparseable_input() {
        assert_eq!(canonicalize_url("::notaurl::"), "::notaurl::");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_dedups_across_pages_and_query_strings() {
        let browser = FakeBrowser::new();
        let config = test_config();

        // Page 1: two profiles (one with a query string), one insight link,
        // one search shortcut.
        browser.push_script_result(json!([
            "https://www.linkedin.com/in/alice?miniProfile=1",
            "https://www.linkedin.com/in/bob",
            "https://www.linkedin.com/in/shared?origin=SHARED_CONNECTIONS_CANNED_SEARCH",
            "https://www.linkedin.com/in/carol",
        ]));
        browser.push_script_result(json!(["https://www.linkedin.com/in/carol"]));

        // Page 2: alice again under a different query string, plus dave.
        browser.push_script_result(json!([
            "https://www.linkedin.com/in/alice?miniProfile=2",
            "https://www.linkedin.com/in/dave",
        ]));
        browser.push_script_result(json!([]));

        browser.set_visible(search::NEXT_BUTTON, true);

        let discovery = LinkDiscovery::new(&browser, &config).unwrap();
        let mut links = discovery.from_search("rust", 2).await;
        links.sort();

        assert_eq!(
            links,
            vec![
                "https://www.linkedin.com/in/alice",
                "https://www.linkedin.com/in/bob",
                "https://www.linkedin.com/in/dave",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_stops_when_next_control_missing() {
        let browser = FakeBrowser::new();
        browser.push_script_result(json!(["https://www.linkedin.com/in/alice"]));
        browser.push_script_result(json!([]));
        // NEXT_BUTTON stays invisible: only one page is visited.

        let discovery = LinkDiscovery::new(&browser, &test_config()).unwrap();
        let links = discovery.from_search("rust", 3).await;
        assert_eq!(links, vec!["https://www.linkedin.com/in/alice"]);
        assert!(
            !browser
                .calls()
                .contains(&format!("click:{}", search::NEXT_BUTTON))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connections_dedup_and_height_fixpoint_stop() {
        let browser = FakeBrowser::new();

        // First sweep yields two cards; the second repeats alice with a
        // query string and adds one card without a URL.
        browser.push_script_result(json!([
            {"name": "Alice", "occupation": "Engineer",
             "url": "https://www.linkedin.com/in/alice/"},
            {"name": "Bob", "occupation": "Designer",
             "url": "https://www.linkedin.com/in/bob"},
        ]));
        browser.push_script_result(json!([
            {"name": "Alice", "occupation": "Engineer",
             "url": "https://www.linkedin.com/in/alice?dup=1"},
            {"name": null, "occupation": null, "url": null},
        ]));

        // Height grows once, then stays flat: loop ends on the fixpoint.
        browser.push_height(1000);
        browser.push_height(2000);
        browser.push_height(2000);
        browser.push_height(2000);

        let discovery = LinkDiscovery::new(&browser, &test_config()).unwrap();
        let connections = discovery.from_connections(None).await;

        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].name, "Alice");
        assert_eq!(connections[0].url, "https://www.linkedin.com/in/alice");
        assert_eq!(connections[1].name, "Bob");
    }

    #[tokio::test(start_paused = true)]
    async fn test_connections_respects_result_cap() {
        let browser = FakeBrowser::new();
        browser.push_script_result(json!([
            {"name": "Alice", "occupation": "Engineer",
             "url": "https://www.linkedin.com/in/alice"},
            {"name": "Bob", "occupation": "Designer",
             "url": "https://www.linkedin.com/in/bob"},
            {"name": "Carol", "occupation": "Manager",
             "url": "https://www.linkedin.com/in/carol"},
        ]));

        let discovery = LinkDiscovery::new(&browser, &test_config()).unwrap();
        let connections = discovery.from_connections(Some(2)).await;

        assert_eq!(connections.len(), 2);
        assert_eq!(connections[1].name, "Bob");
    }
}
