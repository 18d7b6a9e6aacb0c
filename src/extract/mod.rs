//! Structural extraction of profile records from captured panels.
//!
//! The extractor never touches the live site: it works entirely on the HTML
//! panels the scraper captured, re-rendered into scratch pages when a field
//! needs real layout (visibility, expandable text), or parsed statically
//! when position alone is enough.

pub mod dates;
pub mod rules;

pub use dates::DateNormalizer;

use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::models::{EducationEntry, ExperienceEntry, ProfileRecord, RawProfilePanels};
use crate::selectors::profile;
use rules::{classify_experience_spans, collect_span_rows, split_date_range};
use serde::Deserialize;
use std::time::Duration;

/// Expands every collapsed "see more" toggle and returns how many were
/// clicked. Multi-entry panels collapse each entry separately.
const SEE_MORE_SCRIPT: &str = "\
    const toggles = Array.from(document.querySelectorAll('button, span'))\
        .filter((el) => el.textContent.includes('see more'));\
    toggles.forEach((el) => el.click());\
    return toggles.length;";

/// Walks education entities structurally: logo column, then the summary
/// cells in order, then the optional description list below them.
const EDUCATION_ROWS_SCRIPT: &str = "\
    return Array.from(document.querySelectorAll(\
        \"div[data-view-name='profile-component-entity']\")).map((entity) => {\
        const logo = entity.children[0];\
        const details = entity.children[1];\
        const summary = details && details.children[0]\
            ? details.children[0].firstElementChild : null;\
        const cells = summary ? Array.from(summary.children) : [];\
        const texts = cells.map((cell) => {\
            const span = cell.querySelector(\"span[aria-hidden='true']\");\
            return span ? span.innerText.trim() : null;\
        });\
        const extra = details && details.children[1]\
            ? details.children[1].querySelector(\"span[aria-hidden='true']\") : null;\
        return {\
            institution_url: logo && logo.firstElementChild\
                ? (logo.firstElementChild.href ?? null) : null,\
            institution_name: texts[0] ?? null,\
            degree: texts[1] ?? null,\
            date_range: texts[2] ?? null,\
            description: extra ? extra.innerText.trim() : null,\
        };\
    });";

/// Education row as returned by script evaluation, before date splitting.
#[derive(Debug, Deserialize)]
struct EducationRow {
    institution_url: Option<String>,
    institution_name: Option<String>,
    degree: Option<String>,
    date_range: Option<String>,
    description: Option<String>,
}

/// Turns [`RawProfilePanels`] into a [`ProfileRecord`].
///
/// Every section degrades independently: a panel that fails to yield a
/// field leaves that field empty or absent instead of failing the record.
pub struct ProfileExtractor<'a, B: Browser> {
    browser: &'a B,
    dates: DateNormalizer,
    timeout: Duration,
    settle: Duration,
}

impl<'a, B: Browser> ProfileExtractor<'a, B> {
    pub fn new(browser: &'a B, config: &HarvestConfig) -> Self {
        Self {
            browser,
            dates: DateNormalizer::new(),
            // Scratch pages are local; a missing field resolves quickly.
            timeout: Duration::from_secs(5),
            settle: config.settle(),
        }
    }

    pub async fn extract(&self, panels: &RawProfilePanels) -> ProfileRecord {
        let (name, title, location) = self.extract_intro(&panels.intro_panel).await;
        let about = self.extract_about(&panels.about_panel).await;
        let experience = extract_experience(&panels.experience_panel, &self.dates);
        let education = self.extract_education(&panels.education_panel).await;

        ProfileRecord {
            url: panels.url.clone(),
            name,
            title,
            location,
            about,
            experience,
            education,
        }
    }

    async fn extract_intro(&self, html: &str) -> (String, String, String) {
        if html.trim().is_empty() {
            return Default::default();
        }
        if !self.open_scratch_page(html).await {
            return Default::default();
        }

        let name = self.text_or_empty(profile::NAME).await;
        let title = self.text_or_empty(profile::TITLE).await;
        let location = self.text_or_empty(profile::LOCATION).await;

        self.close_scratch_page().await;
        (name, title, location)
    }

    async fn extract_about(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }
        if !self.open_scratch_page(html).await {
            return String::new();
        }

        // The about text is usually collapsed behind a toggle.
        match self.browser.execute(SEE_MORE_SCRIPT).await {
            Ok(value) if value.as_u64().unwrap_or(0) > 0 => {
                tokio::time::sleep(self.settle).await
            }
            Ok(_) => {}
            Err(e) => ::log::debug!("See-more expansion failed: {}", e),
        }

        let about = self.text_or_empty(profile::ABOUT_TEXT).await;
        self.close_scratch_page().await;
        about
    }

    async fn extract_education(&self, html: &str) -> Vec<EducationEntry> {
        if html.trim().is_empty() {
            return Vec::new();
        }
        if !self.open_scratch_page(html).await {
            return Vec::new();
        }

        if let Err(e) = self.browser.execute(SEE_MORE_SCRIPT).await {
            ::log::debug!("See-more expansion failed: {}", e);
        }
        tokio::time::sleep(self.settle).await;

        let rows: Vec<EducationRow> = match self.browser.execute(EDUCATION_ROWS_SCRIPT).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                ::log::error!("Education row script failed: {}", e);
                Vec::new()
            }
        };

        self.close_scratch_page().await;
        rows.into_iter().map(|row| self.education_entry(row)).collect()
    }

    fn education_entry(&self, row: EducationRow) -> EducationEntry {
        let (from_date, to_date) = match row.date_range.as_deref() {
            Some(range) => {
                let (from, to) = split_date_range(range);
                (
                    from.and_then(|raw| self.dates.normalize(raw)),
                    to.and_then(|raw| self.dates.normalize(raw)),
                )
            }
            None => (None, None),
        };
        EducationEntry {
            institution_name: non_empty(row.institution_name),
            degree: non_empty(row.degree),
            from_date,
            to_date,
            description: non_empty(row.description),
            institution_url: non_empty(row.institution_url),
        }
    }

    async fn open_scratch_page(&self, html: &str) -> bool {
        if let Err(e) = self.browser.new_page().await {
            ::log::error!("Failed to open scratch page: {}", e);
            return false;
        }
        if let Err(e) = self.browser.set_content(html).await {
            ::log::error!("Failed to render panel into scratch page: {}", e);
            self.close_scratch_page().await;
            return false;
        }
        true
    }

    async fn close_scratch_page(&self) {
        if let Err(e) = self.browser.close_page().await {
            ::log::warn!("Failed to close scratch page: {}", e);
        }
    }

    async fn text_or_empty(&self, selector: &str) -> String {
        match self.browser.element_text(selector, Some(self.timeout)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                ::log::debug!("Field {} not found: {}", selector, e);
                String::new()
            }
        }
    }
}

/// Blank script results carry no information; treat them as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Experience needs no layout: span position within each list item is
/// enough, so the panel is parsed statically.
fn extract_experience(html: &str, dates: &DateNormalizer) -> Vec<ExperienceEntry> {
    collect_span_rows(html)
        .iter()
        .map(|spans| classify_experience_spans(spans, dates))
        .filter(|entry| *entry != ExperienceEntry::default())
        .collect()
}
