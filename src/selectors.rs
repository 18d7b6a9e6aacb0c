//! Fixed selectors for the LinkedIn page shapes this crate understands.
//!
//! Selectors starting with `/` are XPath, everything else is CSS; the browser
//! layer dispatches on that prefix.

/// Login page and session validation
pub mod login {
    pub const USERNAME_INPUT: &str = "#username";
    pub const PASSWORD_INPUT: &str = "#password";
    pub const LOGIN_BUTTON: &str = "button[type='submit']";

    /// Navigation bar, only rendered when authenticated
    pub const LOGGED_IN_INDICATOR: &str = ".global-nav";
}

/// Profile pages
pub mod profile {
    /// Intro panel wrapping name, title and location
    pub const INTRO_PANEL: &str = "//*[@class='mt2 relative']";
    pub const NAME: &str = "h1";
    pub const TITLE: &str = "[data-generated-suggestion-target]";
    pub const LOCATION: &str = "//*[@class='text-body-small inline t-black--light break-words']";

    pub const ABOUT_SECTION: &str = "//*[@id='about'][1]/..";
    pub const ABOUT_TEXT: &str = ".display-flex span[aria-hidden='true']";

    /// Shared list container for the experience/education detail views
    pub const SECTION_LIST: &str = ".pvs-list__container";
    pub const LIST_ITEM: &str = "ul > .pvs-list__paged-list-item";
    pub const VISIBLE_SPAN: &str = "span[aria-hidden=\"true\"]";
}

/// Search results and the connections view
pub mod search {
    pub const SEARCH_RESULTS: &str = "div.search-marvel-srp";
    pub const PROFILE_LINKS: &str = "div.search-marvel-srp > div:nth-of-type(1) a[data-test-app-aware-link], \
         div.search-marvel-srp > div:nth-of-type(2) a[data-test-app-aware-link]";
    pub const INSIGHTS_LINKS: &str = "div.entity-result__insights.t-12 a";
    pub const NEXT_BUTTON: &str = "button[aria-label='Next']";

    pub const CONNECTIONS_CONTAINER: &str = ".mn-connections";
    pub const CONNECTION_CARD: &str = ".mn-connection-card";
    pub const CONNECTION_NAME: &str = ".mn-connection-card__name";
    pub const CONNECTION_OCCUPATION: &str = ".mn-connection-card__occupation";
    pub const CONNECTION_LINK: &str = ".mn-connection-card__link";

    /// Path shape of a profile URL
    pub const PROFILE_PATH_PATTERN: &str = r"linkedin\.com/in/[^/]+";

    /// Internal search-shortcut links that look like profiles but are not
    pub const SEARCH_SHORTCUT_MARKER: &str = "SHARED_CONNECTIONS_CANNED_SEARCH";
}
