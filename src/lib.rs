// Re-export modules
pub mod browser;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod extract;
pub mod limiter;
pub mod models;
pub mod scraper;
pub mod selectors;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use errors::HarvestError;
pub use models::{ConnectionLink, EducationEntry, ExperienceEntry, ProfileRecord};

use browser::{Browser, WebDriverBrowser};
use config::HarvestConfig;
use discovery::LinkDiscovery;
use extract::ProfileExtractor;
use scraper::ProfileScraper;
use session::Session;
use tokio::sync::mpsc;

/// Where the profile URLs to harvest come from
#[derive(Debug, Clone)]
pub enum Source {
    /// An explicit list of profile URLs
    Profiles(Vec<String>),
    /// People search results for a keyword
    Search { keyword: String, pages: usize },
    /// The logged-in account's own connections
    Connections { max: Option<usize> },
}

/// Login credentials for the account the harvest runs under.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Main builder for harvesting profile records from a source of URLs
pub struct Harvester {
    source: Source,
    config: HarvestConfig,
    credentials: Option<Credentials>,
}

impl Harvester {
    /// Create a new Harvester for the given source
    pub fn new(source: Source) -> Self {
        Self {
            source,
            config: HarvestConfig::default(),
            credentials: None,
        }
    }

    /// Replace the configuration wholesale
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, HarvestError> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(self.with_config(config))
    }

    /// Set the credentials used when no persisted session is valid
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Start the harvest and get a receiver for profile records.
    ///
    /// Connecting and authenticating happen before this returns, so callers
    /// see connection and credential failures directly. The per-profile work
    /// then runs in the background; capture failures for individual profiles
    /// are logged and skipped, and the channel closes when the worklist is
    /// exhausted.
    pub async fn run(self) -> Result<mpsc::Receiver<ProfileRecord>, HarvestError> {
        let credentials = self
            .credentials
            .ok_or(HarvestError::MissingCredentials)?;
        let config = effective_config(self.config);
        let source = self.source;

        let mut session = open_session(&config, &credentials).await?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            {
                let browser = session.browser();
                let urls = resolve_worklist(browser, &config, &source).await;
                ::log::info!("Harvesting {} profiles", urls.len());

                let scraper = ProfileScraper::new(browser, &config);
                let extractor = ProfileExtractor::new(browser, &config);

                for url in urls {
                    let panels = match scraper.scrape_profile(&url).await {
                        Ok(panels) => panels,
                        Err(e) => {
                            ::log::error!("Failed to scrape {}: {}", url, e);
                            continue;
                        }
                    };
                    let record = extractor.extract(&panels).await;
                    if tx.send(record).await.is_err() {
                        ::log::info!("Receiver dropped, stopping harvest");
                        break;
                    }
                }
            }

            if let Err(e) = session.close().await {
                ::log::warn!("Failed to close session cleanly: {}", e);
            }
        });

        Ok(rx)
    }

    /// Resolve the source to profile URLs without harvesting them.
    pub async fn discover(self) -> Result<Vec<String>, HarvestError> {
        let credentials = self
            .credentials
            .ok_or(HarvestError::MissingCredentials)?;
        let config = effective_config(self.config);

        let mut session = open_session(&config, &credentials).await?;
        let urls = resolve_worklist(session.browser(), &config, &self.source).await;

        if let Err(e) = session.close().await {
            ::log::warn!("Failed to close session cleanly: {}", e);
        }
        Ok(urls)
    }
}

/// Override the WebDriver URL with an environment variable if provided.
fn effective_config(mut config: HarvestConfig) -> HarvestConfig {
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
        if !webdriver_url.is_empty() {
            config.webdriver_url = webdriver_url;
        }
    }
    config
}

/// Connect, restore any persisted session and authenticate.
async fn open_session(
    config: &HarvestConfig,
    credentials: &Credentials,
) -> Result<Session<WebDriverBrowser>, HarvestError> {
    let browser = WebDriverBrowser::connect(config).await?;
    let mut session = Session::new(browser, config);
    session.initialize().await?;

    let authenticated = session
        .login(&credentials.username, &credentials.password)
        .await?;
    if !authenticated {
        if let Err(e) = session.close().await {
            ::log::warn!("Failed to close session after rejected login: {}", e);
        }
        return Err(HarvestError::Authentication);
    }
    Ok(session)
}

async fn resolve_worklist<B: Browser>(
    browser: &B,
    config: &HarvestConfig,
    source: &Source,
) -> Vec<String> {
    match source {
        Source::Profiles(urls) => urls
            .iter()
            .map(|url| discovery::canonicalize_url(url))
            .collect(),
        Source::Search { keyword, pages } => match LinkDiscovery::new(browser, config) {
            Ok(discovery) => discovery.from_search(keyword, *pages).await,
            Err(e) => {
                ::log::error!("Invalid profile link pattern: {}", e);
                Vec::new()
            }
        },
        Source::Connections { max } => match LinkDiscovery::new(browser, config) {
            Ok(discovery) => discovery
                .from_connections(*max)
                .await
                .into_iter()
                .map(|connection| connection.url)
                .collect(),
            Err(e) => {
                ::log::error!("Invalid profile link pattern: {}", e);
                Vec::new()
            }
        },
    }
}
