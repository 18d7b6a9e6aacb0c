use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the harvesting pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Base URL of the site being scraped
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Run the browser headless. Defaults to false so that manual
    /// checkpoints during login remain visible to the operator.
    #[serde(default)]
    pub headless: bool,

    /// Directory holding the rate-limiter and browser state files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Default per-element/navigation wait in seconds
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Pause after scrolls and expansions to let lazy content settle
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Traffic shaping policy
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Burst/break traffic shaping policy.
///
/// The quota and burst bookkeeping are fixed behavior; the delay magnitudes
/// are policy. All delay defaults are zero, which keeps the bookkeeping
/// active while disabling the waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in any rolling 24-hour window
    #[serde(default = "default_max_requests")]
    pub max_requests_per_day: usize,

    /// Inclusive range the burst target size is drawn from
    #[serde(default = "default_burst_size_min")]
    pub burst_size_min: u32,
    #[serde(default = "default_burst_size_max")]
    pub burst_size_max: u32,

    /// Delay between requests inside a burst, in seconds
    #[serde(default)]
    pub burst_delay_min_secs: f64,
    #[serde(default)]
    pub burst_delay_max_secs: f64,

    /// Break between bursts, in seconds (±20% jitter is applied on top)
    #[serde(default)]
    pub break_delay_min_secs: f64,
    #[serde(default)]
    pub break_delay_max_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_day: default_max_requests(),
            burst_size_min: default_burst_size_min(),
            burst_size_max: default_burst_size_max(),
            burst_delay_min_secs: 0.0,
            burst_delay_max_secs: 0.0,
            break_delay_min_secs: 0.0,
            break_delay_max_secs: 0.0,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            base_url: default_base_url(),
            headless: false,
            state_dir: default_state_dir(),
            default_timeout_secs: default_timeout_secs(),
            settle_secs: default_settle_secs(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Path of the durable rate-limiter state file
    pub fn rate_limiter_state_path(&self) -> PathBuf {
        self.state_dir.join("rate_limiter_state.json")
    }

    /// Path of the durable browser storage-state file
    pub fn storage_state_path(&self) -> PathBuf {
        self.state_dir.join("browser_state.json")
    }

    pub fn default_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.default_timeout_secs)
    }

    pub fn settle(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.settle_secs)
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_base_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_settle_secs() -> u64 {
    2
}

fn default_max_requests() -> usize {
    200
}

fn default_burst_size_min() -> u32 {
    3
}

fn default_burst_size_max() -> u32 {
    5
}
