use thiserror::Error;

/// Errors raised by the browser capability layer.
///
/// Expected, recoverable conditions (an element missing from a fragment, an
/// authentication rejection) are not represented here - they degrade to empty
/// values or booleans in the callers. These variants are infrastructure faults.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser session has already been closed.
    #[error("browser session is not available")]
    NotInitialized,

    /// Could not establish a WebDriver session at all.
    #[error("failed to connect to WebDriver at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: fantoccini::error::NewSessionError,
    },

    /// A wait for an element or an operation deadline expired.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Navigation to a URL failed.
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: fantoccini::error::CmdError,
    },

    /// Any other WebDriver command failure.
    #[error(transparent)]
    WebDriver(#[from] fantoccini::error::CmdError),
}

/// Internal faults of the rate limiter's delay computation.
///
/// These are caught inside `RateLimiter::acquire` and replaced by the maximum
/// configured break delay - a limiter fault must never remove rate limiting.
#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("invalid delay bounds: {0}")]
    Bounds(String),
}

/// Top-level errors returned by the harvesting pipeline.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// The credentials were rejected by the login flow.
    #[error("authentication was rejected for the supplied credentials")]
    Authentication,

    #[error("no credentials were supplied")]
    MissingCredentials,

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
