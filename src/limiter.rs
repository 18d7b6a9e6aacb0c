use crate::config::RateLimitConfig;
use crate::errors::LimiterError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const WINDOW_SECS: i64 = 24 * 60 * 60;

/// Durable limiter state, overwritten in full after every `acquire()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LimiterState {
    /// Unix-epoch seconds of every request inside the trailing window
    requests: Vec<i64>,

    /// Time of the most recent request
    #[serde(default)]
    last_burst_time: i64,

    /// Requests issued in the current burst
    #[serde(default)]
    current_burst: u32,

    /// Target size of the current burst
    #[serde(default)]
    burst_size: u32,
}

/// Burst-style rate limiter that clusters requests and takes longer breaks
/// in between, mimicking human browsing patterns.
///
/// State survives process restarts through a JSON file; timestamps outside
/// the trailing 24-hour window are discarded on load and on every call.
pub struct RateLimiter {
    config: RateLimitConfig,
    state: LimiterState,
    state_path: PathBuf,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, state_path: PathBuf) -> Self {
        if let Some(parent) = state_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                ::log::error!("Failed to create rate limiter state dir: {}", e);
            }
        }

        let mut state = Self::load_state(&state_path);
        if state.burst_size == 0 {
            state.burst_size = draw_burst_size(&config);
        }

        ::log::info!(
            "Rate limiter: {} requests/day, bursts of {}-{}, state file {:?}",
            config.max_requests_per_day,
            config.burst_size_min,
            config.burst_size_max,
            state_path
        );

        Self {
            config,
            state,
            state_path,
        }
    }

    /// Wait the appropriate time before allowing the next request.
    ///
    /// Must be awaited before every outbound page request. Internal faults in
    /// the delay computation are logged and replaced by the maximum
    /// configured break delay - they never remove rate limiting.
    pub async fn acquire(&mut self) {
        let wait = match self.plan(unix_now()) {
            Ok(wait) => wait,
            Err(e) => {
                ::log::error!("Rate limiter fault: {}. Using maximum break delay.", e);
                Duration::from_secs_f64(self.config.break_delay_max_secs.max(0.0))
            }
        };

        if self.state.current_burst == 0 {
            ::log::info!(
                "Starting new burst of {} requests after {:.1}s wait",
                self.state.burst_size,
                wait.as_secs_f64()
            );
        } else {
            ::log::debug!(
                "Burst request {}/{}, waiting {:.1}s",
                self.state.current_burst + 1,
                self.state.burst_size,
                wait.as_secs_f64()
            );
        }

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        self.commit(unix_now());
        self.save_state();
    }

    /// Compute the full wait before the next request may be issued: the
    /// quota wait (if the daily maximum is reached) plus the burst delay.
    /// Also resets the burst counter and redraws the target when the current
    /// burst is complete.
    fn plan(&mut self, now: i64) -> Result<Duration, LimiterError> {
        self.trim(now);

        let mut wait = 0.0;
        if self.requests_in_window(now) >= self.config.max_requests_per_day {
            if let Some(&oldest) = self.state.requests.iter().min() {
                let quota_wait = (oldest + WINDOW_SECS - now).max(0) as f64;
                if quota_wait > 0.0 {
                    ::log::warn!(
                        "Daily limit reached. Waiting {:.1} hours",
                        quota_wait / 3600.0
                    );
                }
                wait += quota_wait;
            }
        }

        wait += self.next_delay()?;
        Ok(Duration::from_secs_f64(wait))
    }

    /// Record a request issued at `now`.
    fn commit(&mut self, now: i64) {
        self.state.current_burst += 1;
        self.state.last_burst_time = now;
        self.state.requests.push(now);
    }

    /// Drop timestamps that have left the trailing window.
    fn trim(&mut self, now: i64) {
        self.state.requests.retain(|&ts| now - ts < WINDOW_SECS);
    }

    /// Delay according to the burst pattern: a fresh burst gets a jittered
    /// break, requests inside a burst get the short intra-burst delay.
    fn next_delay(&mut self) -> Result<f64, LimiterError> {
        let mut rng = rand::thread_rng();

        if self.state.requests.is_empty() || self.state.current_burst >= self.state.burst_size {
            self.state.current_burst = 0;
            self.state.burst_size = draw_burst_size(&self.config);

            let base = sample(
                &mut rng,
                self.config.break_delay_min_secs,
                self.config.break_delay_max_secs,
            )?;
            let jitter = rng.gen_range(0.8..1.2);
            return Ok(base * jitter);
        }

        sample(
            &mut rng,
            self.config.burst_delay_min_secs,
            self.config.burst_delay_max_secs,
        )
    }

    /// Count of requests inside the window ending at `now`.
    fn requests_in_window(&self, now: i64) -> usize {
        self.state
            .requests
            .iter()
            .filter(|&&ts| now - ts < WINDOW_SECS)
            .count()
    }

    fn load_state(path: &PathBuf) -> LimiterState {
        if !path.exists() {
            return LimiterState::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<LimiterState>(&contents) {
                Ok(mut state) => {
                    let now = unix_now();
                    state.requests.retain(|&ts| now - ts < WINDOW_SECS);
                    ::log::info!("Loaded {} previous requests", state.requests.len());
                    state
                }
                Err(e) => {
                    ::log::error!("Failed to parse rate limiter state: {}", e);
                    LimiterState::default()
                }
            },
            Err(e) => {
                ::log::error!("Failed to load rate limiter state: {}", e);
                LimiterState::default()
            }
        }
    }

    fn save_state(&self) {
        match serde_json::to_string(&self.state) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.state_path, json) {
                    ::log::error!("Failed to save rate limiter state: {}", e);
                }
            }
            Err(e) => ::log::error!("Failed to serialize rate limiter state: {}", e),
        }
    }
}

/// Uniform sample from [min, max), tolerating a collapsed range.
fn sample(rng: &mut impl Rng, min: f64, max: f64) -> Result<f64, LimiterError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(LimiterError::Bounds(format!("{}..{}", min, max)));
    }
    if max <= min {
        return Ok(min);
    }
    Ok(rng.gen_range(min..max))
}

fn draw_burst_size(config: &RateLimitConfig) -> u32 {
    let min = config.burst_size_min.max(1);
    let max = config.burst_size_max.max(min);
    rand::thread_rng().gen_range(min..=max)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
