use chrono::format::{Parsed, StrftimeItems, parse};

/// Normalizes the human-readable date strings that appear in duration and
/// date-range lines into ISO `YYYY-MM-DD` form.
///
/// Formats are tried in order; partial dates ("2020", "Jan 2020") are
/// completed with month and day 1. Open-ended markers ("Present") and
/// unrecognized strings normalize to `None`.
pub struct DateNormalizer {
    formats: Vec<String>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            formats: [
                "%b %Y",
                "%B %Y",
                "%Y",
                "%b %d, %Y",
                "%B %d, %Y",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        }
    }
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra strftime format, tried after the defaults.
    pub fn add_format(&mut self, format: &str) {
        if !self.formats.iter().any(|f| f == format) {
            self.formats.push(format.to_string());
        }
    }

    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("present") {
            return None;
        }
        for format in &self.formats {
            let mut parsed = Parsed::new();
            if parse(&mut parsed, trimmed, StrftimeItems::new(format)).is_err() {
                continue;
            }
            // Complete partial dates; setting a field that was already
            // parsed fails, which is exactly the no-op we want.
            let _ = parsed.set_month(1);
            let _ = parsed.set_day(1);
            if let Ok(date) = parsed.to_naive_date() {
                return Some(date.format("%Y-%m-%d").to_string());
            }
        }
        None
    }
}
