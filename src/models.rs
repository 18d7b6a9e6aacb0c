use serde::{Deserialize, Serialize};

/// Raw HTML panels captured from a single profile page.
///
/// Captured once by the profile scraper and treated as immutable input to the
/// extractor. Panels that could not be captured are empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProfilePanels {
    /// Profile URL the panels were captured from
    pub url: String,

    /// Intro panel containing name, title and location
    pub intro_panel: String,

    /// About section markup
    pub about_panel: String,

    /// Experience list markup
    pub experience_panel: String,

    /// Education list markup
    pub education_panel: String,
}

/// A structured profile record derived from a [`RawProfilePanels`] instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Profile URL
    pub url: String,

    /// Full display name
    pub name: String,

    /// Headline / current title
    pub title: String,

    /// Location line
    pub location: String,

    /// About section text
    pub about: String,

    /// Work experience entries, in page order
    pub experience: Vec<ExperienceEntry>,

    /// Education entries, in page order
    pub education: Vec<EducationEntry>,
}

/// One position in the experience list.
///
/// Every field is optional: absence means the positional heuristics could not
/// locate that field in the fragment for that entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub position_title: Option<String>,
    pub institution_name: Option<String>,
    /// The raw duration string as rendered, e.g. "Jan 2020 - Present · 4 yrs"
    pub duration: Option<String>,
    /// Normalized YYYY-MM-DD start date
    pub from_date: Option<String>,
    /// Normalized YYYY-MM-DD end date; None while the position is current
    pub to_date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// One entry in the education list. Same optionality rules as experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution_name: Option<String>,
    pub degree: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub description: Option<String>,
    /// Link to the institution's own page, when the logo carries one
    pub institution_url: Option<String>,
}

/// A profile link discovered from search results or the connections view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionLink {
    pub name: String,
    pub occupation: String,
    /// Canonical profile URL (scheme+host+path, no query/fragment)
    pub url: String,
}

/// Contract consumed from the embedding collaborator.
///
/// Implementations must return `None` for empty text. The extractor's output
/// is plain serde records, so downstream consumers can pair any serializer
/// with any embedder.
pub trait Embedder {
    fn vectorize(&self, text: &str) -> Option<Vec<f32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    impl Embedder for LengthEmbedder {
        fn vectorize(&self, text: &str) -> Option<Vec<f32>> {
            if text.is_empty() {
                return None;
            }
            Some(vec![text.len() as f32])
        }
    }

    #[test]
    fn test_embedder_contract_rejects_empty_text() {
        let embedder = LengthEmbedder;
        assert_eq!(embedder.vectorize(""), None);
        assert_eq!(embedder.vectorize("about"), Some(vec![5.0]));
    }

    #[test]
    fn test_profile_record_serializes_to_stable_shape() {
        let record = ProfileRecord {
            url: "https://www.linkedin.com/in/alice".to_string(),
            name: "Alice Example".to_string(),
            ..ProfileRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["url"], "https://www.linkedin.com/in/alice");
        assert_eq!(json["name"], "Alice Example");
        assert!(json["experience"].as_array().unwrap().is_empty());
    }
}
