//! Positional span heuristics for the experience list.
//!
//! LinkedIn renders every field of an experience entry as an anonymous
//! `span[aria-hidden="true"]`; the only stable signal is the position of a
//! span within its entry plus its textual shape. Each entry's spans run
//! through an ordered rule table and the first matching rule claims the span.

use crate::extract::dates::DateNormalizer;
use crate::models::ExperienceEntry;
use crate::selectors::profile;
use scraper::{Html, Selector};

/// One classification rule: a shape predicate over (index, row length, text)
/// and the field assignment it performs.
struct SpanRule {
    matches: fn(usize, usize, &str) -> bool,
    assign: fn(&mut ExperienceEntry, &str, &DateNormalizer),
}

const EXPERIENCE_RULES: &[SpanRule] = &[
    SpanRule {
        matches: is_position_title,
        assign: assign_position_title,
    },
    SpanRule {
        matches: is_institution_name,
        assign: assign_institution_name,
    },
    SpanRule {
        matches: is_duration,
        assign: assign_duration,
    },
    SpanRule {
        matches: is_location,
        assign: assign_location,
    },
    SpanRule {
        matches: is_description,
        assign: assign_description,
    },
];

fn is_position_title(idx: usize, _len: usize, text: &str) -> bool {
    idx == 0 && !text.is_empty()
}

fn assign_position_title(entry: &mut ExperienceEntry, text: &str, _dates: &DateNormalizer) {
    entry.position_title = Some(text.to_string());
}

fn is_institution_name(idx: usize, _len: usize, text: &str) -> bool {
    idx == 1 && !text.is_empty()
}

fn assign_institution_name(entry: &mut ExperienceEntry, text: &str, _dates: &DateNormalizer) {
    entry.institution_name = Some(text.to_string());
}

/// Date ranges look like "Jan 2020 - Present · 4 yrs": a " - " separator
/// plus either the open-ended marker or a months suffix.
fn is_duration(_idx: usize, _len: usize, text: &str) -> bool {
    text.contains(" - ") && (text.contains("Present") || text.contains("mos"))
}

fn assign_duration(entry: &mut ExperienceEntry, text: &str, dates: &DateNormalizer) {
    entry.duration = Some(text.to_string());
    // The range sits before the first "·"; the elapsed-time suffix after it
    // is presentation only.
    let range = text.split('·').next().unwrap_or(text).trim();
    let (from, to) = match range.split_once(" - ") {
        Some((from, to)) => (from.trim(), to.trim()),
        None => (range, ""),
    };
    entry.from_date = dates.normalize(from);
    entry.to_date = dates.normalize(to);
}

/// Location lines are "·"-separated without a date range, e.g.
/// "San Francisco, CA · Remote".
fn is_location(_idx: usize, _len: usize, text: &str) -> bool {
    text.contains('·')
}

fn assign_location(entry: &mut ExperienceEntry, text: &str, _dates: &DateNormalizer) {
    entry.location = text.split('·').next().map(|l| l.trim().to_string());
}

fn is_description(idx: usize, len: usize, text: &str) -> bool {
    len > 1 && idx == len - 1 && !text.is_empty()
}

fn assign_description(entry: &mut ExperienceEntry, text: &str, _dates: &DateNormalizer) {
    entry.description = Some(text.to_string());
}

/// Collect the visible span texts of every list entry in an experience
/// panel, one row per entry, in document order.
pub fn collect_span_rows(html: &str) -> Vec<Vec<String>> {
    let doc = Html::parse_fragment(html);
    let item_selector = Selector::parse(profile::LIST_ITEM).unwrap();
    let span_selector = Selector::parse(profile::VISIBLE_SPAN).unwrap();

    doc.select(&item_selector)
        .map(|item| {
            item.select(&span_selector)
                .map(|span| span.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect()
}

/// Classify one row of spans into an entry. Each span is claimed by the
/// first rule whose shape predicate matches; unclaimed spans are dropped.
pub fn classify_experience_spans(spans: &[String], dates: &DateNormalizer) -> ExperienceEntry {
    let mut entry = ExperienceEntry::default();
    for (idx, text) in spans.iter().enumerate() {
        for rule in EXPERIENCE_RULES {
            if (rule.matches)(idx, spans.len(), text) {
                (rule.assign)(&mut entry, text, dates);
                break;
            }
        }
    }
    entry
}

/// Split an education date-range line into raw from/to pieces.
///
/// Short lines ("2016 - 2020") yield their first and last tokens; longer
/// lines need an explicit "-" token to anchor the split, and yield the
/// tokens either side of it. Anything else degrades to nothing.
pub fn split_date_range(text: &str) -> (Option<&str>, Option<&str>) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return (None, None);
    }
    if tokens.len() > 3 {
        if let Some(i) = tokens.iter().position(|t| *t == "-") {
            if i > 0 {
                return (Some(tokens[i - 1]), Some(tokens[tokens.len() - 1]));
            }
        }
        return (None, None);
    }
    (Some(tokens[0]), Some(tokens[tokens.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(spans: &[&str]) -> ExperienceEntry {
        let owned: Vec<String> = spans.iter().map(|s| s.to_string()).collect();
        classify_experience_spans(&owned, &DateNormalizer::new())
    }

    #[test]
    fn test_classifies_full_entry() {
        let entry = classify(&[
            "Software Engineer",
            "Acme Corp",
            "Jan 2020 - Present · 4 yrs",
            "San Francisco, CA · Remote",
            "Built things.",
        ]);

        assert_eq!(entry.position_title.as_deref(), Some("Software Engineer"));
        assert_eq!(entry.institution_name.as_deref(), Some("Acme Corp"));
        assert_eq!(
            entry.duration.as_deref(),
            Some("Jan 2020 - Present · 4 yrs")
        );
        assert_eq!(entry.from_date.as_deref(), Some("2020-01-01"));
        assert_eq!(entry.to_date, None);
        assert_eq!(entry.location.as_deref(), Some("San Francisco, CA"));
        assert_eq!(entry.description.as_deref(), Some("Built things."));
    }

    #[test]
    fn test_closed_range_normalizes_both_ends() {
        let entry = classify(&[
            "Analyst",
            "Initech",
            "Feb 2018 - Nov 2019 · 1 yr 10 mos",
        ]);
        assert_eq!(entry.from_date.as_deref(), Some("2018-02-01"));
        assert_eq!(entry.to_date.as_deref(), Some("2019-11-01"));
    }

    #[test]
    fn test_whole_year_range_is_not_claimed_as_duration() {
        // Ranges whose elapsed suffix carries no months marker fall through
        // the duration rule and are claimed by the "·" rule instead.
        let entry = classify(&[
            "Analyst",
            "Initech",
            "Jan 2020 - Dec 2021 · 2 yrs",
        ]);
        assert_eq!(entry.duration, None);
        assert_eq!(entry.from_date, None);
        assert_eq!(entry.location.as_deref(), Some("Jan 2020 - Dec 2021"));
    }

    #[test]
    fn test_empty_row_yields_empty_entry() {
        assert_eq!(classify(&[]), ExperienceEntry::default());
    }

    #[test]
    fn test_malformed_spans_degrade_to_absent_fields() {
        let entry = classify(&["", "", "not a date", "no separators here"]);
        assert_eq!(entry.position_title, None);
        assert_eq!(entry.institution_name, None);
        assert_eq!(entry.duration, None);
        assert_eq!(entry.location, None);
        // The trailing span is still claimed as a description.
        assert_eq!(entry.description.as_deref(), Some("no separators here"));
    }

    #[test]
    fn test_collect_span_rows_walks_list_items() {
        let html = r#"
            <ul>
              <li class="pvs-list__paged-list-item">
                <span aria-hidden="true">Software Engineer</span>
                <span aria-hidden="true">Acme Corp</span>
              </li>
              <li class="pvs-list__paged-list-item">
                <span aria-hidden="true">Analyst</span>
              </li>
            </ul>
        "#;
        let rows = collect_span_rows(html);
        assert_eq!(
            rows,
            vec![
                vec!["Software Engineer".to_string(), "Acme Corp".to_string()],
                vec!["Analyst".to_string()],
            ]
        );
    }

    #[test]
    fn test_collect_span_rows_on_empty_markup() {
        assert!(collect_span_rows("").is_empty());
        assert!(collect_span_rows("<div>no list here</div>").is_empty());
    }

    #[test]
    fn test_split_date_range_short_form() {
        assert_eq!(split_date_range("2016 - 2020"), (Some("2016"), Some("2020")));
        assert_eq!(split_date_range("2020"), (Some("2020"), Some("2020")));
    }

    #[test]
    fn test_split_date_range_long_form_anchors_on_dash() {
        assert_eq!(
            split_date_range("Jan 2016 - Dec 2020"),
            (Some("2016"), Some("2020"))
        );
    }

    #[test]
    fn test_split_date_range_degenerate_inputs() {
        assert_eq!(split_date_range(""), (None, None));
        assert_eq!(split_date_range("one two three four five"), (None, None));
    }
}
