//! Record normalization.
//!
//! Derives every display value of a [`PublicationRecord`] in one place:
//! date string, outbound link, category and highlighted author markup.
//! Defaults for missing fields are substituted here and nowhere else.

use crate::classify::{Category, Classifier};
use crate::error::{Result, ScholarPageError};
use crate::record::PublicationRecord;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

/// Link used when a record has no outbound URL; performs no navigation
pub const NULL_LINK: &str = "#";

/// Title shown for records without one
pub const UNTITLED: &str = "Untitled";

/// Record with all display values resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub venue: String,
    /// Display date, e.g. "Mar 2021", "2021" or ""
    pub date: String,
    pub href: String,
    /// Author list as HTML with the site owner emphasised
    pub authors_markup: String,
    pub citations: u64,
    /// Sort keys; 0 when unknown
    pub year: i64,
    pub month: i64,
    pub category: Category,
    pub author_id: Option<String>,
    /// Volume/issue/pages line, empty when none are known
    pub details: String,
    pub doi_url: Option<String>,
    pub scopus_url: Option<String>,
}

/// Escape text for inclusion in HTML content or attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Split a date-like token into a 4-digit year and an optional month.
///
/// Accepts "YYYY", "YYYY-MM", "YYYY-MM-DD" and "/" separators. Months outside
/// 1..=12 are dropped.
pub fn parse_date_token(token: &str) -> Option<(i32, Option<u32>)> {
    let token = token.trim();
    let year_part = token.get(..4)?;
    if !year_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    let rest = &token[4..];
    if !rest.is_empty() && !rest.starts_with(['-', '/']) {
        return None;
    }

    let month = rest
        .get(1..)
        .map(|r| r.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|m| m.parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m));

    Some((year, month))
}

/// Format a date-like token as "Mon YYYY", or the bare year when no month is
/// known. Unparseable input yields an empty string.
pub fn format_display_date(token: &str) -> String {
    match parse_date_token(token) {
        Some((year, Some(month))) => NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| year.to_string()),
        Some((year, None)) => year.to_string(),
        None => String::new(),
    }
}

/// Pick the first non-empty outbound link.
///
/// Order: `doi_url`, a URL built from a bare `doi`, `scopus_url`, `link`.
pub fn resolve_link(record: &PublicationRecord) -> String {
    let from_doi = record
        .doi
        .as_deref()
        .map(|doi| format!("https://doi.org/{}", doi.trim_start_matches("https://doi.org/")));

    [
        record.doi_url.clone(),
        from_doi,
        record.scopus_url.clone(),
        record.link.clone(),
    ]
    .into_iter()
    .flatten()
    .map(|l| l.trim().to_string())
    .find(|l| !l.is_empty() && l != NULL_LINK)
    .unwrap_or_else(|| NULL_LINK.to_string())
}

/// Volume, issue and page range joined for display
fn format_details(record: &PublicationRecord) -> String {
    let mut parts = Vec::new();
    if let Some(volume) = &record.volume {
        parts.push(format!("Vol. {}", volume));
    }
    if let Some(issue) = &record.issue {
        parts.push(format!("No. {}", issue));
    }
    if let Some(pages) = &record.pages {
        parts.push(format!("pp. {}", pages));
    }
    parts.join(", ")
}

/// Emphasises the site owner in author lists.
///
/// Built from name fragments matched case-insensitively anywhere in an author
/// entry. Whitespace inside a fragment matches any run of spaces, dots or
/// commas, so "Abou Hajal" also matches "ABOU  HAJAL" and "Abou. Hajal".
/// Alternate spellings and name orderings are listed as separate fragments.
#[derive(Debug, Clone, Default)]
pub struct AuthorHighlighter {
    pattern: Option<Regex>,
}

impl AuthorHighlighter {
    pub fn new<S: AsRef<str>>(fragments: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = fragments
            .iter()
            .map(|f| f.as_ref().trim())
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"[\s.,]+")
            })
            .collect();

        if alternatives.is_empty() {
            return Ok(Self::default());
        }

        let pattern = Regex::new(&format!("(?i){}", alternatives.join("|")))
            .map_err(|e| ScholarPageError::Config(format!("Invalid highlight pattern: {}", e)))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_match(&self, author: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|p| p.is_match(author))
            .unwrap_or(false)
    }

    fn entry_markup(&self, author: &str) -> String {
        if self.is_match(author) {
            format!("<strong class=\"pub-self\">{}</strong>", html_escape(author))
        } else {
            html_escape(author)
        }
    }

    /// Render the author list of a record as HTML.
    ///
    /// All entries are kept in their original order. With only a first author
    /// known the result reads "<first author> et al.".
    pub fn markup(&self, record: &PublicationRecord) -> String {
        let entries = record
            .authors
            .as_ref()
            .map(|a| a.entries())
            .unwrap_or_default();

        if !entries.is_empty() {
            return entries
                .iter()
                .map(|a| self.entry_markup(a))
                .collect::<Vec<_>>()
                .join(", ");
        }

        match &record.first_author {
            Some(first) => format!("{} et al.", self.entry_markup(first)),
            None => String::new(),
        }
    }
}

/// Turns feed records into display-ready records
pub struct Normalizer {
    classifier: Box<dyn Classifier>,
    highlighter: AuthorHighlighter,
}

impl Normalizer {
    pub fn new(classifier: Box<dyn Classifier>, highlighter: AuthorHighlighter) -> Self {
        Self {
            classifier,
            highlighter,
        }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn normalize(&self, record: &PublicationRecord) -> NormalizedRecord {
        let token = record.date_token();
        let parsed = token.as_deref().and_then(parse_date_token);

        let year = record
            .year
            .or_else(|| parsed.map(|(y, _)| i64::from(y)))
            .unwrap_or(0);
        let month = record
            .month
            .or_else(|| parsed.and_then(|(_, m)| m).map(i64::from))
            .unwrap_or(0);

        NormalizedRecord {
            title: record.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
            venue: record.venue.clone().unwrap_or_default(),
            date: token.as_deref().map(format_display_date).unwrap_or_default(),
            href: resolve_link(record),
            authors_markup: self.highlighter.markup(record),
            citations: record.citation_count(),
            year,
            month,
            category: self.classifier.classify(record),
            author_id: record.author_id.clone(),
            details: format_details(record),
            doi_url: record.doi_url.clone(),
            scopus_url: record.scopus_url.clone(),
        }
    }

    pub fn normalize_all(&self, records: &[PublicationRecord]) -> Vec<NormalizedRecord> {
        records.iter().map(|r| self.normalize(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SubtypeClassifier;
    use crate::record::Authors;

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date("2021-03"), "Mar 2021");
        assert_eq!(format_display_date("2021-03-15"), "Mar 2021");
        assert_eq!(format_display_date("2021"), "2021");
        assert_eq!(format_display_date(""), "");
        assert_eq!(format_display_date("n.d."), "");
        assert_eq!(format_display_date("2021-13"), "2021");
        assert_eq!(format_display_date("20215"), "");
    }

    #[test]
    fn test_resolve_link_prefers_doi() {
        let record = PublicationRecord {
            doi_url: Some("https://doi.org/10.1/x".to_string()),
            scopus_url: Some("https://www.scopus.com/record/display.uri?eid=2".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_link(&record), "https://doi.org/10.1/x");
    }

    #[test]
    fn test_resolve_link_fallbacks() {
        assert_eq!(resolve_link(&PublicationRecord::default()), NULL_LINK);

        let bare_doi = PublicationRecord {
            doi: Some("10.5/abc".to_string()),
            link: Some("https://scholar.google.com/x".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_link(&bare_doi), "https://doi.org/10.5/abc");

        let serp = PublicationRecord {
            link: Some("https://scholar.google.com/x".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_link(&serp), "https://scholar.google.com/x");

        let marker = PublicationRecord {
            link: Some("#".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_link(&marker), NULL_LINK);
    }

    #[test]
    fn test_highlight_preserves_order() {
        let h = AuthorHighlighter::new(&["abou hajal"]).expect("pattern");
        let record = PublicationRecord {
            authors: Some(Authors::Joined("B Smith, A Abou Hajal, C <Lee>".to_string())),
            ..Default::default()
        };
        assert_eq!(
            h.markup(&record),
            "B Smith, <strong class=\"pub-self\">A Abou Hajal</strong>, C &lt;Lee&gt;"
        );
    }

    #[test]
    fn test_highlight_alternate_spellings() {
        let h = AuthorHighlighter::new(&["Abou Hajal", "Hajal A."]).expect("pattern");
        assert!(h.is_match("ABOU  HAJAL, A."));
        assert!(h.is_match("Hajal A."));
        assert!(!h.is_match("Smith J."));
    }

    #[test]
    fn test_first_author_et_al() {
        let h = AuthorHighlighter::new(&["Hajal"]).expect("pattern");
        let record = PublicationRecord {
            first_author: Some("Hajal A.".to_string()),
            ..Default::default()
        };
        assert_eq!(
            h.markup(&record),
            "<strong class=\"pub-self\">Hajal A.</strong> et al."
        );
        assert_eq!(h.markup(&PublicationRecord::default()), "");
    }

    #[test]
    fn test_empty_highlighter_matches_nothing() {
        let h = AuthorHighlighter::new::<&str>(&[]).expect("pattern");
        assert!(!h.is_match("anyone"));
    }

    #[test]
    fn test_normalize_defaults() {
        let normalizer = Normalizer::new(
            Box::new(SubtypeClassifier::default()),
            AuthorHighlighter::default(),
        );
        let n = normalizer.normalize(&PublicationRecord::default());
        assert_eq!(n.title, UNTITLED);
        assert_eq!(n.date, "");
        assert_eq!(n.href, NULL_LINK);
        assert_eq!(n.citations, 0);
        assert_eq!((n.year, n.month), (0, 0));
        assert_eq!(n.category, Category::Other);
        assert_eq!(n.details, "");
    }

    #[test]
    fn test_normalize_derives_sort_keys_from_cover_date() {
        let normalizer = Normalizer::new(
            Box::new(SubtypeClassifier::default()),
            AuthorHighlighter::default(),
        );
        let n = normalizer.normalize(&PublicationRecord {
            cover_date: Some("2022-11-01".to_string()),
            subtype: Some("ar".to_string()),
            volume: Some("12".to_string()),
            pages: Some("1-10".to_string()),
            ..Default::default()
        });
        assert_eq!((n.year, n.month), (2022, 11));
        assert_eq!(n.date, "Nov 2022");
        assert_eq!(n.category, Category::Article);
        assert_eq!(n.details, "Vol. 12, pp. 1-10");
    }
}
