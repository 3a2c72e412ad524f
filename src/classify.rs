//! Publication classification.
//!
//! Sorts each record into a coarse [`Category`] from loosely written
//! subtype codes, type descriptions and venue names. The rules are forgiving
//! substring matches and will misfile some venues; each data source plugs in
//! the [`Classifier`] that suits the fields it actually provides.

use crate::error::{Result, ScholarPageError};
use crate::record::PublicationRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse publication category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Article,
    Conference,
    Other,
}

impl Category {
    /// Machine name, also used as the CSS modifier and `data-category` value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Conference => "conference",
            Self::Other => "other",
        }
    }

    /// Display name shown on cards
    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "Journal Article",
            Self::Conference => "Conference Paper",
            Self::Other => "Publication",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScholarPageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" | "articles" | "journal" => Ok(Self::Article),
            "conference" | "conferences" | "proceedings" => Ok(Self::Conference),
            "other" | "others" => Ok(Self::Other),
            other => Err(ScholarPageError::Validation(format!(
                "Unknown category '{}'",
                other
            ))),
        }
    }
}

/// Classification strategy for one data source
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Assign a category to a record
    fn classify(&self, record: &PublicationRecord) -> Category;
}

/// Case-insensitive substring match against any token
fn contains_any(text: &str, tokens: &[&str]) -> bool {
    let text = text.to_lowercase();
    tokens.iter().any(|t| text.contains(t))
}

/// Case-insensitive exact match against any code
fn equals_any(text: &str, codes: &[&str]) -> bool {
    codes.iter().any(|c| text.trim().eq_ignore_ascii_case(c))
}

/// Classifier for bibliographic sources carrying a subtype code (Scopus).
///
/// Conference rules win over article rules.
#[derive(Debug, Clone)]
pub struct SubtypeClassifier {
    pub conference_codes: Vec<&'static str>,
    pub conference_tokens: Vec<&'static str>,
    pub article_codes: Vec<&'static str>,
    pub article_tokens: Vec<&'static str>,
}

impl Default for SubtypeClassifier {
    fn default() -> Self {
        Self {
            conference_codes: vec!["cp"],
            conference_tokens: vec!["conference", "proc.", "proceedings"],
            article_codes: vec!["ar", "re", "ed"],
            article_tokens: vec!["journal", "article", "review", "editorial"],
        }
    }
}

impl SubtypeClassifier {
    fn matches(&self, record: &PublicationRecord, codes: &[&str], tokens: &[&str]) -> bool {
        let code_hit = record
            .subtype
            .as_deref()
            .map(|s| equals_any(s, codes) || contains_any(s, tokens))
            .unwrap_or(false);

        code_hit
            || [&record.subtype_description, &record.kind]
                .into_iter()
                .flatten()
                .any(|desc| contains_any(desc, tokens))
    }
}

impl Classifier for SubtypeClassifier {
    fn name(&self) -> &'static str {
        "subtype"
    }

    fn classify(&self, record: &PublicationRecord) -> Category {
        if self.matches(record, &self.conference_codes, &self.conference_tokens) {
            Category::Conference
        } else if self.matches(record, &self.article_codes, &self.article_tokens) {
            Category::Article
        } else {
            Category::Other
        }
    }
}

/// Classifier for search-engine sources that only carry a venue string
/// (Google Scholar via SerpApi).
#[derive(Debug, Clone)]
pub struct VenueClassifier {
    pub conference_tokens: Vec<&'static str>,
    pub article_tokens: Vec<&'static str>,
    pub discipline_tokens: Vec<&'static str>,
    /// Journal abbreviation shape: one capitalised word followed by a period
    journal_shape: Regex,
}

impl VenueClassifier {
    pub fn new() -> Result<Self> {
        let journal_shape = Regex::new(r"^[A-Z][A-Za-z]+\.(\s|$)")
            .map_err(|e| ScholarPageError::Config(e.to_string()))?;

        Ok(Self {
            conference_tokens: vec!["conference", "proc.", "proceedings", "symposium", "congress"],
            article_tokens: vec![
                "journal",
                "article",
                "review",
                "editorial",
                "transactions",
                "letters",
            ],
            discipline_tokens: vec![
                "engineering",
                "science",
                "energy",
                "materials",
                "physics",
                "chemistry",
                "mathematics",
                "medicine",
                "geotechnic",
                "structures",
            ],
            journal_shape,
        })
    }
}

impl Classifier for VenueClassifier {
    fn name(&self) -> &'static str {
        "venue"
    }

    fn classify(&self, record: &PublicationRecord) -> Category {
        let venue = record.venue.as_deref().unwrap_or("");
        let kind = record.kind.as_deref().unwrap_or("");

        if contains_any(venue, &self.conference_tokens) || contains_any(kind, &self.conference_tokens)
        {
            Category::Conference
        } else if contains_any(venue, &self.article_tokens)
            || contains_any(kind, &self.article_tokens)
            || self.journal_shape.is_match(venue.trim())
            || contains_any(venue, &self.discipline_tokens)
        {
            Category::Article
        } else {
            Category::Other
        }
    }
}
