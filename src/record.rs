//! Feed data model.
//!
//! The publication and metrics feeds are produced by an external collector and
//! are only ever read here. Their fields are loosely typed (numbers arrive as
//! strings, authors as either a joined string or a list, anything may be null),
//! so every display-relevant field is decoded into an explicit `Option` and no
//! defaults are substituted at this layer. See [`crate::normalize`] for that.

use crate::error::{OptionExt, Result, ScholarPageError};
use crate::normalize::parse_date_token;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Author list as delivered by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Authors {
    /// Comma-joined author string (search-engine sources)
    Joined(String),
    /// Ordered author names (bibliographic sources)
    List(Vec<String>),
}

impl Authors {
    /// Split into individual author entries, preserving order.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::Joined(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(names) => names
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// A single publication from the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "loose_authors")]
    pub authors: Option<Authors>,
    #[serde(default, deserialize_with = "loose_string")]
    pub first_author: Option<String>,
    #[serde(default, deserialize_with = "loose_int")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "loose_int")]
    pub month: Option<i64>,
    /// ISO-ish "YYYY-MM-DD", "YYYY-MM" or "YYYY"
    #[serde(default, deserialize_with = "loose_string")]
    pub cover_date: Option<String>,
    #[serde(default, deserialize_with = "loose_int")]
    pub cited_by: Option<i64>,
    #[serde(default, deserialize_with = "loose_string")]
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub doi_url: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub scopus_url: Option<String>,
    /// Primary link of search-engine sources
    #[serde(default, deserialize_with = "loose_string")]
    pub link: Option<String>,
    /// Short subtype code: "ar", "re", "ed", "cp", ...
    #[serde(default, deserialize_with = "loose_string")]
    pub subtype: Option<String>,
    #[serde(
        default,
        rename = "subtypeDescription",
        deserialize_with = "loose_string"
    )]
    pub subtype_description: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "loose_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub issue: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub pages: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub author_name: Option<String>,
}

impl PublicationRecord {
    /// Date-like token used for display: the cover date when it parses,
    /// otherwise `year[-month]` rebuilt from the numeric fields.
    pub fn date_token(&self) -> Option<String> {
        if let Some(date) = &self.cover_date {
            if parse_date_token(date).is_some() || self.year.is_none() {
                return Some(date.clone());
            }
        }
        let year = self.year?;
        Some(match self.month {
            Some(month) if month > 0 => format!("{year:04}-{month:02}"),
            _ => format!("{year:04}"),
        })
    }

    /// Citation count with missing and negative values read as 0.
    pub fn citation_count(&self) -> u64 {
        self.cited_by.map(|c| c.max(0) as u64).unwrap_or(0)
    }
}

/// Precomputed author metrics published next to the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(default, deserialize_with = "loose_int")]
    pub total_documents: Option<i64>,
    #[serde(default, deserialize_with = "loose_int")]
    pub total_citations: Option<i64>,
    #[serde(default, deserialize_with = "loose_int")]
    pub h_index: Option<i64>,
    #[serde(default, deserialize_with = "loose_string")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub last_updated: Option<String>,
}

impl MetricsSummary {
    /// Decode a metrics body. Only a JSON object is a well-formed summary.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ScholarPageError::Parse(
                "metrics feed is not a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Decode a publication feed body.
///
/// The body must be a JSON array. Elements that are not objects are skipped
/// with a warning rather than failing the whole feed.
pub fn parse_feed(value: Value) -> Result<Vec<PublicationRecord>> {
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(ScholarPageError::Parse(
                "publication feed is not a JSON array".to_string(),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let decoded = item
            .is_object()
            .then(|| serde_json::from_value::<PublicationRecord>(item).ok())
            .flatten()
            .ok_or_parse("feed element is not a publication object");
        match decoded {
            Ok(record) => records.push(record),
            Err(e) => warn!(index = index, error = %e, "Skipping feed element"),
        }
    }
    Ok(records)
}

/// Read an integer out of a number or numeric string.
pub(crate) fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn loose_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(int_from_value))
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn loose_authors<'de, D>(deserializer: D) -> std::result::Result<Option<Authors>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let authors = match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Authors::Joined(s.trim().to_string())),
        Some(Value::Array(items)) => {
            let names: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                    _ => None,
                })
                .collect();
            (!names.is_empty()).then_some(Authors::List(names))
        }
        _ => None,
    };
    Ok(authors)
}
