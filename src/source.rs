//! Data source adapters.
//!
//! A data source decides where its feeds live under the site root and how its
//! records are classified. Adding a new feed means adding a variant here; the
//! renderer never looks at the source.

use crate::classify::{Classifier, SubtypeClassifier, VenueClassifier};
use crate::error::{Result, ScholarPageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directory under the site root holding all feeds
pub const DATA_DIR: &str = "data";

/// File name of the metrics summary inside a source directory
pub const METRICS_FILE: &str = "metrics.json";

/// Known publication feed producers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Scopus search export with subtype codes
    #[default]
    Scopus,
    /// Google Scholar profile via SerpApi
    Serpapi,
}

impl DataSource {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Scopus => "scopus",
            Self::Serpapi => "serpapi",
        }
    }

    /// Relative path of the publication feed, e.g. `data/scopus/scopus.json`
    pub fn publications_path(&self) -> String {
        format!("{}/{}/{}.json", DATA_DIR, self.slug(), self.slug())
    }

    /// Relative path of the metrics summary, e.g. `data/scopus/metrics.json`
    pub fn metrics_path(&self) -> String {
        format!("{}/{}/{}", DATA_DIR, self.slug(), METRICS_FILE)
    }

    /// Classification strategy matching the fields this source provides
    pub fn classifier(&self) -> Result<Box<dyn Classifier>> {
        Ok(match self {
            Self::Scopus => Box::new(SubtypeClassifier::default()),
            Self::Serpapi => Box::new(VenueClassifier::new()?),
        })
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DataSource {
    type Err = ScholarPageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scopus" => Ok(Self::Scopus),
            "serpapi" | "gscholar" | "scholar" => Ok(Self::Serpapi),
            other => Err(ScholarPageError::Validation(format!(
                "Unknown data source '{}'",
                other
            ))),
        }
    }
}
