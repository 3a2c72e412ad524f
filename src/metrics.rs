//! Author metrics resolution.
//!
//! Prefers the precomputed summary published next to the feed and falls back
//! to computing document count, citation sum and h-index from the full
//! publication collection.

use crate::record::{MetricsSummary, PublicationRecord};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Glyph shown for a metric with no usable value
pub const PLACEHOLDER: &str = "—";

/// Largest `h` such that `h` of the counts are each at least `h`.
pub fn h_index(counts: &[u64]) -> u64 {
    let mut sorted = counts.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    sorted
        .iter()
        .enumerate()
        .take_while(|(i, count)| **count >= (*i as u64) + 1)
        .count() as u64
}

/// One displayed metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Value(u64),
    Placeholder,
}

impl MetricValue {
    /// Read an official member; missing or negative values are unusable.
    fn from_official(value: Option<i64>) -> Self {
        value
            .and_then(|v| u64::try_from(v).ok())
            .map(Self::Value)
            .unwrap_or(Self::Placeholder)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Placeholder => f.write_str(PLACEHOLDER),
        }
    }
}

/// The three figures shown in the metrics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayedMetrics {
    pub total_documents: MetricValue,
    pub total_citations: MetricValue,
    pub h_index: MetricValue,
}

impl DisplayedMetrics {
    pub fn has_placeholder(&self) -> bool {
        self.total_documents.is_placeholder()
            || self.total_citations.is_placeholder()
            || self.h_index.is_placeholder()
    }
}

/// Where the displayed figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsState {
    Official,
    Computed,
}

/// Metrics ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMetrics {
    pub state: MetricsState,
    #[serde(flatten)]
    pub values: DisplayedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ResolvedMetrics {
    /// Figures computed from the publication collection
    pub fn compute(records: &[PublicationRecord]) -> Self {
        let counts: Vec<u64> = records.iter().map(PublicationRecord::citation_count).collect();
        let values = DisplayedMetrics {
            total_documents: MetricValue::Value(records.len() as u64),
            total_citations: MetricValue::Value(counts.iter().sum()),
            h_index: MetricValue::Value(h_index(&counts)),
        };
        debug!(
            documents = records.len(),
            h_index = %values.h_index,
            "Computed metrics from publications"
        );
        Self {
            state: MetricsState::Computed,
            values,
            last_updated: None,
        }
    }

    /// Prefer the official summary; compute when it is absent.
    pub fn resolve(official: Option<&MetricsSummary>, records: &[PublicationRecord]) -> Self {
        match official {
            Some(summary) => {
                info!(source = summary.source.as_deref().unwrap_or("unknown"), "Using official metrics");
                Self {
                    state: MetricsState::Official,
                    values: DisplayedMetrics {
                        total_documents: MetricValue::from_official(summary.total_documents),
                        total_citations: MetricValue::from_official(summary.total_citations),
                        h_index: MetricValue::from_official(summary.h_index),
                    },
                    last_updated: summary.last_updated.clone(),
                }
            }
            None => Self::compute(records),
        }
    }

    /// Replace the figures with computed ones if any still shows the placeholder.
    /// Idempotent; never refetches.
    pub fn safety_net(self, records: &[PublicationRecord]) -> Self {
        if self.values.has_placeholder() {
            info!(state = ?self.state, "Placeholder metric displayed, recomputing");
            Self::compute(records)
        } else {
            self
        }
    }
}
