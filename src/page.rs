//! Host page handling.
//!
//! The host page is the HTML document the publication list is rendered into.
//! It must contain a mount point and a list container; the three metric
//! targets are optional. Targets are located by `id` once, up front, and
//! carried in a [`RenderContext`] so that rendering code never has to look
//! elements up itself.

use crate::classify::Category;
use crate::error::{OptionExt, Result, ScholarPageError};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, warn};

/// Attribute on the mount point carrying the page's author id
pub const IDENTITY_ATTR: &str = "data-author-id";

/// Attribute on the mount point selecting the rendered category
pub const CATEGORY_ATTR: &str = "data-category";

/// Element ids the pipeline writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetIds {
    pub mount: String,
    pub list: String,
    pub total_documents: String,
    pub total_citations: String,
    pub h_index: String,
}

impl Default for TargetIds {
    fn default() -> Self {
        Self {
            mount: "publications".to_string(),
            list: "pub-list".to_string(),
            total_documents: "total-docs".to_string(),
            total_citations: "total-cites".to_string(),
            h_index: "h-index".to_string(),
        }
    }
}

/// Metric slot in the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    TotalDocuments,
    TotalCitations,
    HIndex,
}

/// An HTML document with elements addressable by id
#[derive(Debug, Clone)]
pub struct HostPage {
    html: String,
}

fn id_selector(id: &str) -> Result<Selector> {
    if id.is_empty() || id.contains(['"', '\\']) {
        return Err(ScholarPageError::Config(format!("Invalid element id '{}'", id)));
    }
    Selector::parse(&format!("[id=\"{}\"]", id)).map_err(|e| ScholarPageError::Parse(e.to_string()))
}

impl HostPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    pub fn has_element(&self, id: &str) -> Result<bool> {
        let selector = id_selector(id)?;
        Ok(Html::parse_document(&self.html).select(&selector).next().is_some())
    }

    /// Attribute value of the element with `id`, trimmed; empty reads as absent
    pub fn attr(&self, id: &str, name: &str) -> Result<Option<String>> {
        let selector = id_selector(id)?;
        let document = Html::parse_document(&self.html);
        Ok(document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr(name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// Text content of the element with `id`, trimmed
    pub fn text_of(&self, id: &str) -> Result<Option<String>> {
        let selector = id_selector(id)?;
        let document = Html::parse_document(&self.html);
        Ok(document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string()))
    }

    /// Replace the children of the element with `id` by `content`.
    ///
    /// The element is located with the same selector as the read-back
    /// helpers, and `content` is parsed as a body fragment. The page is
    /// re-serialized from the parsed tree afterwards.
    pub fn set_inner_html(&mut self, id: &str, content: &str) -> Result<()> {
        let selector = id_selector(id)?;
        let mut document = Html::parse_document(&self.html);
        let target = document.select(&selector).next().map(|el| el.id()).ok_or_target(id)?;

        let stale: Vec<_> = document
            .tree
            .get(target)
            .map(|node| node.children().map(|child| child.id()).collect::<Vec<_>>())
            .unwrap_or_default();
        for child in stale {
            if let Some(mut node) = document.tree.get_mut(child) {
                node.detach();
            }
        }

        let fragment = Html::parse_fragment(content);
        let mut pending = VecDeque::new();
        for child in fragment.root_element().children() {
            pending.push_back((child, target));
        }
        while let Some((source, parent)) = pending.pop_front() {
            let Some(mut parent) = document.tree.get_mut(parent) else {
                continue;
            };
            let copied = parent.append(source.value().clone()).id();
            for child in source.children() {
                pending.push_back((child, copied));
            }
        }

        self.html = document.html();
        Ok(())
    }
}

/// Page targets resolved once at the start of a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub mount: String,
    pub list: String,
    /// Author id the page is restricted to, from the mount point
    pub identity_token: Option<String>,
    /// Category requested by the mount point
    pub category: Option<Category>,
    pub total_documents: Option<String>,
    pub total_citations: Option<String>,
    pub h_index: Option<String>,
}

impl RenderContext {
    /// Resolve all targets. Fails with [`ScholarPageError::MissingTarget`]
    /// when the mount point or the list container is missing.
    pub fn resolve(page: &HostPage, ids: &TargetIds) -> Result<Self> {
        if !page.has_element(&ids.mount)? {
            return Err(ScholarPageError::MissingTarget(ids.mount.clone()));
        }
        if !page.has_element(&ids.list)? {
            return Err(ScholarPageError::MissingTarget(ids.list.clone()));
        }

        let optional = |id: &str| -> Result<Option<String>> {
            Ok(page.has_element(id)?.then(|| id.to_string()))
        };

        let category = match page.attr(&ids.mount, CATEGORY_ATTR)? {
            Some(value) => match value.parse::<Category>() {
                Ok(category) => Some(category),
                Err(e) => {
                    warn!(value = %value, error = %e, "Ignoring unknown mount point category");
                    None
                }
            },
            None => None,
        };

        let ctx = Self {
            mount: ids.mount.clone(),
            list: ids.list.clone(),
            identity_token: page.attr(&ids.mount, IDENTITY_ATTR)?,
            category,
            total_documents: optional(&ids.total_documents)?,
            total_citations: optional(&ids.total_citations)?,
            h_index: optional(&ids.h_index)?,
        };
        debug!(context = ?ctx, "Resolved render context");
        Ok(ctx)
    }

    /// Id of a metric target, if the page has one
    pub fn metric_target(&self, field: MetricField) -> Option<&str> {
        match field {
            MetricField::TotalDocuments => self.total_documents.as_deref(),
            MetricField::TotalCitations => self.total_citations.as_deref(),
            MetricField::HIndex => self.h_index.as_deref(),
        }
    }
}
