//! Page rendering pipeline.
//!
//! One call to [`PageRenderer::render`] is one page load:
//!
//! 1. resolve the host page targets ([`RenderContext`])
//! 2. fetch both feeds concurrently ([`FeedFetcher::fetch_feeds`])
//! 3. normalize and classify every record
//! 4. resolve metrics over the full collection
//! 5. filter, sort and render the cards into the list container
//! 6. write the metrics and re-check them for placeholder glyphs

use crate::classify::Category;
use crate::config::SiteConfig;
use crate::error::{Result, ScholarPageError};
use crate::fetch::{FeedFetcher, Feeds};
use crate::metrics::{DisplayedMetrics, MetricValue, ResolvedMetrics, PLACEHOLDER};
use crate::normalize::{AuthorHighlighter, NormalizedRecord, Normalizer};
use crate::page::{HostPage, MetricField, RenderContext, TargetIds};
use crate::render::{filter_category, filter_identity, render_list, sort_records, DisplayCard};
use crate::source::DataSource;
use tracing::{debug, info};

const METRIC_FIELDS: [MetricField; 3] = [
    MetricField::TotalDocuments,
    MetricField::TotalCitations,
    MetricField::HIndex,
];

/// Per-site page settings
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    pub source: DataSource,
    /// Category used when the mount point does not name one
    pub category: Category,
    /// Overrides the mount point's author id when set
    pub identity_token: Option<String>,
    pub targets: TargetIds,
}

/// Result of a completed render pass
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub category: Category,
    pub cards: Vec<DisplayCard>,
    pub metrics: ResolvedMetrics,
}

/// Outcome of one page load
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Rendered(RenderedPage),
    /// Mount point or list container missing; the page is returned untouched
    Aborted { page: HostPage, missing: String },
}

impl RenderOutcome {
    /// Page HTML, rendered or not
    pub fn into_html(self) -> String {
        match self {
            Self::Rendered(rendered) => rendered.html,
            Self::Aborted { page, .. } => page.into_html(),
        }
    }
}

fn metric_value(values: &DisplayedMetrics, field: MetricField) -> MetricValue {
    match field {
        MetricField::TotalDocuments => values.total_documents,
        MetricField::TotalCitations => values.total_citations,
        MetricField::HIndex => values.h_index,
    }
}

/// Write the metrics into whichever targets exist; failures are skipped.
fn write_metrics(page: &mut HostPage, ctx: &RenderContext, values: &DisplayedMetrics) {
    for field in METRIC_FIELDS {
        let Some(id) = ctx.metric_target(field) else {
            continue;
        };
        if let Err(e) = page.set_inner_html(id, &metric_value(values, field).to_string()) {
            debug!(target_id = id, error = %e, "Skipping metric target");
        }
    }
}

/// True if any metric target on the page still shows the placeholder glyph
fn shows_placeholder(page: &HostPage, ctx: &RenderContext) -> bool {
    METRIC_FIELDS.iter().any(|field| {
        ctx.metric_target(*field)
            .and_then(|id| page.text_of(id).ok().flatten())
            .map(|text| text == PLACEHOLDER)
            .unwrap_or(false)
    })
}

/// Renders publication pages for one site
pub struct PageRenderer {
    fetcher: FeedFetcher,
    normalizer: Normalizer,
    config: PageConfig,
}

impl PageRenderer {
    pub fn new(fetcher: FeedFetcher, config: PageConfig, highlighter: AuthorHighlighter) -> Result<Self> {
        let normalizer = Normalizer::new(config.source.classifier()?, highlighter);
        info!(
            source = %config.source,
            classifier = normalizer.classifier_name(),
            base = %fetcher.base(),
            "Page renderer ready"
        );
        Ok(Self {
            fetcher,
            normalizer,
            config,
        })
    }

    pub fn from_site_config(site: &SiteConfig) -> Result<Self> {
        let fetcher = FeedFetcher::new(site.feed_base_url()?, site.fetch_options())?;
        let config = PageConfig {
            source: site.source,
            category: site.category,
            identity_token: site.identity_token.clone(),
            targets: site.targets.clone(),
        };
        Self::new(fetcher, config, AuthorHighlighter::new(&site.highlight)?)
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub async fn fetch_feeds(&self) -> Feeds {
        self.fetcher.fetch_feeds(self.config.source).await
    }

    /// Fetch the feeds and resolve metrics without a page; the safety net is
    /// applied directly to the resolved values.
    pub async fn resolve_metrics(&self) -> ResolvedMetrics {
        let feeds = self.fetch_feeds().await;
        ResolvedMetrics::resolve(feeds.metrics.as_ref(), &feeds.publications)
            .safety_net(&feeds.publications)
    }

    /// Normalized records in display order, optionally limited to one category
    pub async fn normalized_records(&self, category: Option<Category>) -> Vec<NormalizedRecord> {
        let feeds = self.fetch_feeds().await;
        let mut records = filter_identity(
            self.normalizer.normalize_all(&feeds.publications),
            self.config.identity_token.as_deref(),
        );
        if let Some(category) = category {
            records = filter_category(records, category);
        }
        sort_records(&mut records);
        records
    }

    /// Run one page load against `page`.
    ///
    /// `category` overrides both the mount point attribute and the configured
    /// default.
    pub async fn render(&self, mut page: HostPage, category: Option<Category>) -> Result<RenderOutcome> {
        let ctx = match RenderContext::resolve(&page, &self.config.targets) {
            Ok(ctx) => ctx,
            Err(ScholarPageError::MissingTarget(missing)) => {
                debug!(missing = %missing, "Host page lacks a required target, not rendering");
                return Ok(RenderOutcome::Aborted { page, missing });
            }
            Err(e) => return Err(e),
        };

        let feeds = self.fetch_feeds().await;
        let normalized = self.normalizer.normalize_all(&feeds.publications);
        let mut metrics = ResolvedMetrics::resolve(feeds.metrics.as_ref(), &feeds.publications);

        let category = category.or(ctx.category).unwrap_or(self.config.category);
        let identity = self
            .config
            .identity_token
            .as_deref()
            .or(ctx.identity_token.as_deref());

        let mut visible = filter_category(filter_identity(normalized, identity), category);
        sort_records(&mut visible);
        let rendering = render_list(&visible);

        if let Err(e) = page.set_inner_html(&ctx.list, &rendering.html) {
            debug!(error = %e, "List container not writable, not rendering");
            return Ok(RenderOutcome::Aborted {
                page,
                missing: ctx.list.clone(),
            });
        }

        write_metrics(&mut page, &ctx, &metrics.values);
        if metrics.values.has_placeholder() || shows_placeholder(&page, &ctx) {
            metrics = ResolvedMetrics::compute(&feeds.publications);
            info!("Metrics panel showed a placeholder, rewrote computed values");
            write_metrics(&mut page, &ctx, &metrics.values);
        }

        info!(
            category = %category,
            cards = rendering.cards.len(),
            total = feeds.publications.len(),
            metrics = ?metrics.state,
            "Rendered page"
        );

        Ok(RenderOutcome::Rendered(RenderedPage {
            html: page.into_html(),
            category,
            cards: rendering.cards,
            metrics,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = r#"<div id="publications">
  <span id="total-docs">—</span><span id=total-cites>—</span><SPAN ID="h-index">—</SPAN>
  <div id="pub-list"></div>
</div>"#;

    fn complete() -> DisplayedMetrics {
        DisplayedMetrics {
            total_documents: MetricValue::Value(41),
            total_citations: MetricValue::Value(512),
            h_index: MetricValue::Value(12),
        }
    }

    fn context(page: &HostPage) -> RenderContext {
        RenderContext::resolve(page, &TargetIds::default()).expect("context")
    }

    #[test]
    fn test_read_back_detects_glyph_in_any_target() {
        let page = HostPage::new(PANEL);
        let ctx = context(&page);
        assert!(shows_placeholder(&page, &ctx));
    }

    #[test]
    fn test_write_metrics_clears_every_glyph() {
        let mut page = HostPage::new(PANEL);
        let ctx = context(&page);
        write_metrics(&mut page, &ctx, &complete());

        assert!(!shows_placeholder(&page, &ctx));
        assert!(!page.html().contains(PLACEHOLDER));
        assert_eq!(page.text_of("total-cites").expect("text").as_deref(), Some("512"));
        assert_eq!(page.text_of("h-index").expect("text").as_deref(), Some("12"));
    }

    #[test]
    fn test_partial_write_leaves_glyph_visible() {
        let mut page = HostPage::new(PANEL);
        let mut ctx = context(&page);
        ctx.h_index = None;
        write_metrics(&mut page, &ctx, &complete());
        assert_eq!(page.text_of("h-index").expect("text").as_deref(), Some(PLACEHOLDER));

        // Once the target is known again, the read-back sees the leftover glyph
        ctx.h_index = Some("h-index".to_string());
        assert!(shows_placeholder(&page, &ctx));
    }

    #[test]
    fn test_vanished_target_is_skipped() {
        let mut page = HostPage::new(r#"<div id="publications"><div id="pub-list"></div></div>"#);
        let mut ctx = context(&page);
        ctx.total_documents = Some("total-docs".to_string());
        write_metrics(&mut page, &ctx, &complete());
        assert!(!shows_placeholder(&page, &ctx));
    }
}
