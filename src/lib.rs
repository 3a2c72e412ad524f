//! # scholarpage
//!
//! Publication feed renderer for static academic websites.
//!
//! Reads a pre-generated JSON feed of publications and an optional metrics
//! summary, then renders them as HTML cards into a host page.
//!
//! ## Modules
//!
//! - [`fetch`] - Cache-busted retrieval of the two feeds
//! - [`record`] - Feed data model with loose field decoding
//! - [`source`] - Data source adapters (Scopus, SerpApi)
//! - [`classify`] - Pluggable article/conference/other classification
//! - [`normalize`] - Display dates, links and author highlighting
//! - [`metrics`] - Official or computed metrics, h-index
//! - [`page`] - Host page targets
//! - [`render`] - Sorting, filtering and card rendering
//! - [`pipeline`] - One page load end to end
//! - [`config`] - Site configuration file
//! - [`export`] - CSV export
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholarpage::{config::SiteConfig, page::HostPage, pipeline::PageRenderer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let renderer = PageRenderer::from_site_config(&SiteConfig::default())?;
//!     let page = HostPage::from_path("publications.html".as_ref())?;
//!     let html = renderer.render(page, None).await?.into_html();
//!     println!("{}", html);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod metrics;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod source;

pub use error::{Result, ScholarPageError};
