//! scholarpage - publication feed renderer for academic websites
//!
//! ## Usage
//!
//! ### Render a page
//! ```bash
//! scholarpage render --template publications.html --out site/publications.html
//! ```
//!
//! ### Preview server
//! ```bash
//! scholarpage serve --template publications.html --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::{Parser, Subcommand};
use scholarpage::{
    classify::Category,
    config::SiteConfig,
    export,
    page::HostPage,
    pipeline::{PageRenderer, RenderOutcome},
    source::DataSource,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Publication feed renderer for static academic websites
#[derive(Parser)]
#[command(name = "scholarpage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: ./scholarpage.json, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Site root holding data/<source>/ (URL or directory)
    #[arg(long, global = true)]
    base: Option<String>,

    /// Data source: scopus or serpapi
    #[arg(long, global = true)]
    source: Option<DataSource>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the publication list into a host page
    Render {
        /// Host page containing the mount point and list container
        #[arg(short, long)]
        template: PathBuf,

        /// Category to render (article, conference, other)
        #[arg(long)]
        category: Option<Category>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the resolved metrics as JSON
    Metrics,

    /// Export normalized publications as CSV
    Export {
        /// Output CSV file
        #[arg(short, long)]
        out: PathBuf,

        /// Only export one category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Run a preview HTTP server
    Serve {
        /// Host page rendered on every request
        #[arg(short, long)]
        template: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut site = SiteConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(base) = cli.base {
        site.feed_base = Some(base);
    }
    if let Some(source) = cli.source {
        site.source = source;
    }

    let renderer = PageRenderer::from_site_config(&site).context("Invalid site configuration")?;

    match cli.command {
        Commands::Render {
            template,
            category,
            out,
        } => run_render(&renderer, template, category, out).await,
        Commands::Metrics => run_metrics(&renderer).await,
        Commands::Export { out, category } => run_export(&renderer, out, category).await,
        Commands::Serve {
            template,
            port,
            host,
        } => run_server(renderer, template, host, port).await,
    }
}

// ============================================================================
// One-shot Commands
// ============================================================================

async fn run_render(
    renderer: &PageRenderer,
    template: PathBuf,
    category: Option<Category>,
    out: Option<PathBuf>,
) -> Result<()> {
    let page = HostPage::from_path(&template)
        .with_context(|| format!("Failed to read template {}", template.display()))?;

    let html = match renderer.render(page, category).await? {
        RenderOutcome::Rendered(rendered) => {
            info!(
                category = %rendered.category,
                cards = rendered.cards.len(),
                "Page rendered"
            );
            rendered.html
        }
        outcome @ RenderOutcome::Aborted { .. } => outcome.into_html(),
    };

    match out {
        Some(path) => {
            std::fs::write(&path, html).context("Failed to write output")?;
            info!(path = %path.display(), "Saved page");
        }
        None => println!("{}", html),
    }
    Ok(())
}

async fn run_metrics(renderer: &PageRenderer) -> Result<()> {
    let metrics = renderer.resolve_metrics().await;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

async fn run_export(renderer: &PageRenderer, out: PathBuf, category: Option<Category>) -> Result<()> {
    let records = renderer.normalized_records(category).await;
    export::save_csv(&out, &records).context("Failed to export CSV")?;
    println!("Saved {} publications to {}", records.len(), out.display());
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

struct AppState {
    renderer: PageRenderer,
    template: PathBuf,
}

async fn run_server(renderer: PageRenderer, template: PathBuf, host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState { renderer, template });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/pages/{category}", get(page_handler))
        .route("/api/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Render the host page for one category; every request is a fresh page load
async fn page_handler(State(state): State<Arc<AppState>>, UrlPath(category): UrlPath<String>) -> Response {
    let category = match category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    let page = match HostPage::from_path(&state.template) {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "Failed to read template");
            return (StatusCode::INTERNAL_SERVER_ERROR, "template unavailable").into_response();
        }
    };

    match state.renderer.render(page, Some(category)).await {
        Ok(outcome) => Html(outcome.into_html()).into_response(),
        Err(e) => {
            error!(error = %e, "Render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Resolved metrics endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.renderer.resolve_metrics().await).into_response()
}
