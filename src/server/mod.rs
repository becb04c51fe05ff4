//! Server with on-demand post rendering
//!
//! Prerendered files are served from `public/`. Post pages are kept in a
//! [`PageCache`] and refreshed in the background once they are older than
//! `posts.revalidate`; posts that were not prerendered are fetched on first
//! request while the fallback page is shown.

mod cache;

pub use cache::{Lookup, Outcome, PageCache, DEFAULT_RETRY_AFTER};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cms::{CmsError, ContentSource};
use crate::generator::Generator;
use crate::helpers::is_safe_slug;
use crate::pagination::{PaginationState, Paginator};
use crate::Blog;

/// Server state
pub struct ServerState {
    generator: Generator,
    source: Arc<dyn ContentSource>,
    cache: PageCache,
    public_dir: PathBuf,
}

impl ServerState {
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>, revalidate: Duration) -> Result<Self> {
        Ok(Self {
            generator: Generator::new(blog)?,
            source,
            cache: PageCache::new(revalidate),
            public_dir: blog.public_dir.clone(),
        })
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Load prerendered post pages into the cache
    pub async fn seed_prerendered(&self) -> Result<usize> {
        let posts_dir = self.public_dir.join("post");
        if !posts_dir.is_dir() {
            return Ok(0);
        }

        let mut seeded = 0;
        for entry in fs::read_dir(&posts_dir)? {
            let entry = entry?;
            let page = entry.path().join("index.html");
            let Some(slug) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !page.is_file() || !is_safe_slug(&slug) {
                continue;
            }

            let html = tokio::fs::read_to_string(&page).await?;
            self.cache.seed(&slug, html).await;
            seeded += 1;
        }

        tracing::debug!("Seeded {} prerendered posts", seeded);
        Ok(seeded)
    }

    async fn render(&self, slug: &str) -> Result<Outcome> {
        let post = self
            .generator
            .post_props(self.source.as_ref(), slug)
            .await?;
        match post {
            Some(post) => Ok(Outcome::Page(self.generator.renderer().render_post(&post)?)),
            None => Ok(Outcome::Missing),
        }
    }

    /// Fetch `slug` under `ticket`; returns whether the post exists
    async fn fetch(&self, slug: &str, ticket: u64) -> Result<bool> {
        match self.render(slug).await {
            Ok(outcome) => {
                let found = matches!(outcome, Outcome::Page(_));
                if self.cache.complete(slug, ticket, outcome).await {
                    tracing::info!("Rendered on demand: {} (found: {})", slug, found);
                }
                Ok(found)
            }
            Err(e) => {
                self.cache.fail(slug, ticket).await;
                Err(e)
            }
        }
    }

    /// Refresh `slug` in the background unless a fetch is already running
    async fn spawn_refresh(self: &Arc<Self>, slug: &str) {
        let Some(ticket) = self.cache.try_begin(slug).await else {
            return;
        };

        let state = Arc::clone(self);
        let slug = slug.to_string();
        tokio::spawn(async move {
            if let Err(e) = state.fetch(&slug, ticket).await {
                tracing::warn!("Failed to refresh {}: {:#}", slug, e);
            }
        });
    }

    fn fallback_page(&self) -> Response {
        match self.generator.renderer().render_fallback() {
            Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
            Err(e) => internal_error(e),
        }
    }

    fn not_found_page(&self) -> Response {
        match self.generator.renderer().render_not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => internal_error(e),
        }
    }

    fn error_page(&self) -> Response {
        match self.generator.renderer().render_error() {
            Ok(html) => (StatusCode::BAD_GATEWAY, Html(html)).into_response(),
            Err(e) => internal_error(e),
        }
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let source: Arc<dyn ContentSource> = Arc::new(blog.content_source()?);
    let revalidate = Duration::from_secs(blog.config.posts.revalidate);
    let state = Arc::new(ServerState::new(blog, source, revalidate)?);
    state.seed_prerendered().await?;

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes over a shared state
pub fn router(state: Arc<ServerState>) -> Router {
    let static_files = ServeDir::new(&state.public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(state.public_dir.join("404.html")));

    Router::new()
        .route("/api/posts", get(posts_handler))
        .route("/api/revalidate/:slug", post(revalidate_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PostsParams {
    page: Option<String>,
}

/// First page, or the page behind `?page=<token>`
async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PostsParams>,
) -> Result<Json<PaginationState>, ApiError> {
    let source = state.source.as_ref();

    let page = match params.page.filter(|token| !token.is_empty()) {
        None => state.generator.list_props(source).await?,
        Some(token) => {
            let start = PaginationState {
                results: Vec::new(),
                next_page: Some(token),
            };
            let mut paginator = Paginator::new(source, state.generator.normalizer(), start);
            paginator.load_more().await?;
            paginator.into_state()
        }
    };

    Ok(Json(page))
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_safe_slug(&slug) {
        return state.not_found_page();
    }

    match state.cache.lookup(&slug).await {
        Lookup::Fresh(html) => Html(html.to_string()).into_response(),
        Lookup::Stale(html) => {
            state.spawn_refresh(&slug).await;
            Html(html.to_string()).into_response()
        }
        Lookup::Missing => state.not_found_page(),
        Lookup::Failed => state.error_page(),
        Lookup::Pending => state.fallback_page(),
        Lookup::Absent => {
            state.spawn_refresh(&slug).await;
            state.fallback_page()
        }
    }
}

/// Refetch a post now, superseding any running fetch
async fn revalidate_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !is_safe_slug(&slug) {
        return Err(ApiError::bad_request(format!("Invalid slug {:?}", slug)));
    }

    let ticket = state.cache.begin(&slug).await;
    let found = state.fetch(&slug, ticket).await?;
    Ok(Json(json!({ "revalidated": true, "found": found })))
}

/// Handler error carrying its HTTP status
///
/// The full error is logged; clients only see `message`, which never
/// carries upstream detail.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error: anyhow::Error,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message.clone()),
            message,
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        let error = err.into();
        let (status, message) = match error.downcast_ref::<CmsError>() {
            Some(CmsError::InvalidToken { .. }) => (StatusCode::BAD_REQUEST, "Invalid page token"),
            Some(_) => (StatusCode::BAD_GATEWAY, "Content repository is unavailable"),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        Self {
            status,
            message: message.to_string(),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("{}: {:#}", self.status, self.error);
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!("Render failed: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
