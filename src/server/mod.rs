//! Listing server with periodic regeneration of the first page

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::content::PostPage;
use crate::error::FetchError;
use crate::listing::{Listing, LoadMode};
use crate::prismic::ContentSource;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Upper bound on "load more" actions served in one request
pub const MAX_LOADS_PER_REQUEST: usize = 50;

/// Shown when a "load more" action fails; details go to the log
pub const LOAD_FAILED_NOTICE: &str = "Could not load more posts.";

/// First page and when it was fetched
struct CachedPage {
    page: PostPage,
    fetched_at: Instant,
}

/// Server state
pub struct ServerState<S> {
    source: S,
    config: SiteConfig,
    renderer: TemplateRenderer,
    public_dir: PathBuf,
    cache: RwLock<CachedPage>,
    refreshing: AtomicBool,
}

impl<S> ServerState<S>
where
    S: ContentSource + Send + Sync + 'static,
{
    /// Fetch the first page and build the state; a fetch failure is fatal
    pub async fn new(
        source: S,
        config: SiteConfig,
        public_dir: PathBuf,
    ) -> Result<Self, FetchError> {
        let page = source.fetch_first_page(config.prismic.page_size).await?;
        Ok(Self::with_page(source, config, public_dir, page))
    }

    /// Build the state around an already fetched first page
    pub fn with_page(
        source: S,
        config: SiteConfig,
        public_dir: PathBuf,
        page: PostPage,
    ) -> Self {
        Self {
            renderer: TemplateRenderer::new(&config),
            source,
            config,
            public_dir,
            cache: RwLock::new(CachedPage {
                page,
                fetched_at: Instant::now(),
            }),
            refreshing: AtomicBool::new(false),
        }
    }

    /// The content source requests are served from
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current first page.
    ///
    /// A stale page is still returned while a single background task
    /// refetches it.
    pub async fn first_page(self: &Arc<Self>) -> PostPage {
        let (page, stale) = {
            let cached = self.cache.read().await;
            let stale = cached.fetched_at.elapsed() >= self.config.revalidate_interval();
            (cached.page.clone(), stale)
        };

        if stale
            && self
                .refreshing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            let state = Arc::clone(self);
            tokio::spawn(async move {
                let _guard = RefreshGuard(&state.refreshing);
                state.refresh().await;
            });
        }

        page
    }

    /// Refetch the first page, keeping the old one on failure
    pub async fn refresh(&self) {
        match self
            .source
            .fetch_first_page(self.config.prismic.page_size)
            .await
        {
            Ok(page) => {
                let mut cached = self.cache.write().await;
                cached.page = page;
                cached.fetched_at = Instant::now();
                tracing::info!("Regenerated first page");
            }
            Err(e) => {
                tracing::warn!("Regeneration failed, serving previous page: {}", e);
            }
        }
    }
}

/// Clears the refresh flag when the refresh task ends, even by panic
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Build the router for a state
pub fn router<S>(state: Arc<ServerState<S>>) -> Router
where
    S: ContentSource + Send + Sync + 'static,
{
    let public = ServeDir::new(&state.public_dir);
    Router::new()
        .route("/", get(index_handler::<S>))
        .route("/api/posts", get(posts_handler::<S>))
        .fallback_service(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let client = blog.client()?;
    let state = ServerState::new(client, blog.config.clone(), blog.public_dir.clone()).await?;
    let app = router(Arc::new(state));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    #[serde(default)]
    more: usize,
}

/// Listing page; `?more=N` runs N "load more" actions first.
///
/// In replace mode every action refetches the same cursor and gives the
/// same listing, so at most one is run and the control keeps `?more=1`.
async fn index_handler<S>(
    State(state): State<Arc<ServerState<S>>>,
    Query(query): Query<IndexQuery>,
) -> Html<String>
where
    S: ContentSource + Send + Sync + 'static,
{
    let page = state.first_page().await;
    let mut listing = Listing::new(page, state.config.load_mode);
    let more = match listing.mode() {
        LoadMode::Replace => query.more.min(1),
        LoadMode::Append => query.more.min(MAX_LOADS_PER_REQUEST),
    };

    let mut notice = None;
    for _ in 0..more {
        if !listing.can_load_more() {
            break;
        }
        if listing.load_more(&state.source).await.is_err() {
            notice = Some(LOAD_FAILED_NOTICE);
            break;
        }
    }

    let next = match listing.mode() {
        LoadMode::Replace => "?more=1".to_string(),
        LoadMode::Append => format!("?more={}", more + 1),
    };
    Html(state.renderer.render_page(&listing, &next, notice))
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    cursor: String,
}

/// One page of posts by cursor, as JSON
async fn posts_handler<S>(
    State(state): State<Arc<ServerState<S>>>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<PostPage>, FetchError>
where
    S: ContentSource + Send + Sync + 'static,
{
    let page = state.source.fetch_page(&query.cursor).await?;
    Ok(Json(page))
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::InvalidUrl(_) | FetchError::ForeignCursor(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            e => {
                tracing::error!(%e, "content API error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
        }
    }
}
