//! Blog HTTP server
//!
//! Routes:
//! - `GET /` feed, first page
//! - `GET /api/posts?cursor=..` next feed page as JSON, with its entries pre-rendered
//! - `GET /post/:uid` post page
//! - `GET /api/preview?token=..&documentId=..` enter preview mode
//! - `GET /api/exit-preview` leave preview mode

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::cache::RevalidateCache;
use crate::config::{PreviewConfig, ENV_PREVIEW_SECRET};
use crate::content::PostDetail;
use crate::pagination::{LoadOutcome, Page, PaginationState};
use crate::preview::{self, PreviewSession};
use crate::templates::TemplateRenderer;
use crate::view::{ListItem, Presenter, StatusKind};
use crate::Blog;

const INDEX_KEY: &str = "index";

/// Server state
pub struct AppState {
    blog: Blog,
    presenter: Presenter,
    templates: TemplateRenderer,
    list_cache: RevalidateCache<Page>,
    detail_cache: RevalidateCache<PostDetail>,
}

impl AppState {
    pub fn new(blog: Blog) -> Result<Self> {
        let ttl = Duration::from_secs(blog.config.revalidate_secs);
        Ok(Self {
            presenter: blog.presenter(),
            templates: TemplateRenderer::new()?,
            list_cache: RevalidateCache::new(ttl),
            detail_cache: RevalidateCache::new(ttl),
            blog,
        })
    }

    fn session(&self, headers: &HeaderMap) -> PreviewSession {
        let cookies: Vec<&str> = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        if cookies.is_empty() {
            PreviewSession::inactive()
        } else {
            self.blog.gate.is_preview(Some(&cookies.join("; ")))
        }
    }

    fn site_title(&self) -> &str {
        &self.blog.config.title
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.blog.config.fetch_timeout_ms)
    }

    fn status_page(
        &self,
        status: StatusCode,
        kind: StatusKind,
        session: &PreviewSession,
    ) -> Response {
        let vm = self.presenter.build_status_view_model(kind, session);
        html_page(status, self.templates.render_status(self.site_title(), &vm))
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/posts", get(api_posts))
        .route("/post/:uid", get(post_detail))
        .route("/api/preview", get(enter_preview))
        .route("/api/exit-preview", get(exit_preview))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: Blog, ip: &str, port: u16) -> Result<()> {
    warn_on_default_secret(&blog.config.preview);
    let state = Arc::new(AppState::new(blog)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log a warning when preview cookies are signed with the shipped secret.
/// Returns whether it warned.
fn warn_on_default_secret(config: &PreviewConfig) -> bool {
    if !config.has_default_secret() {
        return false;
    }
    tracing::warn!(
        "Preview cookies are signed with the default secret; set preview.secret or {}",
        ENV_PREVIEW_SECRET
    );
    true
}

fn html_page(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_page(state: &AppState, session: &PreviewSession) -> Response {
    state.status_page(StatusCode::BAD_GATEWAY, StatusKind::FetchFailed, session)
}

async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);

    let cached = if session.active {
        None
    } else {
        state.list_cache.get(INDEX_KEY)
    };

    let page = match cached {
        Some(page) => page,
        None => match state.blog.loader().first_page(&session).await {
            Ok(page) => {
                if !session.active {
                    state.list_cache.insert(INDEX_KEY, page.clone());
                }
                page
            }
            Err(e) => {
                tracing::error!("Failed to load the feed: {}", e);
                return error_page(&state, &session);
            }
        },
    };

    let pagination = PaginationState {
        loaded_posts: page.results,
        next_cursor: page.next_cursor,
    };
    let vm = state.presenter.build_list_view_model(&pagination, &session);
    html_page(StatusCode::OK, state.templates.render_list(state.site_title(), &vm))
}

#[derive(Debug, Deserialize)]
pub struct PostsParams {
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostsResponse {
    posts: Vec<ListItem>,
    next_cursor: Option<String>,
    /// The posts rendered as feed entries
    html: String,
}

async fn api_posts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PostsParams>,
) -> Response {
    let Some(cursor) = params.cursor.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing cursor" })),
        )
            .into_response();
    };

    let session = state.session(&headers);
    let pagination = state.blog.loader().cursor(
        session,
        Page {
            results: Vec::new(),
            next_cursor: Some(cursor),
        },
    );

    match pagination.load_more().await {
        LoadOutcome::Appended(_) | LoadOutcome::Exhausted => {
            let page = pagination.snapshot().await;
            let posts: Vec<ListItem> = page
                .loaded_posts
                .iter()
                .map(|p| state.presenter.list_item(p))
                .collect();

            match state.templates.render_posts(&posts) {
                Ok(html) => Json(PostsResponse {
                    posts,
                    next_cursor: page.next_cursor,
                    html,
                })
                .into_response(),
                Err(e) => {
                    tracing::error!("Failed to render feed entries: {:#}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        LoadOutcome::Busy | LoadOutcome::Failed => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "message": &state.presenter.labels().fetch_failed })),
        )
            .into_response(),
    }
}

/// Outcome of loading a post page
#[derive(Debug)]
enum DetailState {
    /// Still being fetched in the background
    Loading,
    Ready(PostDetail),
    NotFound,
    Failed,
}

async fn load_detail(state: &Arc<AppState>, uid: &str, session: &PreviewSession) -> DetailState {
    // Drafts are never cached and never answered with a loading page
    if session.active {
        return match state.blog.loader().load_post(uid, session).await {
            Ok(post) => DetailState::Ready(post),
            Err(e) if e.is_not_found() => DetailState::NotFound,
            Err(e) => {
                tracing::error!("Failed to load preview of {}: {}", uid, e);
                DetailState::Failed
            }
        };
    }

    if let Some(post) = state.detail_cache.get(uid) {
        return DetailState::Ready(post);
    }

    if !state.detail_cache.begin_fetch(uid) {
        return DetailState::Loading;
    }

    let task_state = Arc::clone(state);
    let task_uid = uid.to_string();
    let mut task = tokio::spawn(async move {
        let result = task_state
            .blog
            .loader()
            .load_post(&task_uid, &PreviewSession::inactive())
            .await;
        match &result {
            Ok(post) => task_state.detail_cache.insert(&task_uid, post.clone()),
            Err(_) => task_state.detail_cache.abandon_fetch(&task_uid),
        }
        result
    });

    match tokio::time::timeout(state.fetch_timeout(), &mut task).await {
        Ok(Ok(Ok(post))) => DetailState::Ready(post),
        Ok(Ok(Err(e))) if e.is_not_found() => DetailState::NotFound,
        Ok(Ok(Err(e))) => {
            tracing::error!("Failed to load post {}: {}", uid, e);
            DetailState::Failed
        }
        Ok(Err(e)) => {
            tracing::error!("Post fetch task for {} failed: {}", uid, e);
            state.detail_cache.abandon_fetch(uid);
            DetailState::Failed
        }
        Err(_) => {
            tracing::info!("Post {} is slow to load, serving the loading page", uid);
            DetailState::Loading
        }
    }
}

async fn post_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
) -> Response {
    let session = state.session(&headers);

    match load_detail(&state, &uid, &session).await {
        DetailState::Ready(post) => {
            let vm = state.presenter.build_detail_view_model(&post, &session);
            html_page(StatusCode::OK, state.templates.render_detail(state.site_title(), &vm))
        }
        DetailState::Loading => state.status_page(StatusCode::OK, StatusKind::Loading, &session),
        DetailState::NotFound => {
            state.status_page(StatusCode::NOT_FOUND, StatusKind::NotFound, &session)
        }
        DetailState::Failed => error_page(&state, &session),
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

async fn enter_preview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let target = preview::exchange(
        state.blog.source.as_ref(),
        params.token.as_deref(),
        params.document_id.as_deref(),
        state.blog.doc_type(),
    )
    .await;

    match (target, params.token) {
        (Ok(location), Some(token)) => match state.blog.gate.session_cookie(&token) {
            Ok(cookie) => {
                tracing::info!("Entering preview mode, redirecting to {}", location);
                (
                    StatusCode::FOUND,
                    [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!("{}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        (Err(e), _) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
        (Ok(_), None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": crate::error::PreviewError::InvalidToken.to_string() })),
        )
            .into_response(),
    }
}

async fn exit_preview(State(state): State<Arc<AppState>>) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, state.blog.gate.clear_cookie()),
        ],
    )
        .into_response()
}
