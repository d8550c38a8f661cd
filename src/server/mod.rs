//! HTTP server exposing the post cache as JSON

mod webhook;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::Post;
use crate::helpers::date_xml;
use crate::Site;

pub use webhook::{sign_body, verify_signature};

/// Server state
struct ServerState {
    site: Site,
}

/// Errors rendered as `{"error": "..."}`
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct TagCount {
    name: String,
    count: usize,
}

/// Build the application router
pub fn router(site: Site) -> Router {
    let public_dir = site.config.server.public_dir.clone();
    let state = Arc::new(ServerState { site });

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/posts", get(posts_handler))
        .route("/api/posts/recent", get(recent_handler))
        .route("/api/posts/oldest", get(oldest_handler))
        .route("/api/posts/:slug", get(post_handler))
        .route("/api/search", get(search_handler))
        .route("/api/tags", get(tags_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .route("/webhook", post(webhook::webhook_handler))
        .with_state(state);

    if let Some(dir) = public_dir {
        app = app.nest_service("/public", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(site: Site, ip: &str, port: u16) -> Result<()> {
    let app = router(site);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PostsQuery>,
) -> Json<Vec<Arc<Post>>> {
    let store = &state.site.store;
    match query.tag {
        Some(tag) => Json(store.by_tag(&tag)),
        None => Json(store.all()),
    }
}

async fn recent_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<Arc<Post>>> {
    let n = query.n.unwrap_or(state.site.config.content.recent_count);
    Json(state.site.store.recent(n))
}

async fn oldest_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<Arc<Post>>> {
    let n = query.n.unwrap_or(state.site.config.content.recent_count);
    Json(state.site.store.oldest(n))
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Result<Json<Arc<Post>>, ApiError> {
    state
        .site
        .store
        .get(&slug)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("post not found: {}", slug)))
}

async fn search_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Arc<Post>>>, ApiError> {
    let store = Arc::clone(&state.site.store);
    let limit = state.site.config.content.search_limit;

    // Large snapshots fan out over threads; keep that off the async workers
    let mut results = tokio::task::spawn_blocking(move || store.search(&query.q))
        .await
        .map_err(|e| ApiError::Internal(format!("search failed: {}", e)))?;
    results.truncate(limit);

    Ok(Json(results))
}

async fn tags_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<TagCount>> {
    let tags = state
        .site
        .store
        .tags()
        .into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect();
    Json(tags)
}

async fn sitemap_handler(State(state): State<Arc<ServerState>>) -> Response {
    let base = state.site.config.server.url.trim_end_matches('/');
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for post in state.site.store.all() {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}/posts/{}</loc>\n    <lastmod>{}</lastmod>\n  </url>\n",
            xml_escape(base),
            xml_escape(&post.slug),
            date_xml(&post.date)
        ));
    }
    xml.push_str("</urlset>\n");

    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
