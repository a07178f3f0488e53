//! In-process mock of the Prismic REST API for tests

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const MASTER_REF: &str = "MASTER";

/// How the search endpoint should misbehave
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorMode {
    Success,
    ServerError,
    InvalidJson,
}

struct MockState {
    base_url: String,
    documents: Vec<Value>,
    error_mode: Mutex<ErrorMode>,
    required_token: Option<String>,
    searches: Mutex<Vec<HashMap<String, String>>>,
    api_hits: AtomicUsize,
    refs_available: AtomicBool,
}

/// Mock Prismic repository serving a fixed list of post documents
pub struct MockPrismic {
    state: Arc<MockState>,
}

impl MockPrismic {
    /// Start a server with three posts, `p1` to `p3`
    pub async fn start() -> Self {
        Self::start_with(default_documents(), None).await
    }

    /// Start a server that rejects requests without `token`
    pub async fn start_with_token(token: &str) -> Self {
        Self::start_with(default_documents(), Some(token.to_string())).await
    }

    pub async fn start_with(documents: Vec<Value>, required_token: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(MockState {
            base_url,
            documents,
            error_mode: Mutex::new(ErrorMode::Success),
            required_token,
            searches: Mutex::new(Vec::new()),
            api_hits: AtomicUsize::new(0),
            refs_available: AtomicBool::new(true),
        });

        let app = Router::new()
            .route("/api/v2", get(api_handler))
            .route("/api/v2/documents/search", get(search_handler))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state }
    }

    /// API root, as configured in `prismic.endpoint`
    pub fn endpoint(&self) -> String {
        format!("{}/api/v2", self.state.base_url)
    }

    pub fn set_error_mode(&self, mode: ErrorMode) {
        *self.state.error_mode.lock().unwrap() = mode;
    }

    /// Serve an API descriptor without a master ref
    pub fn hide_master_ref(&self) {
        self.state.refs_available.store(false, Ordering::SeqCst);
    }

    /// Query parameters of every search received so far
    pub fn searches(&self) -> Vec<HashMap<String, String>> {
        self.state.searches.lock().unwrap().clone()
    }

    pub fn api_hits(&self) -> usize {
        self.state.api_hits.load(Ordering::SeqCst)
    }
}

/// Three published posts
pub fn default_documents() -> Vec<Value> {
    vec![
        document("p1", Some("2021-03-25T12:00:00+0000"), "Como utilizar Hooks"),
        document("p2", Some("2021-03-20T15:30:00+0000"), "Criando um app CRA do zero"),
        document("p3", None, "Rascunho"),
    ]
}

pub fn document(uid: &str, date: Option<&str>, title: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "href": "https://ignored.example.com",
        "tags": [],
        "first_publication_date": date,
        "last_publication_date": date,
        "lang": "pt-br",
        "data": {
            "title": title,
            "subtitle": format!("Subtitle of {}", uid),
            "author": "Danilo Vieira",
            "banner": { "url": "https://images.prismic.io/banner.png" }
        }
    })
}

fn token_ok(state: &MockState, params: &HashMap<String, String>) -> bool {
    match &state.required_token {
        Some(token) => params.get("access_token") == Some(token),
        None => true,
    }
}

async fn api_handler(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.api_hits.fetch_add(1, Ordering::SeqCst);
    if !token_ok(&state, &params) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }

    let refs = if state.refs_available.load(Ordering::SeqCst) {
        json!([
            { "id": "preview", "ref": "PREVIEW", "label": "Preview" },
            { "id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true }
        ])
    } else {
        json!([{ "id": "preview", "ref": "PREVIEW", "label": "Preview" }])
    };

    Json(json!({ "refs": refs, "types": { "posts": "Posts" }, "version": "mock" })).into_response()
}

async fn search_handler(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.searches.lock().unwrap().push(params.clone());

    if !token_ok(&state, &params) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    if params.get("ref").map(String::as_str) != Some(MASTER_REF) {
        return (StatusCode::BAD_REQUEST, "unknown ref").into_response();
    }

    match *state.error_mode.lock().unwrap() {
        ErrorMode::Success => {}
        ErrorMode::ServerError => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        ErrorMode::InvalidJson => {
            return (StatusCode::OK, "{\"results\": [").into_response();
        }
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: usize = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);

    let start = (page - 1) * page_size;
    let results: Vec<Value> = state
        .documents
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    let next_page = if start + page_size < state.documents.len() {
        let mut url = Url::parse(&format!("{}/api/v2/documents/search", state.base_url)).unwrap();
        {
            let mut pairs = url.query_pairs_mut();
            for key in ["ref", "q", "fetch", "pageSize", "access_token"] {
                if let Some(value) = params.get(key) {
                    pairs.append_pair(key, value);
                }
            }
            pairs.append_pair("page", &(page + 1).to_string());
        }
        Value::String(url.to_string())
    } else {
        Value::Null
    };

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": state.documents.len(),
        "total_pages": state.documents.len().div_ceil(page_size),
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
    .into_response()
}
