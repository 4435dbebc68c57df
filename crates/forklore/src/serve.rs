//! HTTP server for the forklore viewer.
//!
//! Serves a JSON API over one data root.
//!
//! ## API Endpoints
//!
//! - `GET /` - Static HTML shell
//! - `GET /api/versions` - Version catalog in display order
//! - `GET /api/specs?version=` - Specs navigation tree
//! - `GET /api/item?version=&category=&name=` - Item detail with usedBy and link spans
//! - `GET /api/tests?version=` - Tests navigation tree
//! - `GET /api/testfile?version=&path=&name=&view=` - One fixture file's content
//! - `GET /api/resolve?fragment=` - Decode a deep-link fragment against a version

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use eyre::Result;
use forklore_core::refs::link_spans;
use forklore_core::{
    Category, DeepLink, Fork, LinkSpan, NameResolver, SpecItem, SpecsTree, TestsTree,
    VersionCatalog, ViewMode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::loader::{CaseLoader, FILE_WAIT_CAP, FileSlot};
use crate::session::VersionData;
use crate::store::DataStore;

/// State shared across HTTP handlers.
struct AppState {
    store: DataStore,
    loader: Arc<CaseLoader>,
    catalog: VersionCatalog,
    /// Derived state per version, built on first request and kept for the
    /// lifetime of the server.
    versions: RwLock<BTreeMap<String, Arc<VersionData>>>,
}

/// Build the router over one data root.
pub async fn app(store: DataStore) -> Result<Router> {
    let catalog = VersionCatalog::from_list(store.versions().await?);
    let state = Arc::new(AppState {
        loader: Arc::new(CaseLoader::new(store.clone())),
        store,
        catalog,
        versions: RwLock::new(BTreeMap::new()),
    });

    let router = Router::new()
        .route("/", get(index))
        .route("/api/versions", get(api_versions))
        .route("/api/specs", get(api_specs))
        .route("/api/item", get(api_item))
        .route("/api/tests", get(api_tests))
        .route("/api/testfile", get(api_testfile))
        .route("/api/resolve", get(api_resolve))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    Ok(router)
}

/// Run the API server.
pub async fn run(store: DataStore, port: Option<u16>) -> Result<()> {
    let app = app(store).await?;

    // Find a free port if none was explicitly requested
    let listener = match port {
        Some(p) => tokio::net::TcpListener::bind(format!("127.0.0.1:{p}")).await?,
        None => {
            const DEFAULT_PORT: u16 = 3000;
            const MAX_ATTEMPTS: u16 = 20;
            let mut listener = None;
            for p in DEFAULT_PORT..DEFAULT_PORT + MAX_ATTEMPTS {
                match tokio::net::TcpListener::bind(format!("127.0.0.1:{p}")).await {
                    Ok(l) => {
                        listener = Some(l);
                        break;
                    }
                    Err(_) => continue,
                }
            }
            listener.ok_or_else(|| {
                eyre::eyre!(
                    "Could not find a free port in range {DEFAULT_PORT}..{}",
                    DEFAULT_PORT + MAX_ATTEMPTS
                )
            })?
        }
    };

    let addr = listener.local_addr()?;
    info!("forklore listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

static INDEX_HTML: &str = include_str!("index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// API error response (always JSON).
#[derive(Debug, Clone, Serialize)]
struct ApiError {
    error: String,
    code: String,
}

impl ApiError {
    fn response(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        (
            status,
            Json(ApiError {
                error: msg.into(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }

    fn bad_request(msg: impl Into<String>) -> Response {
        Self::response(StatusCode::BAD_REQUEST, "bad_request", msg)
    }

    fn not_found(msg: impl Into<String>) -> Response {
        Self::response(StatusCode::NOT_FOUND, "not_found", msg)
    }

    /// Deep-link targets missing from a known version get their own code
    /// so the client can suggest picking another version.
    fn not_found_in_version(msg: impl Into<String>) -> Response {
        Self::response(StatusCode::NOT_FOUND, "not_found_in_version", msg)
    }

    fn internal(msg: impl Into<String>) -> Response {
        Self::response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
    }
}

/// Resolve the requested version against the catalog, load and cache its
/// derived state.
async fn version_data(
    state: &Arc<AppState>,
    requested: Option<&str>,
) -> Result<Arc<VersionData>, Response> {
    let version = state
        .catalog
        .select(requested)
        .map(str::to_string)
        .ok_or_else(|| ApiError::not_found("No versions available"))?;
    if requested.is_some_and(|r| r != version) {
        return Err(ApiError::not_found(format!(
            "Unknown version {}",
            requested.unwrap_or_default()
        )));
    }

    if let Some(data) = state.versions.read().await.get(&version) {
        return Ok(Arc::clone(data));
    }

    let raw = state
        .store
        .spec_data(&version)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}")))?;
    let manifest = state
        .store
        .manifest(&version)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}")))?;
    let data = Arc::new(VersionData::build(&version, &raw, manifest));

    let mut versions = state.versions.write().await;
    Ok(Arc::clone(versions.entry(version).or_insert(data)))
}

#[derive(Debug, Clone, Deserialize)]
struct VersionQuery {
    version: Option<String>,
}

/// GET /api/versions - Version catalog in display order.
async fn api_versions(State(state): State<Arc<AppState>>) -> Response {
    Json(&state.catalog).into_response()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpecsResponse<'a> {
    version: &'a str,
    tree: &'a SpecsTree,
}

/// GET /api/specs - Specs navigation tree for a version.
async fn api_specs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VersionQuery>,
) -> Response {
    let data = match version_data(&state, query.version.as_deref()).await {
        Ok(d) => d,
        Err(e) => return e,
    };
    Json(SpecsResponse {
        version: &data.version,
        tree: &data.specs_tree,
    })
    .into_response()
}

#[derive(Debug, Clone, Deserialize)]
struct ItemQuery {
    version: Option<String>,
    category: String,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemResponse<'a> {
    version: &'a str,
    item: &'a SpecItem,
    used_by: Vec<&'a str>,
    /// Click-to-navigate spans per fork of the item's rendered text.
    links: BTreeMap<&'a Fork, Vec<LinkSpan>>,
}

/// GET /api/item - One consolidated item with usedBy and link spans.
async fn api_item(State(state): State<Arc<AppState>>, Query(query): Query<ItemQuery>) -> Response {
    let data = match version_data(&state, query.version.as_deref()).await {
        Ok(d) => d,
        Err(e) => return e,
    };
    let Some(category) = Category::parse(&query.category) else {
        return ApiError::bad_request(format!("Unknown category {}", query.category));
    };
    let Some(item) = data.items.get(category, &query.name) else {
        return ApiError::not_found_in_version(format!(
            "{} not found in {}",
            query.name, data.version
        ));
    };

    let resolver = NameResolver::new(&data.items);
    let links = item
        .values
        .iter()
        .map(|(fork, rendered)| {
            let spans = link_spans(&rendered.text(), &resolver)
                .into_iter()
                .filter(|span| span.target != item.name)
                .collect();
            (fork, spans)
        })
        .collect();

    Json(ItemResponse {
        version: &data.version,
        item,
        used_by: data
            .refs
            .used_by(&item.name)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default(),
        links,
    })
    .into_response()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestsResponse<'a> {
    version: &'a str,
    tree: &'a TestsTree,
}

/// GET /api/tests - Tests navigation tree for a version.
async fn api_tests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VersionQuery>,
) -> Response {
    let data = match version_data(&state, query.version.as_deref()).await {
        Ok(d) => d,
        Err(e) => return e,
    };
    Json(TestsResponse {
        version: &data.version,
        tree: &data.tests_tree,
    })
    .into_response()
}

#[derive(Debug, Clone, Deserialize)]
struct TestFileQuery {
    version: Option<String>,
    path: String,
    name: String,
    view: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestFileResponse {
    name: String,
    binary: bool,
    view: &'static str,
    /// Hex for binary views, text otherwise.
    content: String,
    toggle_ready: bool,
}

/// GET /api/testfile - One fixture file, rendered for the requested view.
async fn api_testfile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TestFileQuery>,
) -> Response {
    let data = match version_data(&state, query.version.as_deref()).await {
        Ok(d) => d,
        Err(e) => return e,
    };
    let Some(case) = data.manifest.case_by_path(&query.path) else {
        return ApiError::not_found_in_version(format!(
            "{} not found in {}",
            query.path, data.version
        ));
    };
    if !case.case.files.iter().any(|f| f == &query.name) {
        return ApiError::not_found_in_version(format!(
            "{} has no file {}",
            query.path, query.name
        ));
    }
    let view = match query.view.as_deref() {
        None => None,
        Some("hex") => Some(ViewMode::Hex),
        Some("yaml") => Some(ViewMode::Yaml),
        Some(other) => return ApiError::bad_request(format!("Unknown view {other}")),
    };

    let files = match state
        .loader
        .load(&data.version, &query.path, &case.case.files)
    {
        Ok(files) => files,
        Err(e) => return ApiError::internal(format!("{e:#}")),
    };

    // The YAML view of a binary file is its companion's content.
    let fetch_name = match view {
        Some(ViewMode::Yaml) if forklore_core::is_binary(&query.name) => {
            format!("{}.yaml", query.name)
        }
        _ => query.name.clone(),
    };

    let slot = files.wait_for(&fetch_name, FILE_WAIT_CAP).await;
    let content = match slot {
        Some(FileSlot::Loaded(content)) => content,
        Some(FileSlot::Failed(err)) => return ApiError::internal(err),
        Some(FileSlot::Pending) => {
            return ApiError::response(
                StatusCode::SERVICE_UNAVAILABLE,
                "still_loading",
                format!("{fetch_name} has not finished loading"),
            );
        }
        None => {
            return ApiError::not_found_in_version(format!(
                "{} has no file {fetch_name}",
                query.path
            ));
        }
    };

    let (view_name, rendered) = if content.binary {
        ("hex", hex_dump(&content.bytes))
    } else {
        (
            if view == Some(ViewMode::Yaml) { "yaml" } else { "text" },
            String::from_utf8_lossy(&content.bytes).into_owned(),
        )
    };

    Json(TestFileResponse {
        name: query.name.clone(),
        binary: forklore_core::is_binary(&query.name),
        view: view_name,
        content: rendered,
        toggle_ready: files.toggle_ready(&query.name),
    })
    .into_response()
}

/// 32 bytes per row, space-separated pairs.
fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(32)
        .map(|row| {
            row.iter()
                .map(|b| hex::encode([*b]))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize)]
struct ResolveQuery {
    fragment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    link: DeepLink,
    /// Tests mode: ancestor node keys to expand, outermost first.
    ancestors: Vec<String>,
}

/// GET /api/resolve - Decode a deep-link fragment and locate its target.
async fn api_resolve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    let Some(link) = DeepLink::parse(&query.fragment) else {
        return ApiError::bad_request("Malformed fragment");
    };
    let (version, target_desc) = match &link {
        DeepLink::Spec {
            version,
            category,
            name,
            ..
        } => (version.clone(), format!("{}/{name}", category.as_str())),
        DeepLink::Test { version, path, .. } => (version.clone(), path.clone()),
    };
    if !state.catalog.contains(&version) {
        return ApiError::not_found(format!("Unknown version {version}"));
    }
    let data = match version_data(&state, Some(&version)).await {
        Ok(d) => d,
        Err(e) => return e,
    };

    let ancestors = match &link {
        DeepLink::Spec { category, name, .. } => {
            if data.items.get(*category, name).is_none() {
                return ApiError::not_found_in_version(format!(
                    "{target_desc} not found in {version}"
                ));
            }
            Vec::new()
        }
        DeepLink::Test { path, file, .. } => {
            let Some(node) = data.tests_tree.node_by_path(path) else {
                return ApiError::not_found_in_version(format!(
                    "{target_desc} not found in {version}"
                ));
            };
            if let Some(file) = file
                && !node.files.iter().any(|f| f == &file.name)
            {
                return ApiError::not_found_in_version(format!(
                    "{path}/{} not found in {version}",
                    file.name
                ));
            }
            data.tests_tree.ancestors_of(path)
        }
    };

    Json(ResolveResponse { link, ancestors }).into_response()
}
