//! Local HTTP preview of saved artifacts.
//!
//! `/` serves the pinned artifact, or the newest one under the output root
//! when nothing is pinned. `/a/{name}` serves any saved artifact by
//! directory name.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{debug, info, warn};

use crate::entity::document_path;
use crate::error::Result;
use crate::storage::naming::is_artifact_name;
use crate::storage::ArtifactStore;

pub const DEFAULT_PORT: u16 = 7878;

/// What the preview server can see.
#[derive(Debug, Clone)]
pub struct PreviewState {
    store: ArtifactStore,
    pinned: Option<PathBuf>,
}

impl PreviewState {
    pub fn new(root: impl Into<PathBuf>, pinned: Option<PathBuf>) -> Self {
        Self {
            store: ArtifactStore::new(root),
            pinned,
        }
    }

    /// Document served at `/`.
    pub fn index_document(&self) -> Result<Option<PathBuf>> {
        let location = match &self.pinned {
            Some(dir) => Some(dir.clone()),
            None => self.store.latest()?,
        };
        Ok(location
            .map(|dir| document_path(&dir))
            .filter(|p| p.is_file()))
    }

    /// Document served at `/a/{name}`. Names that could not have been
    /// produced by the store never resolve.
    pub fn named_document(&self, name: &str) -> Option<PathBuf> {
        if !is_artifact_name(name) {
            return None;
        }
        Some(document_path(&self.store.root().join(name))).filter(|p| p.is_file())
    }
}

pub fn router(state: PreviewState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/a/{name}", get(artifact))
        .with_state(Arc::new(state))
}

async fn index(State(state): State<Arc<PreviewState>>) -> Response {
    match state.index_document() {
        Ok(Some(path)) => serve_document(&path).await,
        Ok(None) => not_found("No generated artifact yet."),
        Err(e) => {
            warn!(error = %e, "could not list artifacts");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn artifact(
    State(state): State<Arc<PreviewState>>,
    UrlPath(name): UrlPath<String>,
) -> Response {
    match state.named_document(&name) {
        Some(path) => serve_document(&path).await,
        None => not_found("No such artifact."),
    }
}

async fn serve_document(path: &Path) -> Response {
    debug!(path = %path.display(), "serving");
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read artifact");
            not_found("No such artifact.")
        }
    }
}

fn not_found(message: &'static str) -> Response {
    (StatusCode::NOT_FOUND, message).into_response()
}

/// Serve until Ctrl+C.
pub async fn serve(state: PreviewState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("preview at http://{}", listener.local_addr()?);
    println!("Preview at http://{} (Ctrl+C to stop)", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Blocking entry point for the CLI.
pub fn run(state: PreviewState, port: u16) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(state, port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("preview stopped");
}
