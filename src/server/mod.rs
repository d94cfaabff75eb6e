//! HTTP surface: router, extractors and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app::auth::{SessionStore, UserDirectory};
use crate::app::document_store::DocumentStore;
use crate::app::kinds::{Books, Courses, Devoirs, ExamBlancs, Exams, PageDescriptions};
use crate::app::upload::UploadStore;
use crate::catalog::Catalog;
use crate::config::Tunables;

pub mod auth;
pub mod content;
pub mod upload;

pub use auth::{AuthSession, SESSION_COOKIE};

/// Multipart framing overhead allowed on top of the file size limit.
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn DocumentStore>,
    pub users: UserDirectory,
    pub sessions: Arc<SessionStore>,
    pub uploads: UploadStore,
    /// Body limit of the JSON routes.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, upload_dir: impl Into<PathBuf>, tunables: Tunables) -> Self {
        Self {
            catalog: Arc::new(Catalog::new()),
            users: UserDirectory::new(Arc::clone(&store)),
            store,
            sessions: Arc::new(SessionStore::new(tunables.session_ttl_secs)),
            uploads: UploadStore::new(upload_dir, tunables.max_upload_bytes),
            max_body_bytes: usize::try_from(tunables.max_body_bytes).unwrap_or(usize::MAX),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.uploads.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_SLACK_BYTES);

    let json_api = Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/courses", content::routes::<Courses>())
        .nest("/api/devoirs", content::routes::<Devoirs>())
        .nest("/api/exams", content::routes::<Exams>())
        .nest("/api/exam-blancs", content::routes::<ExamBlancs>())
        .nest("/api/books", content::routes::<Books>())
        .nest("/api/page-descriptions", content::routes::<PageDescriptions>())
        .layer(DefaultBodyLimit::max(state.max_body_bytes));

    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .merge(json_api)
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
