//! HTTP surface.
//!
//! Every entity route registers its required entitlement with
//! [`RequireEntitlementLayer`]. Authentication runs once for the whole router
//! via [`AuthLayer`]; `/health` and `/metrics` are public by default.
//! `POST /auth/token` issues directory-backed credentials to super admins.

mod credentials;
mod entity;
mod handlers;

pub use credentials::{TokenRequest, TokenResponse};
pub use entity::{entity_router, EntityState};

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::acl::AclDirectory;
use crate::auth::{AuthLayer, CredentialIssuer};
use crate::entities::{Author, Book};
use crate::schema::SchemaRegistry;
use crate::store::RecordStore;
use crate::telemetry::MetricsRegistry;

/// Application state shared across the unversioned handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: &'static SchemaRegistry,
    pub metrics: MetricsRegistry,
    pub issuer: Arc<CredentialIssuer>,
    pub directory: Arc<dyn AclDirectory>,
    pub books: Arc<dyn RecordStore<Book>>,
    pub authors: Arc<dyn RecordStore<Author>>,
}

impl AppState {
    pub fn new(
        metrics: MetricsRegistry,
        issuer: Arc<CredentialIssuer>,
        directory: Arc<dyn AclDirectory>,
        books: Arc<dyn RecordStore<Book>>,
        authors: Arc<dyn RecordStore<Author>>,
    ) -> Self {
        let registry = SchemaRegistry::global();
        // Populate the schema catalogue before the first request.
        registry.describe::<Book>();
        registry.describe::<Author>();

        Self {
            registry,
            metrics,
            issuer,
            directory,
            books,
            authors,
        }
    }
}

/// Build the API router.
///
/// ```rust,ignore
/// let auth = AuthLayer::new(issuer.clone(), config.auth.public_paths.clone());
/// let app = build_router(state, auth);
/// ```
pub fn build_router(state: AppState, auth: AuthLayer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/api/schema", get(handlers::list_schemas))
        .route("/api/schema/:entity", get(handlers::describe_schema))
        .route("/auth/token", post(credentials::issue_token))
        .with_state(state.clone())
        .merge(entity_router::<Book>(state.books.clone()))
        .merge(entity_router::<Author>(state.authors.clone()))
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response Envelope
// ═══════════════════════════════════════════════════════════════════════════════

/// Success envelope. Failures render through `TesseraError` or the gate.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}
