//! Gated CRUD routes for one entity type.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::ApiResponse;
use crate::acl::Entitlement;
use crate::auth::IdentityClaims;
use crate::error::TesseraError;
use crate::filter::FilterQuery;
use crate::gate::{GateError, RequestGate, RequireEntitlementLayer};
use crate::schema::Entity;
use crate::store::RecordStore;

/// Per-entity handler state.
pub struct EntityState<E> {
    pub store: Arc<dyn RecordStore<E>>,
    pub gate: RequestGate,
}

impl<E> Clone for EntityState<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: self.gate,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// Routes for `E` under `/api/{name}` where `name` is `E::NAME` lowercased.
///
/// | Method | Path         | Entitlement |
/// |--------|--------------|-------------|
/// | POST   | `/query`     | read        |
/// | GET    | `/`          | read        |
/// | GET    | `/:id`       | read        |
/// | POST   | `/`          | create      |
/// | PUT    | `/:id`       | update      |
/// | DELETE | `/:id`       | delete      |
pub fn entity_router<E>(store: Arc<dyn RecordStore<E>>) -> Router
where
    E: Entity + Clone + Serialize + DeserializeOwned,
{
    let base = format!("/api/{}", E::NAME.to_lowercase());
    let require = RequireEntitlementLayer::for_entity::<E>;

    let state = EntityState {
        store,
        gate: RequestGate::default(),
    };

    Router::new()
        .route(
            &format!("{base}/query"),
            post(query_records::<E>).route_layer(require(Entitlement::Read)),
        )
        .route(
            &base,
            get(list_records::<E>)
                .route_layer(require(Entitlement::Read))
                .merge(post(create_record::<E>).route_layer(require(Entitlement::Create))),
        )
        .route(
            &format!("{base}/:id"),
            get(get_record::<E>)
                .route_layer(require(Entitlement::Read))
                .merge(put(update_record::<E>).route_layer(require(Entitlement::Update)))
                .merge(delete(delete_record::<E>).route_layer(require(Entitlement::Delete))),
        )
        .with_state(state)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════════════════════════

async fn query_records<E>(
    State(state): State<EntityState<E>>,
    claims: IdentityClaims,
    Json(query): Json<FilterQuery>,
) -> Result<ApiResponse<Vec<E>>, GateError>
where
    E: Entity + Serialize,
{
    let records = state.gate.query(&claims, state.store.as_ref(), &query).await?;
    Ok(ApiResponse::success(records))
}

async fn list_records<E>(
    State(state): State<EntityState<E>>,
    claims: IdentityClaims,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<E>>, GateError>
where
    E: Entity + Serialize,
{
    let query = FilterQuery {
        filters: Vec::new(),
        search_term: params.search,
    };
    let records = state.gate.query(&claims, state.store.as_ref(), &query).await?;
    Ok(ApiResponse::success(records))
}

async fn get_record<E>(
    State(state): State<EntityState<E>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<E>, TesseraError>
where
    E: Entity + Serialize,
{
    Ok(ApiResponse::success(state.store.get(id).await?))
}

async fn create_record<E>(
    State(state): State<EntityState<E>>,
    claims: IdentityClaims,
    Json(record): Json<E>,
) -> Result<impl IntoResponse, TesseraError>
where
    E: Entity + Serialize,
{
    let created = state.store.insert(record).await?;
    info!(entity = E::NAME, key = %created.key(), user_id = ?claims.user_id, "Record created");
    Ok((StatusCode::CREATED, ApiResponse::success(created)))
}

async fn update_record<E>(
    State(state): State<EntityState<E>>,
    claims: IdentityClaims,
    Path(id): Path<Uuid>,
    Json(record): Json<E>,
) -> Result<ApiResponse<E>, TesseraError>
where
    E: Entity + Serialize,
{
    if record.key() != id {
        return Err(TesseraError::validation("Record key does not match the request path"));
    }
    let updated = state.store.update(record).await?;
    info!(entity = E::NAME, key = %id, user_id = ?claims.user_id, "Record updated");
    Ok(ApiResponse::success(updated))
}

async fn delete_record<E>(
    State(state): State<EntityState<E>>,
    claims: IdentityClaims,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TesseraError>
where
    E: Entity,
{
    state.store.delete(id).await?;
    info!(entity = E::NAME, key = %id, user_id = ?claims.user_id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}
