//! Request gate: authorization before every data operation.
//!
//! Routes register their `(entity, action)` requirement explicitly with
//! [`RequireEntitlementLayer`]. Code paths outside HTTP compose the same
//! check through [`RequestGate`].

pub mod layer;

pub use layer::{RequireEntitlementLayer, RequireEntitlementService};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::acl::Entitlement;
use crate::auth::{authorize, AuthorizationDecision, IdentityClaims};
use crate::error::TesseraError;
use crate::filter::{FilterError, FilterQuery, PredicateCompiler};
use crate::schema::{Entity, SchemaRegistry};
use crate::store::{RecordStore, StoreError};

/// Body returned for every denial, whatever the reason.
pub const FORBIDDEN_MESSAGE: &str = "You are not authorized to access";

/// Build a 403 Forbidden JSON response.
pub fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "message": FORBIDDEN_MESSAGE })),
    )
        .into_response()
}

#[derive(Debug)]
pub enum GateError {
    /// The access policy denied the request.
    Forbidden(AuthorizationDecision),
    /// The request was allowed but failed afterwards.
    Rejected(TesseraError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden(_) => forbidden_response(),
            Self::Rejected(error) => error.into_response(),
        }
    }
}

impl From<TesseraError> for GateError {
    fn from(error: TesseraError) -> Self {
        Self::Rejected(error)
    }
}

impl From<FilterError> for GateError {
    fn from(error: FilterError) -> Self {
        Self::Rejected(error.into())
    }
}

impl From<StoreError> for GateError {
    fn from(error: StoreError) -> Self {
        Self::Rejected(error.into())
    }
}

/// Authorize, compile, then hand off to storage.
#[derive(Debug, Clone, Copy)]
pub struct RequestGate {
    compiler: PredicateCompiler<'static>,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(SchemaRegistry::global())
    }
}

impl RequestGate {
    pub fn new(registry: &'static SchemaRegistry) -> Self {
        Self {
            compiler: PredicateCompiler::new(registry),
        }
    }

    pub fn authorize(
        claims: &IdentityClaims,
        entity_name: &str,
        action: Entitlement,
    ) -> Result<AuthorizationDecision, GateError> {
        let decision = authorize(claims, entity_name, action);
        if decision.is_denied() {
            warn!(
                user_id = ?claims.user_id,
                entity = entity_name,
                action = %action,
                reason = %decision.reason,
                "Request denied"
            );
            return Err(GateError::Forbidden(decision));
        }
        Ok(decision)
    }

    /// Read records of `E` matching `query`, if `claims` grant `Read`.
    ///
    /// Authorization runs first, so a denied caller learns nothing about the
    /// validity of their criteria.
    pub async fn query<E: Entity>(
        &self,
        claims: &IdentityClaims,
        store: &dyn RecordStore<E>,
        query: &FilterQuery,
    ) -> Result<Vec<E>, GateError> {
        Self::authorize(claims, E::NAME, Entitlement::Read)?;
        let predicate = self.compiler.compile_query::<E>(query)?;
        Ok(store.find(&predicate).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{Acl, AclEntry, EntitlementSet, TenantId, UserId};
    use crate::auth::DecisionReason;
    use crate::entities::Book;
    use crate::filter::FilterCriterion;
    use crate::store::InMemoryStore;

    fn reader() -> IdentityClaims {
        IdentityClaims::new(UserId::new(), TenantId::new())
            .with_acl(Acl::new(vec![AclEntry::new("Books", EntitlementSet::READ)]))
    }

    #[tokio::test]
    async fn test_query_authorizes_before_compiling() {
        let gate = RequestGate::default();
        let store = InMemoryStore::<Book>::new();
        let bad = FilterQuery::new(vec![FilterCriterion::new("Nope", "=", "x")]);

        let denied = gate.query(&IdentityClaims::anonymous(), &store, &bad).await;
        assert!(matches!(
            denied,
            Err(GateError::Forbidden(d)) if d.reason == DecisionReason::MissingEntitlementClaim
        ));

        let rejected = gate.query(&reader(), &store, &bad).await;
        assert!(matches!(rejected, Err(GateError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_query_returns_matches() {
        let gate = RequestGate::default();
        let store = InMemoryStore::with_records([Book::titled("Dune"), Book::titled("Emma")]);
        let query = FilterQuery::default().with_search("Dun");

        let found = gate.query(&reader(), &store, &query).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_forbidden_response_status() {
        let response = GateError::Forbidden(AuthorizationDecision::deny(DecisionReason::UnknownEntity))
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
