#![allow(clippy::result_large_err)]
//! # Tessera Core
//!
//! Multi-tenant, schema-agnostic CRUD core.
//!
//! ## Architecture
//!
//! - **Schema**: Per-entity field descriptors, cached process-wide
//! - **Filter**: Compiles filter criteria and a search term into one predicate
//! - **ACL**: Aggregates role entitlements into a per-user, per-tenant ACL
//! - **Auth**: Token boundary parsing and the access policy evaluator
//! - **Gate**: Authorization before every data operation
//! - **Store**: Storage collaborator consuming compiled predicates
//! - **API**: Axum router wiring gated CRUD for each entity
//! - **Telemetry**: Structured logging and Prometheus metrics

pub mod acl;
pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod gate;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, Result, TesseraError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::acl::{
        Acl, AclAggregator, AclDirectory, AclEntry, Entitlement, EntitlementSet, EntityId,
        InMemoryAclDirectory, RoleId, TenantId, UserId,
    };
    pub use crate::auth::{
        authorize, evaluate, AuthLayer, AuthorizationDecision, CredentialIssuer,
        CredentialSubject, DecisionReason, IdentityClaims,
    };
    pub use crate::error::{ErrorCode, ErrorContext, ErrorDetails, Result, TesseraError};
    pub use crate::filter::{
        CompiledPredicate, ComparisonOp, FilterCriterion, FilterError, FilterQuery, Predicate,
        PredicateCompiler, SqlRenderer,
    };
    pub use crate::gate::{GateError, RequestGate, RequireEntitlementLayer};
    pub use crate::schema::{Entity, FieldDescriptor, FieldType, FieldValue, SchemaRegistry};
    pub use crate::store::{InMemoryStore, RecordStore};
}
