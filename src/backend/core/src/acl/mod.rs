//! Access control lists: entitlements, role administration data and the
//! aggregation that turns a user's roles into a per-entity ACL.

pub mod aggregator;
pub mod directory;
pub mod entitlement;
pub mod model;

pub use aggregator::{AclAggregator, AclDirectory};
pub use directory::{DirectorySeed, InMemoryAclDirectory, RoleSeed, TenantSeed};
pub use entitlement::{Entitlement, EntitlementSet};
pub use model::{
    Acl, AclEntry, EntityDefinition, EntityId, RoleEntitlementRow, RoleId, RoleMembership,
    TenantId, UserId,
};
