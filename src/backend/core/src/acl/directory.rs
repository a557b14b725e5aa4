//! In-memory role and entity administration.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use super::aggregator::AclDirectory;
use super::entitlement::EntitlementSet;
use super::model::{
    AclEntry, EntityDefinition, EntityId, RoleEntitlementRow, RoleId, RoleMembership, TenantId,
    UserId,
};
use crate::error::{ErrorCode, ErrorContext, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// Seed Document
// ═══════════════════════════════════════════════════════════════════════════════

/// Role administration data loaded at startup.
///
/// ```json
/// {
///   "tenants": [{
///     "id": "7d6f…",
///     "entities": ["Books", "Authors"],
///     "roles": [{
///       "name": "librarian",
///       "grants": [{"entityName": "Books", "entitlementBits": [1, 2, 4]}],
///       "members": ["0b1e…"]
///     }]
///   }]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySeed {
    #[serde(default)]
    pub tenants: Vec<TenantSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSeed {
    pub id: TenantId,

    /// Entity order of the tenant's ACLs. Entities named only in grants
    /// follow, in first-grant order.
    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(default)]
    pub roles: Vec<RoleSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSeed {
    /// Generated when omitted
    #[serde(default = "RoleId::new")]
    pub id: RoleId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub grants: Vec<AclEntry>,

    #[serde(default)]
    pub members: Vec<UserId>,
}

impl DirectorySeed {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).with_error_code(ErrorCode::InvalidConfiguration)
    }
}

/// [`AclDirectory`] backed by process memory, with write helpers for
/// development servers and tests.
#[derive(Debug, Default)]
pub struct InMemoryAclDirectory {
    entities: RwLock<Vec<EntityDefinition>>,
    memberships: RwLock<Vec<RoleMembership>>,
    rows: RwLock<Vec<RoleEntitlementRow>>,
}

impl InMemoryAclDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Define an entity for `tenant`. Re-defining an existing name returns the
    /// existing id.
    pub fn define_entity(&self, tenant: TenantId, name: &str) -> EntityId {
        let mut entities = self.entities.write();
        if let Some(existing) = entities
            .iter()
            .find(|e| e.tenant_id == tenant && e.name.eq_ignore_ascii_case(name))
        {
            return existing.id;
        }

        let id = EntityId::new();
        entities.push(EntityDefinition {
            id,
            tenant_id: tenant,
            name: name.to_string(),
        });
        debug!(tenant = %tenant, entity = name, "Defined entity");
        id
    }

    pub fn assign_role(&self, tenant: TenantId, user: UserId, role: RoleId) {
        let membership = RoleMembership {
            tenant_id: tenant,
            user_id: user,
            role_id: role,
        };
        let mut memberships = self.memberships.write();
        if !memberships.contains(&membership) {
            memberships.push(membership);
        }
    }

    pub fn revoke_role(&self, tenant: TenantId, user: UserId, role: RoleId) -> bool {
        let mut memberships = self.memberships.write();
        let before = memberships.len();
        memberships.retain(|m| !(m.tenant_id == tenant && m.user_id == user && m.role_id == role));
        memberships.len() != before
    }

    pub fn grant(&self, tenant: TenantId, role: RoleId, entity: EntityId, bits: EntitlementSet) {
        self.rows.write().push(RoleEntitlementRow {
            tenant_id: tenant,
            role_id: role,
            entity_id: entity,
            entitlement_bits: bits,
        });
    }

    /// Grant by entity name, defining the entity if needed.
    pub fn grant_by_name(&self, tenant: TenantId, role: RoleId, entity_name: &str, bits: EntitlementSet) {
        let entity = self.define_entity(tenant, entity_name);
        self.grant(tenant, role, entity, bits);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Seeding
    // ─────────────────────────────────────────────────────────────────────────

    pub fn from_seed(seed: &DirectorySeed) -> Self {
        let directory = Self::new();
        for tenant in &seed.tenants {
            for entity in &tenant.entities {
                directory.define_entity(tenant.id, entity);
            }
            for role in &tenant.roles {
                for grant in &role.grants {
                    directory.grant_by_name(tenant.id, role.id, &grant.entity_name, grant.entitlement_bits);
                }
                for member in &role.members {
                    directory.assign_role(tenant.id, *member, role.id);
                }
                debug!(
                    tenant = %tenant.id,
                    role = %role.id,
                    name = ?role.name,
                    grants = role.grants.len(),
                    members = role.members.len(),
                    "Seeded role"
                );
            }
        }
        directory
    }

    /// Read a JSON [`DirectorySeed`] from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read ACL directory {}", path.display()))?;
        let seed = DirectorySeed::from_json(&raw)?;
        let directory = Self::from_seed(&seed);

        info!(
            path = %path.display(),
            tenants = seed.tenants.len(),
            "Loaded ACL directory"
        );
        Ok(directory)
    }
}

#[async_trait]
impl AclDirectory for InMemoryAclDirectory {
    async fn role_memberships(&self, tenant: TenantId, user: UserId) -> Result<Vec<RoleMembership>> {
        Ok(self
            .memberships
            .read()
            .iter()
            .filter(|m| m.tenant_id == tenant && m.user_id == user)
            .copied()
            .collect())
    }

    async fn entities(&self, tenant: TenantId) -> Result<Vec<EntityDefinition>> {
        Ok(self
            .entities
            .read()
            .iter()
            .filter(|e| e.tenant_id == tenant)
            .cloned()
            .collect())
    }

    async fn role_entitlements(&self, tenant: TenantId) -> Result<Vec<RoleEntitlementRow>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.tenant_id == tenant)
            .copied()
            .collect())
    }
}
