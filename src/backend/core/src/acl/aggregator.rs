//! ACL aggregation from role memberships and role entitlement rows.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

use super::entitlement::EntitlementSet;
use super::model::{
    Acl, AclEntry, EntityDefinition, RoleEntitlementRow, RoleId, RoleMembership, TenantId, UserId,
};
use crate::error::Result;

/// Read side of role and entity administration.
#[async_trait]
pub trait AclDirectory: Send + Sync {
    /// Roles held by `user` within `tenant`.
    async fn role_memberships(&self, tenant: TenantId, user: UserId) -> Result<Vec<RoleMembership>>;

    /// Entities defined for `tenant`, in display order.
    async fn entities(&self, tenant: TenantId) -> Result<Vec<EntityDefinition>>;

    /// Every role entitlement row of `tenant`.
    async fn role_entitlements(&self, tenant: TenantId) -> Result<Vec<RoleEntitlementRow>>;
}

/// Stateless ACL computation.
pub struct AclAggregator;

impl AclAggregator {
    /// Aggregate the ACL of `user` in `tenant`.
    ///
    /// No role memberships yields an empty ACL. Otherwise every entity of the
    /// tenant appears exactly once, with the union of the entitlement bits of
    /// all rows for that entity and one of the user's roles; entities without a
    /// matching row carry an empty set.
    pub fn compute(
        tenant: TenantId,
        user: UserId,
        memberships: &[RoleMembership],
        entities: &[EntityDefinition],
        rows: &[RoleEntitlementRow],
    ) -> Acl {
        let roles: HashSet<RoleId> = memberships
            .iter()
            .filter(|m| m.tenant_id == tenant && m.user_id == user)
            .map(|m| m.role_id)
            .collect();

        if roles.is_empty() {
            return Acl::empty();
        }

        entities
            .iter()
            .filter(|entity| entity.tenant_id == tenant)
            .map(|entity| {
                let bits = rows
                    .iter()
                    .filter(|row| {
                        row.tenant_id == tenant
                            && row.entity_id == entity.id
                            && roles.contains(&row.role_id)
                    })
                    .fold(EntitlementSet::empty(), |acc, row| acc | row.entitlement_bits);
                AclEntry::new(entity.name.clone(), bits)
            })
            .collect()
    }

    /// Fetch from `directory`, then [`compute`](Self::compute).
    pub async fn resolve(directory: &dyn AclDirectory, tenant: TenantId, user: UserId) -> Result<Acl> {
        let memberships = directory.role_memberships(tenant, user).await?;
        if memberships.is_empty() {
            debug!(tenant = %tenant, user = %user, "No role memberships, ACL is empty");
            return Ok(Acl::empty());
        }

        let entities = directory.entities(tenant).await?;
        let rows = directory.role_entitlements(tenant).await?;
        let acl = Self::compute(tenant, user, &memberships, &entities, &rows);

        debug!(
            tenant = %tenant,
            user = %user,
            roles = memberships.len(),
            entities = acl.len(),
            "Resolved ACL"
        );
        Ok(acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::EntityId;

    fn entity(tenant: TenantId, name: &str) -> EntityDefinition {
        EntityDefinition {
            id: EntityId::new(),
            tenant_id: tenant,
            name: name.into(),
        }
    }

    #[test]
    fn test_no_memberships_is_empty() {
        let tenant = TenantId::new();
        let books = entity(tenant, "Books");
        let acl = AclAggregator::compute(tenant, UserId::new(), &[], &[books], &[]);
        assert!(acl.is_empty());
    }

    #[test]
    fn test_union_across_roles_and_zero_entries_kept() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let (editor, auditor) = (RoleId::new(), RoleId::new());
        let books = entity(tenant, "Books");
        let authors = entity(tenant, "Authors");

        let memberships = [
            RoleMembership { tenant_id: tenant, user_id: user, role_id: editor },
            RoleMembership { tenant_id: tenant, user_id: user, role_id: auditor },
        ];
        let rows = [
            RoleEntitlementRow {
                tenant_id: tenant,
                role_id: editor,
                entity_id: books.id,
                entitlement_bits: EntitlementSet::CREATE | EntitlementSet::UPDATE,
            },
            RoleEntitlementRow {
                tenant_id: tenant,
                role_id: auditor,
                entity_id: books.id,
                entitlement_bits: EntitlementSet::READ,
            },
        ];

        let acl = AclAggregator::compute(tenant, user, &memberships, &[books, authors], &rows);

        assert_eq!(acl.len(), 2);
        assert_eq!(acl.entries()[0].entity_name, "Books");
        assert_eq!(
            acl.entries()[0].entitlement_bits,
            EntitlementSet::CREATE | EntitlementSet::READ | EntitlementSet::UPDATE
        );
        assert_eq!(acl.entries()[1].entity_name, "Authors");
        assert!(acl.entries()[1].entitlement_bits.is_empty());
    }

    #[test]
    fn test_other_tenants_rows_are_ignored() {
        let (tenant, other) = (TenantId::new(), TenantId::new());
        let user = UserId::new();
        let role = RoleId::new();
        let books = entity(tenant, "Books");
        let foreign = entity(other, "Invoices");

        let memberships = [RoleMembership { tenant_id: tenant, user_id: user, role_id: role }];
        let rows = [RoleEntitlementRow {
            tenant_id: other,
            role_id: role,
            entity_id: books.id,
            entitlement_bits: EntitlementSet::all(),
        }];

        let acl = AclAggregator::compute(tenant, user, &memberships, &[books, foreign], &rows);
        assert_eq!(acl.len(), 1);
        assert!(acl.entitlements("Books").is_empty());
    }
}
