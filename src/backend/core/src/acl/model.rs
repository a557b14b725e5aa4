//! Tenant-scoped identifiers, role administration rows and the ACL itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::entitlement::{Entitlement, EntitlementSet};

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Isolation boundary for entities, roles and users.
    TenantId
);
uuid_id!(UserId);
uuid_id!(RoleId);
uuid_id!(EntityId);

// ═══════════════════════════════════════════════════════════════════════════════
// Role Administration Rows
// ═══════════════════════════════════════════════════════════════════════════════

/// An entity defined for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub name: String,
}

/// A user's membership in a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMembership {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub role_id: RoleId,
}

/// Actions a role may perform on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntitlementRow {
    pub tenant_id: TenantId,
    pub role_id: RoleId,
    pub entity_id: EntityId,
    pub entitlement_bits: EntitlementSet,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACL
// ═══════════════════════════════════════════════════════════════════════════════

/// Effective entitlements of one user on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    #[serde(alias = "EntityName")]
    pub entity_name: String,
    #[serde(alias = "Action", default)]
    pub entitlement_bits: EntitlementSet,
}

impl AclEntry {
    pub fn new(entity_name: impl Into<String>, entitlement_bits: EntitlementSet) -> Self {
        Self {
            entity_name: entity_name.into(),
            entitlement_bits,
        }
    }
}

/// Per-tenant, per-user mapping from entity name to entitlements, in
/// directory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Acl {
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First entry whose name matches case-insensitively.
    pub fn entry(&self, entity_name: &str) -> Option<&AclEntry> {
        self.entries
            .iter()
            .find(|e| e.entity_name.eq_ignore_ascii_case(entity_name))
    }

    /// Union of the bits of every entry whose name matches
    /// case-insensitively. `None` when no entry matches.
    pub fn lookup(&self, entity_name: &str) -> Option<EntitlementSet> {
        self.entries
            .iter()
            .filter(|e| e.entity_name.eq_ignore_ascii_case(entity_name))
            .map(|e| e.entitlement_bits)
            .reduce(|acc, bits| acc | bits)
    }

    pub fn entitlements(&self, entity_name: &str) -> EntitlementSet {
        self.lookup(entity_name).unwrap_or_default()
    }

    pub fn allows(&self, entity_name: &str, action: Entitlement) -> bool {
        self.lookup(entity_name).is_some_and(|bits| bits.allows(action))
    }

    /// Serialised form embedded in credentials.
    pub fn to_claim_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_claim_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

impl FromIterator<AclEntry> for Acl {
    fn from_iter<I: IntoIterator<Item = AclEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a AclEntry;
    type IntoIter = std::slice::Iter<'a, AclEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
