//! Access policy evaluation.
//!
//! Answers "may this caller perform `action` on `entity`?" from the caller's
//! identity claims alone. Evaluation never fails: every problem with the
//! claims resolves to a deny decision.

use metrics::counter;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::claims::IdentityClaims;
use crate::acl::Entitlement;

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    SuperAdmin,
    Granted,
    MissingEntitlementClaim,
    MissingSubject,
    UnknownEntity,
    ActionNotGranted,
    /// Reserved to super admins, such as issuing credentials for others
    SuperAdminRequired,
}

impl DecisionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Granted => "granted",
            Self::MissingEntitlementClaim => "missing_entitlement_claim",
            Self::MissingSubject => "missing_subject",
            Self::UnknownEntity => "unknown_entity",
            Self::ActionNotGranted => "action_not_granted",
            Self::SuperAdminRequired => "super_admin_required",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl AuthorizationDecision {
    pub const fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub const fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════════════════════════════════════════

/// Pure evaluation.
///
/// 1. Super admins are allowed unconditionally.
/// 2. No ACL payload denies.
/// 3. No subject, no entry for `entity_name` (case-insensitive), or `action`
///    set in none of the matching entries denies.
pub fn evaluate(
    claims: &IdentityClaims,
    entity_name: &str,
    action: Entitlement,
) -> AuthorizationDecision {
    if claims.is_super_admin {
        return AuthorizationDecision::allow(DecisionReason::SuperAdmin);
    }

    let Some(acl) = claims.acl.as_ref() else {
        return AuthorizationDecision::deny(DecisionReason::MissingEntitlementClaim);
    };

    if !claims.has_subject() {
        return AuthorizationDecision::deny(DecisionReason::MissingSubject);
    }

    match acl.lookup(entity_name) {
        None => AuthorizationDecision::deny(DecisionReason::UnknownEntity),
        Some(bits) if !bits.allows(action) => {
            AuthorizationDecision::deny(DecisionReason::ActionNotGranted)
        }
        Some(_) => AuthorizationDecision::allow(DecisionReason::Granted),
    }
}

/// [`evaluate`], then record the decision.
pub fn authorize(
    claims: &IdentityClaims,
    entity_name: &str,
    action: Entitlement,
) -> AuthorizationDecision {
    let decision = evaluate(claims, entity_name, action);

    counter!(
        "tessera_authz_decisions_total",
        "decision" => if decision.allowed { "allow" } else { "deny" },
        "reason" => decision.reason.as_str()
    )
    .increment(1);

    debug!(
        user_id = ?claims.user_id,
        entity = entity_name,
        action = %action,
        allowed = decision.allowed,
        reason = %decision.reason,
        "Access policy evaluated"
    );

    decision
}
