//! Credential claims and their boundary parse into [`IdentityClaims`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::acl::{Acl, TenantId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// Token Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// The signed body of a credential.
///
/// `userInRole` carries the ACL snapshot taken at issue time as a JSON string
/// of `[{entityName, entitlementBits}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Anything but a JSON string reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient_subject",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_super_admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_in_role: Option<String>,

    /// Token ID
    pub jti: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Accepts a JSON bool or a case-insensitive `"true"`/`"false"` string.
/// Anything else reads as `false`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_subject<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// The caller's identity as seen by the access policy evaluator.
///
/// Built once per request and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    /// `None` when the credential carried no usable subject
    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
    pub is_super_admin: bool,
    /// `None` when the credential carried no (or an unreadable) ACL payload
    pub acl: Option<Acl>,
}

impl IdentityClaims {
    /// No subject, no ACL, not a super admin. Denied everywhere.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id: Some(user_id).filter(|id| !id.is_nil()),
            tenant_id: Some(tenant_id),
            is_super_admin: false,
            acl: None,
        }
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn with_super_admin(mut self, is_super_admin: bool) -> Self {
        self.is_super_admin = is_super_admin;
        self
    }

    /// Parse verified token claims.
    ///
    /// An absent, non-string, malformed or nil `userId` yields no subject. A
    /// missing or malformed `userInRole` yields no ACL. Neither is an error.
    pub fn from_token_claims(claims: &TokenClaims) -> Self {
        let user_id = claims
            .user_id
            .as_deref()
            .and_then(|u| u.parse::<UserId>().ok())
            .filter(|id| !id.is_nil());

        let tenant_id = claims
            .tenant_id
            .as_deref()
            .and_then(|t| t.parse::<TenantId>().ok());

        let acl = claims
            .user_in_role
            .as_deref()
            .and_then(|payload| match Acl::from_claim_payload(payload) {
                Ok(acl) => Some(acl),
                Err(e) => {
                    debug!(jti = %claims.jti, error = %e, "Unreadable ACL claim, treating as absent");
                    None
                }
            });

        Self {
            user_id,
            tenant_id,
            is_super_admin: claims.is_super_admin,
            acl,
        }
    }

    pub fn has_subject(&self) -> bool {
        self.user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{Entitlement, UserId};

    fn claims(body: serde_json::Value) -> TokenClaims {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_super_admin_accepts_bool_or_string() {
        let base = |v: serde_json::Value| {
            claims(serde_json::json!({"isSuperAdmin": v, "jti": "j", "iat": 0, "exp": 1}))
        };
        assert!(base(serde_json::json!(true)).is_super_admin);
        assert!(base(serde_json::json!("True")).is_super_admin);
        assert!(!base(serde_json::json!("yes")).is_super_admin);
        assert!(!base(serde_json::json!(1)).is_super_admin);
    }

    #[test]
    fn test_boundary_parse() {
        let user = UserId::new();
        let token = claims(serde_json::json!({
            "userId": user.to_string(),
            "userInRole": r#"[{"EntityName":"Books","Action":[2]}]"#,
            "jti": "j", "iat": 0, "exp": 1
        }));

        let identity = IdentityClaims::from_token_claims(&token);
        assert_eq!(identity.user_id, Some(user));
        assert!(identity
            .acl
            .as_ref()
            .is_some_and(|acl| acl.allows("books", Entitlement::Read)));
    }

    #[test]
    fn test_non_string_subject_decodes_as_absent() {
        for subject in [serde_json::json!(42), serde_json::json!(null), serde_json::json!({"id": 1})] {
            let token = claims(serde_json::json!({
                "userId": subject,
                "userInRole": r#"[{"entityName":"Books","entitlementBits":[2]}]"#,
                "jti": "j", "iat": 0, "exp": 1
            }));
            assert!(token.user_id.is_none());

            let identity = IdentityClaims::from_token_claims(&token);
            assert!(!identity.has_subject());
            assert!(identity.acl.is_some());
        }
    }

    #[test]
    fn test_malformed_parts_become_absent() {
        let token = claims(serde_json::json!({
            "userId": "00000000-0000-0000-0000-000000000000",
            "tenantId": "nope",
            "userInRole": "{not json",
            "jti": "j", "iat": 0, "exp": 1
        }));

        let identity = IdentityClaims::from_token_claims(&token);
        assert!(!identity.has_subject());
        assert!(identity.tenant_id.is_none());
        assert!(identity.acl.is_none());
        assert!(!identity.is_super_admin);
    }
}
