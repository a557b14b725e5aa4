//! Access policy evaluation over parsed identity claims.
//!
//! Tests cover:
//! - Super-admin bypass with absent or malformed subject and ACL
//! - Denial on absent ACL, absent subject, unknown entity and unset bit
//! - Bitwise (not equality) entitlement tests
//! - Boundary parse of raw token claims

use serde_json::json;
use tessera_core::acl::{Acl, AclEntry, Entitlement, EntitlementSet, TenantId, UserId};
use tessera_core::auth::{authorize, evaluate, DecisionReason, IdentityClaims, TokenClaims};

fn token_claims(body: serde_json::Value) -> TokenClaims {
    let mut base = json!({ "jti": "test", "iat": 0, "exp": i64::MAX });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), body.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(base).unwrap()
}

fn books_create_read() -> IdentityClaims {
    IdentityClaims::new(UserId::new(), TenantId::new()).with_acl(Acl::new(vec![AclEntry::new(
        "Books",
        EntitlementSet::CREATE | EntitlementSet::READ,
    )]))
}

// ============================================================================
// Super Admin
// ============================================================================

#[test]
fn test_super_admin_allows_everything() {
    let claims = IdentityClaims::anonymous().with_super_admin(true);

    for entity in ["Books", "Authors", "Anything"] {
        for action in Entitlement::ALL {
            let decision = evaluate(&claims, entity, action);
            assert!(decision.is_allowed());
            assert_eq!(decision.reason, DecisionReason::SuperAdmin);
        }
    }
}

#[test]
fn test_super_admin_with_malformed_claims_allows() {
    let claims = IdentityClaims::from_token_claims(&token_claims(json!({
        "userId": "not-a-uuid",
        "isSuperAdmin": "TRUE",
        "userInRole": "{broken"
    })));

    assert!(claims.user_id.is_none());
    assert!(claims.acl.is_none());
    assert!(authorize(&claims, "Books", Entitlement::Delete).is_allowed());
}

// ============================================================================
// Denials
// ============================================================================

#[test]
fn test_absent_acl_denies() {
    let claims = IdentityClaims::new(UserId::new(), TenantId::new());
    let decision = evaluate(&claims, "Books", Entitlement::Read);

    assert!(decision.is_denied());
    assert_eq!(decision.reason, DecisionReason::MissingEntitlementClaim);
}

#[test]
fn test_entitlement_bits_are_tested_bitwise() {
    let claims = books_create_read();

    assert!(evaluate(&claims, "Books", Entitlement::Read).is_allowed());
    assert!(evaluate(&claims, "Books", Entitlement::Create).is_allowed());

    let delete = evaluate(&claims, "Books", Entitlement::Delete);
    assert!(delete.is_denied());
    assert_eq!(delete.reason, DecisionReason::ActionNotGranted);
}

#[test]
fn test_entity_lookup_is_case_insensitive() {
    let claims = books_create_read();
    assert!(evaluate(&claims, "books", Entitlement::Read).is_allowed());
    assert!(evaluate(&claims, "BOOKS", Entitlement::Read).is_allowed());
}

#[test]
fn test_unknown_entity_denies() {
    let decision = evaluate(&books_create_read(), "Authors", Entitlement::Read);
    assert_eq!(decision.reason, DecisionReason::UnknownEntity);
}

#[test]
fn test_duplicate_entries_grant_if_any_carries_the_action() {
    let claims = IdentityClaims::new(UserId::new(), TenantId::new()).with_acl(Acl::new(vec![
        AclEntry::new("Books", EntitlementSet::READ),
        AclEntry::new("BOOKS", EntitlementSet::DELETE),
    ]));

    assert!(evaluate(&claims, "books", Entitlement::Read).is_allowed());
    assert!(evaluate(&claims, "books", Entitlement::Delete).is_allowed());
    assert_eq!(
        evaluate(&claims, "books", Entitlement::Update).reason,
        DecisionReason::ActionNotGranted
    );
}

#[test]
fn test_missing_subject_denies_even_when_granted() {
    let claims = IdentityClaims::from_token_claims(&token_claims(json!({
        "userId": "",
        "userInRole": r#"[{"entityName":"Books","entitlementBits":[1,2,4,8]}]"#
    })));

    assert!(claims.acl.is_some());
    let decision = evaluate(&claims, "Books", Entitlement::Read);
    assert!(decision.is_denied());
    assert_eq!(decision.reason, DecisionReason::MissingSubject);
}

#[test]
fn test_empty_acl_denies_everything() {
    let claims = IdentityClaims::new(UserId::new(), TenantId::new()).with_acl(Acl::empty());
    for action in Entitlement::ALL {
        assert!(evaluate(&claims, "Books", action).is_denied());
    }
}

// ============================================================================
// Boundary Parse
// ============================================================================

#[test]
fn test_legacy_acl_keys_parse() {
    let user = UserId::new();
    let claims = IdentityClaims::from_token_claims(&token_claims(json!({
        "userId": user.to_string(),
        "isSuperAdmin": false,
        "userInRole": r#"[{"EntityName":"Books","Action":[2,8]}]"#
    })));

    assert_eq!(claims.user_id, Some(user));
    assert!(evaluate(&claims, "Books", Entitlement::Delete).is_allowed());
    assert!(evaluate(&claims, "Books", Entitlement::Update).is_denied());
}

#[test]
fn test_malformed_acl_payload_reads_as_absent() {
    let claims = IdentityClaims::from_token_claims(&token_claims(json!({
        "userId": UserId::new().to_string(),
        "userInRole": "[{\"entityName\": 3}]"
    })));

    assert!(claims.acl.is_none());
    assert_eq!(
        evaluate(&claims, "Books", Entitlement::Read).reason,
        DecisionReason::MissingEntitlementClaim
    );
}

#[test]
fn test_numeric_subject_reads_as_missing() {
    let claims = IdentityClaims::from_token_claims(&token_claims(json!({
        "userId": 7,
        "userInRole": r#"[{"entityName":"Books","entitlementBits":[2]}]"#
    })));

    assert!(claims.user_id.is_none());
    assert_eq!(
        evaluate(&claims, "Books", Entitlement::Read).reason,
        DecisionReason::MissingSubject
    );
}
