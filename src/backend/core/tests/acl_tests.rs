//! ACL aggregation through the directory collaborator and credential issue.
//!
//! Tests cover:
//! - Empty ACL for users without roles
//! - Union of entitlements across roles, zero entries for ungranted entities
//! - Tenant isolation
//! - Snapshot semantics of issued credentials

use tessera_core::acl::{
    AclAggregator, Entitlement, EntitlementSet, InMemoryAclDirectory, RoleId, TenantId, UserId,
};
use tessera_core::auth::{evaluate, CredentialIssuer, CredentialSubject};
use tessera_core::config::AuthConfig;

struct Fixture {
    directory: InMemoryAclDirectory,
    tenant: TenantId,
    editor: RoleId,
    auditor: RoleId,
}

fn fixture() -> Fixture {
    let directory = InMemoryAclDirectory::new();
    let tenant = TenantId::new();
    let editor = RoleId::new();
    let auditor = RoleId::new();

    directory.define_entity(tenant, "Books");
    directory.define_entity(tenant, "Authors");
    directory.define_entity(tenant, "Reviews");

    directory.grant_by_name(tenant, editor, "Books", EntitlementSet::CREATE | EntitlementSet::UPDATE);
    directory.grant_by_name(tenant, auditor, "Books", EntitlementSet::READ);
    directory.grant_by_name(tenant, auditor, "Authors", EntitlementSet::READ);

    Fixture {
        directory,
        tenant,
        editor,
        auditor,
    }
}

#[tokio::test]
async fn test_user_without_roles_gets_empty_acl() {
    let f = fixture();
    let acl = AclAggregator::resolve(&f.directory, f.tenant, UserId::new())
        .await
        .unwrap();

    assert!(acl.is_empty());
}

#[tokio::test]
async fn test_bits_union_across_roles() {
    let f = fixture();
    let user = UserId::new();
    f.directory.assign_role(f.tenant, user, f.editor);
    f.directory.assign_role(f.tenant, user, f.auditor);

    let acl = AclAggregator::resolve(&f.directory, f.tenant, user).await.unwrap();

    let names: Vec<&str> = acl.entries().iter().map(|e| e.entity_name.as_str()).collect();
    assert_eq!(names, vec!["Books", "Authors", "Reviews"]);
    assert_eq!(
        acl.entitlements("Books"),
        EntitlementSet::CREATE | EntitlementSet::READ | EntitlementSet::UPDATE
    );
    assert_eq!(acl.entitlements("Authors"), EntitlementSet::READ);
    // Present with an explicit zero mask, not omitted.
    assert!(acl.entry("Reviews").is_some());
    assert!(acl.entitlements("Reviews").is_empty());
}

#[tokio::test]
async fn test_other_tenant_roles_are_ignored() {
    let f = fixture();
    let user = UserId::new();
    let elsewhere = TenantId::new();
    f.directory.define_entity(elsewhere, "Books");
    f.directory.assign_role(elsewhere, user, f.editor);

    let acl = AclAggregator::resolve(&f.directory, f.tenant, user).await.unwrap();
    assert!(acl.is_empty());
}

#[tokio::test]
async fn test_issued_credential_carries_snapshot() {
    let f = fixture();
    let user = UserId::new();
    f.directory.assign_role(f.tenant, user, f.auditor);

    let issuer = CredentialIssuer::new(&AuthConfig::with_secret("acl-test-secret")).unwrap();
    let subject = CredentialSubject::new(f.tenant, user);
    let credential = issuer.issue_for(&f.directory, &subject).await.unwrap();

    // Revocation after issue is not visible to the existing credential.
    assert!(f.directory.revoke_role(f.tenant, user, f.auditor));

    let claims = issuer.authenticate(&credential.token).unwrap();
    assert_eq!(claims.user_id, Some(user));
    assert!(evaluate(&claims, "Books", Entitlement::Read).is_allowed());
    assert!(evaluate(&claims, "Books", Entitlement::Create).is_denied());

    let reissued = issuer.issue_for(&f.directory, &subject).await.unwrap();
    let claims = issuer.authenticate(&reissued.token).unwrap();
    assert!(evaluate(&claims, "Books", Entitlement::Read).is_denied());
}

#[tokio::test]
async fn test_user_without_roles_is_denied_everywhere() {
    let f = fixture();
    let user = UserId::new();
    let issuer = CredentialIssuer::new(&AuthConfig::with_secret("acl-test-secret")).unwrap();
    let credential = issuer
        .issue_for(&f.directory, &CredentialSubject::new(f.tenant, user))
        .await
        .unwrap();

    let claims = issuer.authenticate(&credential.token).unwrap();
    for entity in ["Books", "Authors", "Reviews"] {
        for action in Entitlement::ALL {
            assert!(evaluate(&claims, entity, action).is_denied());
        }
    }
}
