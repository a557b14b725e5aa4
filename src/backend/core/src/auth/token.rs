//! Credential issuing and verification (HS256 JWT).
//!
//! The ACL is aggregated once, at issue time, and embedded in the token as
//! the `userInRole` claim. Role changes made afterwards take effect on the
//! next credential.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::claims::{IdentityClaims, TokenClaims};
use crate::acl::{Acl, AclAggregator, AclDirectory, TenantId, UserId};
use crate::config::AuthConfig;
use crate::error::{ErrorCode, TesseraError};

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication is misconfigured: {0}")]
    Configuration(String),

    #[error("Failed to sign credential: {0}")]
    Signing(String),
}

impl AuthError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "MISSING_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Configuration(_) | Self::Signing(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials are required",
            ),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "The provided token is invalid"),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "The authentication token has expired",
            ),
            Self::Configuration(_) | Self::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An authentication error occurred",
            ),
        };

        counter!(
            "tessera_auth_failures_total",
            "error_type" => self.code()
        )
        .increment(1);

        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for TesseraError {
    fn from(error: AuthError) -> Self {
        let code = match &error {
            AuthError::MissingCredentials => ErrorCode::Unauthorized,
            AuthError::InvalidToken => ErrorCode::InvalidToken,
            AuthError::TokenExpired => ErrorCode::TokenExpired,
            AuthError::Configuration(_) => ErrorCode::InvalidConfiguration,
            AuthError::Signing(_) => ErrorCode::InternalError,
        };
        let message = error.to_string();
        TesseraError::new(code, message).with_source(error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Issuer
// ═══════════════════════════════════════════════════════════════════════════════

/// Who a credential is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSubject {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub is_super_admin: bool,
}

impl CredentialSubject {
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            is_super_admin: false,
        }
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }
}

/// A signed credential plus the claims it carries.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCredential {
    pub token: String,
    pub claims: TokenClaims,
}

/// Signs and verifies credentials.
pub struct CredentialIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    lifetime: Duration,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Configuration("JWT secret is required".into()));
        }
        let secret = config.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            lifetime: config.token_lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a credential embedding `acl` as the ACL snapshot. `None` omits the
    /// claim entirely.
    pub fn issue(&self, subject: &CredentialSubject, acl: Option<&Acl>) -> Result<IssuedCredential, AuthError> {
        let user_in_role = acl
            .map(Acl::to_claim_payload)
            .transpose()
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            user_id: Some(subject.user_id.to_string()),
            tenant_id: Some(subject.tenant_id.to_string()),
            is_super_admin: subject.is_super_admin,
            user_in_role,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(lifetime),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(
            user_id = %subject.user_id,
            tenant_id = %subject.tenant_id,
            jti = %claims.jti,
            "Issued credential"
        );
        Ok(IssuedCredential { token, claims })
    }

    /// Aggregate the subject's ACL from `directory`, then sign.
    pub async fn issue_for(
        &self,
        directory: &dyn AclDirectory,
        subject: &CredentialSubject,
    ) -> crate::error::Result<IssuedCredential> {
        let acl = AclAggregator::resolve(directory, subject.tenant_id, subject.user_id).await?;
        let credential = self.issue(subject, Some(&acl))?;

        info!(
            user_id = %subject.user_id,
            tenant_id = %subject.tenant_id,
            entities = acl.len(),
            "Issued credential with ACL snapshot"
        );
        Ok(credential)
    }

    /// Check signature, expiry and issuer.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Credential validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }

    /// [`verify`](Self::verify), then parse into identity claims.
    pub fn authenticate(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        self.verify(token)
            .map(|claims| IdentityClaims::from_token_claims(&claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{AclEntry, Entitlement, EntitlementSet, InMemoryAclDirectory, RoleId};

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(&AuthConfig::with_secret("unit-test-secret")).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            CredentialIssuer::new(&AuthConfig::default()),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_issue_and_authenticate() {
        let issuer = issuer();
        let subject = CredentialSubject::new(TenantId::new(), UserId::new());
        let acl = Acl::new(vec![AclEntry::new("Books", EntitlementSet::READ)]);

        let credential = issuer.issue(&subject, Some(&acl)).unwrap();
        let identity = issuer.authenticate(&credential.token).unwrap();

        assert_eq!(identity.user_id, Some(subject.user_id));
        assert_eq!(identity.tenant_id, Some(subject.tenant_id));
        assert_eq!(identity.acl, Some(acl));
        assert!(!identity.is_super_admin);
    }

    #[test]
    fn test_issue_without_acl_omits_claim() {
        let issuer = issuer();
        let subject = CredentialSubject::new(TenantId::new(), UserId::new()).super_admin();
        let credential = issuer.issue(&subject, None).unwrap();

        assert!(credential.claims.user_in_role.is_none());
        let identity = issuer.authenticate(&credential.token).unwrap();
        assert!(identity.acl.is_none());
        assert!(identity.is_super_admin);
    }

    #[test]
    fn test_wrong_secret_and_garbage_are_invalid() {
        let credential = issuer()
            .issue(&CredentialSubject::new(TenantId::new(), UserId::new()), None)
            .unwrap();
        let other = CredentialIssuer::new(&AuthConfig::with_secret("another-secret")).unwrap();

        assert!(matches!(other.verify(&credential.token), Err(AuthError::InvalidToken)));
        assert!(matches!(other.verify("not.a.token"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let claims = TokenClaims {
            user_id: Some(UserId::new().to_string()),
            tenant_id: None,
            is_super_admin: false,
            user_in_role: None,
            jti: "expired".into(),
            iat: 0,
            exp: 1,
            iss: None,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding_key).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_issue_for_snapshots_directory() {
        let directory = InMemoryAclDirectory::new();
        let (tenant, user, role) = (TenantId::new(), UserId::new(), RoleId::new());
        directory.assign_role(tenant, user, role);
        directory.grant_by_name(tenant, role, "Books", EntitlementSet::READ);

        let issuer = issuer();
        let subject = CredentialSubject::new(tenant, user);
        let credential = issuer.issue_for(&directory, &subject).await.unwrap();

        directory.revoke_role(tenant, user, role);

        let identity = issuer.authenticate(&credential.token).unwrap();
        let acl = identity.acl.unwrap();
        assert!(acl.allows("Books", Entitlement::Read));
    }
}
