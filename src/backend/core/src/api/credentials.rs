//! Credential issue backed by the ACL directory.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ApiResponse, AppState};
use crate::acl::{TenantId, UserId};
use crate::auth::{AuthorizationDecision, CredentialSubject, DecisionReason, IdentityClaims};
use crate::error::TesseraError;
use crate::gate::GateError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    #[serde(default)]
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub jti: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `POST /auth/token`
///
/// Aggregates the user's ACL from the directory and signs it into a new
/// credential. Only super admins may issue credentials for others.
pub async fn issue_token(
    State(state): State<AppState>,
    caller: IdentityClaims,
    Json(request): Json<TokenRequest>,
) -> Result<(StatusCode, ApiResponse<TokenResponse>), GateError> {
    if !caller.is_super_admin {
        let decision = AuthorizationDecision::deny(DecisionReason::SuperAdminRequired);
        warn!(
            user_id = ?caller.user_id,
            reason = %decision.reason,
            "Credential issue denied"
        );
        return Err(GateError::Forbidden(decision));
    }

    if request.user_id.is_nil() {
        return Err(TesseraError::validation("userId must not be the nil UUID").into());
    }

    let mut subject = CredentialSubject::new(request.tenant_id, request.user_id);
    subject.is_super_admin = request.is_super_admin;

    let credential = state
        .issuer
        .issue_for(state.directory.as_ref(), &subject)
        .await?;

    info!(
        issued_by = ?caller.user_id,
        user_id = %subject.user_id,
        tenant_id = %subject.tenant_id,
        jti = %credential.claims.jti,
        "Credential issued"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::success(TokenResponse {
            expires_at: credential.claims.expires_at(),
            jti: credential.claims.jti,
            token: credential.token,
            token_type: "Bearer".to_string(),
        }),
    ))
}
