//! Authentication and access policy.
//!
//! [`CredentialIssuer`] signs credentials carrying an ACL snapshot,
//! [`AuthLayer`] verifies them per request and parses them into
//! [`IdentityClaims`], and [`policy::authorize`] decides each gated action.

pub mod claims;
pub mod layer;
pub mod policy;
pub mod token;

pub use claims::{IdentityClaims, TokenClaims};
pub use layer::{AuthLayer, AuthService};
pub use policy::{authorize, evaluate, AuthorizationDecision, DecisionReason};
pub use token::{AuthError, CredentialIssuer, CredentialSubject, IssuedCredential};
