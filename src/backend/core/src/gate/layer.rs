//! Per-route entitlement enforcement.

use axum::{body::Body, extract::Request, response::Response};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use super::{forbidden_response, RequestGate};
use crate::acl::Entitlement;
use crate::auth::IdentityClaims;
use crate::schema::Entity;

/// Layer that requires `action` on `entity` before the wrapped route runs.
///
/// Reads the [`IdentityClaims`] inserted by the authentication layer; a
/// request without them is evaluated as anonymous and denied.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/books", post(create_book))
///     .route_layer(RequireEntitlementLayer::new("Books", Entitlement::Create));
/// ```
#[derive(Debug, Clone)]
pub struct RequireEntitlementLayer {
    entity: Arc<str>,
    action: Entitlement,
}

impl RequireEntitlementLayer {
    pub fn new(entity: impl Into<Arc<str>>, action: Entitlement) -> Self {
        Self {
            entity: entity.into(),
            action,
        }
    }

    pub fn for_entity<E: Entity>(action: Entitlement) -> Self {
        Self::new(E::NAME, action)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn action(&self) -> Entitlement {
        self.action
    }
}

impl<S> Layer<S> for RequireEntitlementLayer {
    type Service = RequireEntitlementService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireEntitlementService {
            inner,
            entity: self.entity.clone(),
            action: self.action,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireEntitlementService<S> {
    inner: S,
    entity: Arc<str>,
    action: Entitlement,
}

impl<S> Service<Request<Body>> for RequireEntitlementService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let entity = self.entity.clone();
        let action = self.action;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let claims = request
                .extensions()
                .get::<IdentityClaims>()
                .cloned()
                .unwrap_or_default();

            if RequestGate::authorize(&claims, &entity, action).is_err() {
                return Ok(forbidden_response());
            }

            inner.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Author;

    #[test]
    fn test_for_entity_uses_entity_name() {
        let layer = RequireEntitlementLayer::for_entity::<Author>(Entitlement::Update);
        assert_eq!(layer.entity(), "Authors");
        assert_eq!(layer.action(), Entitlement::Update);
    }
}
