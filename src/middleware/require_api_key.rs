/// Trusted-caller gate
///
/// For system integrations (the payment provider's webhook). The caller
/// proves possession of the shared key; no user identity is resolved.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::parse_api_key;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

pub struct RequireApiKey {
    settings: Arc<AuthSettings>,
}

impl RequireApiKey {
    pub fn new(settings: Arc<AuthSettings>) -> Self {
        Self { settings }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireApiKey
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireApiKeyService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireApiKeyService {
            service: Rc::new(service),
            settings: self.settings.clone(),
        }))
    }
}

pub struct RequireApiKeyService<S> {
    service: Rc<S>,
    settings: Arc<AuthSettings>,
}

impl<S> RequireApiKeyService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<(), AppError> {
        let key = parse_api_key(req.headers())?;
        // Plain equality, not constant-time.
        if key != self.settings.polka_key {
            return Err(AuthError::ApiKeyMismatch.into());
        }
        Ok(())
    }
}

impl<S, B> Service<ServiceRequest> for RequireApiKeyService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Err(e) = self.authenticate(&req) {
            return Box::pin(async move { Err(e.into()) });
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}
