use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::Authenticator;
use crate::error::AppError;

/// Rejects requests without a live bearer token.
///
/// Wrap only the resources that need authentication. On success the resolved
/// [`AuthenticatedPrincipal`](crate::auth::AuthenticatedPrincipal) is stored in
/// the request extensions and the inner service runs; on failure the inner
/// service never runs and the client gets `401 {"error":"Please authenticate."}`.
///
/// Requires `web::Data<Authenticator>` in the app data.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let authenticator = match req.app_data::<web::Data<Authenticator>>().cloned() {
                Some(authenticator) => authenticator,
                None => {
                    let err =
                        AppError::InternalServerError("Authenticator is not configured".into());
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            // A header that is not valid visible ASCII is treated like a missing one.
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match authenticator.authenticate(header.as_deref()).await {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(e) => Ok(req.error_response(AppError::from(e)).map_into_right_body()),
            }
        })
    }
}
