use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::AuthenticatedPrincipal;
use crate::error::AppError;

/// Extracts the principal that `AuthMiddleware` stored in the request
/// extensions.
///
/// On a route the middleware does not wrap there is nothing to extract, and
/// the handler is answered with `AppError::Unauthorized`.
impl FromRequest for AuthenticatedPrincipal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedPrincipal>().cloned() {
            Some(principal) => ready(Ok(principal)),
            None => ready(Err(AppError::Unauthorized.into())),
        }
    }
}
