use actix_multipart::Multipart;
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use futures::{StreamExt, TryStreamExt};
use log::debug;
use uuid::Uuid;

use super::parse_updates;
use crate::{
    accounts::Accounts,
    auth::{
        AuthMiddleware, AuthenticatedPrincipal, Authenticator, LoginRequest, RegisterRequest,
        UpdateProfileRequest,
    },
    error::AppError,
    models::{avatar::MAX_AVATAR_BYTES, Avatar},
    store::Store,
};

/// Message for any rejected avatar upload.
pub const AVATAR_REJECTED_MESSAGE: &str = "Please upload an image";

/// Name of the multipart form field carrying the avatar file.
pub const AVATAR_FIELD: &str = "avatar";

/// Registers a new account.
///
/// ## Responses:
/// - `201 Created`: `{ user, token }` for the new account's first session.
/// - `400 Bad Request`: If the body is not valid JSON.
/// - `422 Unprocessable Entity`: If validation fails or the email is taken.
#[post("/users")]
pub async fn register(
    accounts: web::Data<Accounts>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let response = accounts.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Logs in with email and password and opens an additional session.
///
/// ## Responses:
/// - `200 OK`: `{ user, token }`.
/// - `400 Bad Request`: `"Unable to login"` for any credential mismatch.
#[post("/users/login")]
pub async fn login(
    accounts: web::Data<Accounts>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = accounts.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Ends the session the request was authenticated with.
#[post("/users/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    authenticator: web::Data<Authenticator>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    authenticator.revoke_one(&principal).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Ends every session of the current user, including this one.
#[post("/users/logoutAll", wrap = "AuthMiddleware")]
pub async fn logout_all(
    authenticator: web::Data<Authenticator>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    authenticator.revoke_all(&principal.user).await?;
    Ok(HttpResponse::Ok().finish())
}

#[get("/users/me", wrap = "AuthMiddleware")]
pub async fn me(principal: AuthenticatedPrincipal) -> impl Responder {
    HttpResponse::Ok().json(principal.user)
}

/// Updates the current user's profile.
///
/// Only `name`, `email`, `password` and `age` may be sent; anything else is
/// answered with `400 {"error":"Invalid updates!"}` before any change is made.
#[patch("/users/me", wrap = "AuthMiddleware")]
pub async fn update_me(
    accounts: web::Data<Accounts>,
    principal: AuthenticatedPrincipal,
    body: web::Json<serde_json::Value>,
) -> Result<impl Responder, AppError> {
    let request: UpdateProfileRequest =
        parse_updates(body.into_inner(), UpdateProfileRequest::FIELDS)?;
    let user = accounts.update_profile(&principal.user, request).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Deletes the current user and every task it owns. Responds with the
/// deleted user.
#[delete("/users/me", wrap = "AuthMiddleware")]
pub async fn delete_me(
    accounts: web::Data<Accounts>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let user = accounts.delete_account(&principal.user).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Stores the `avatar` field of a `multipart/form-data` upload as the current
/// user's avatar.
///
/// The file must be a PNG or JPEG of at most `MAX_AVATAR_BYTES` bytes. Other
/// form fields are ignored.
#[post("/users/me/avatar", wrap = "AuthMiddleware")]
pub async fn upload_avatar(
    store: web::Data<dyn Store>,
    principal: AuthenticatedPrincipal,
    mut payload: Multipart,
) -> Result<impl Responder, AppError> {
    let bytes = read_avatar_field(&mut payload)
        .await?
        .ok_or_else(|| AppError::BadRequest(AVATAR_REJECTED_MESSAGE.into()))?;

    let avatar = Avatar::from_upload(bytes)
        .ok_or_else(|| AppError::BadRequest(AVATAR_REJECTED_MESSAGE.into()))?;
    debug!(
        "storing {} byte {} avatar for user {}",
        avatar.bytes.len(),
        avatar.content_type,
        principal.user_id()
    );
    store.set_avatar(principal.user_id(), Some(&avatar)).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Reads the first `avatar` field, capped at `MAX_AVATAR_BYTES`.
async fn read_avatar_field(payload: &mut Multipart) -> Result<Option<Vec<u8>>, AppError> {
    let malformed = |e: actix_multipart::MultipartError| AppError::BadRequest(e.to_string());

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.content_disposition().get_name() != Some(AVATAR_FIELD) {
            while field.try_next().await.map_err(malformed)?.is_some() {}
            continue;
        }

        let mut bytes = web::BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            if bytes.len() + chunk.len() > MAX_AVATAR_BYTES {
                return Err(AppError::BadRequest(AVATAR_REJECTED_MESSAGE.into()));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(bytes.to_vec()));
    }
    Ok(None)
}

#[delete("/users/me/avatar", wrap = "AuthMiddleware")]
pub async fn delete_avatar(
    store: web::Data<dyn Store>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    store.set_avatar(principal.user_id(), None).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Serves a user's avatar with its stored content type. Public.
///
/// ## Responses:
/// - `200 OK`: The image bytes.
/// - `404 Not Found`: Unknown user, malformed id, or no avatar set.
#[get("/users/{id}/avatar")]
pub async fn get_avatar(
    store: web::Data<dyn Store>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let avatar = store
        .find_avatar(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Avatar not found".into()))?;
    Ok(HttpResponse::Ok()
        .content_type(avatar.content_type)
        .body(avatar.bytes))
}
