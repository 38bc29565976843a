pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

pub const INVALID_UPDATES_MESSAGE: &str = "Invalid updates!";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::logout_all)
        .service(users::me)
        .service(users::update_me)
        .service(users::delete_me)
        .service(users::upload_avatar)
        .service(users::delete_avatar)
        .service(users::get_avatar)
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Parses a PATCH body, first checking that every key is in `allowed`.
///
/// A body that is not an object, or that names any other field, is rejected
/// with `"Invalid updates!"` so nothing is applied.
pub fn parse_updates<T: DeserializeOwned>(body: Value, allowed: &[&str]) -> Result<T, AppError> {
    let valid = match &body {
        Value::Object(fields) => fields.keys().all(|key| allowed.contains(&key.as_str())),
        _ => false,
    };
    if !valid {
        return Err(AppError::BadRequest(INVALID_UPDATES_MESSAGE.into()));
    }
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}
