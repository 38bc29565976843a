use crate::{
    auth::AuthenticatedPrincipal,
    error::AppError,
    models::{Task, TaskInput, TaskPatch, TaskQuery},
    store::Store,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use super::parse_updates;

const TASK_FIELDS: &[&str] = &["description", "completed"];

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false`.
/// - `limit` (optional): page size, capped at 100.
/// - `skip` (optional): number of tasks to skip.
/// - `sortBy` (optional): `<field>:<asc|desc>` where field is one of
///   `createdAt`, `updatedAt`, `description`, `completed`. Defaults to
///   `createdAt:asc`.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `400 Bad Request`: If a query parameter is malformed.
/// - `401 Unauthorized`: If the request lacks a valid session token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn Store>,
    query_params: web::Query<TaskQuery>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let filter = query_params.into_inner().into_filter()?;
    let tasks = store.list_tasks(principal.user_id(), &filter).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `description`: 1 to 1000 characters (required).
/// - `completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task`.
/// - `400 Bad Request`: If the body is not valid JSON or has unknown fields.
/// - `422 Unprocessable Entity`: If the description is empty or too long.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    task_data: web::Json<TaskInput>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let mut input = task_data.into_inner();
    input.description = input.description.trim().to_string();
    input.validate()?;

    let task = Task::new(input, principal.user_id());
    let created = store.insert_task(&task).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Retrieves one of the authenticated user's tasks. Tasks owned by someone
/// else are reported as not found.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let task = store
        .find_task(task_id.into_inner(), principal.user_id())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Only `description` and `completed` may be sent.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task`.
/// - `400 Bad Request`: `"Invalid updates!"` if any other field is present.
/// - `404 Not Found`: If the task does not exist or is not owned by the user.
/// - `422 Unprocessable Entity`: If the new description is invalid.
#[patch("/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    body: web::Json<serde_json::Value>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let mut patch: TaskPatch = parse_updates(body.into_inner(), TASK_FIELDS)?;
    patch.description = patch.description.map(|d| d.trim().to_string());
    patch.validate()?;

    let task = store
        .update_task(task_id.into_inner(), principal.user_id(), &patch)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes one of the authenticated user's tasks and returns it.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    principal: AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let task = store
        .delete_task(task_id.into_inner(), principal.user_id())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}
