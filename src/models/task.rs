use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Largest page a single listing may return.
pub const MAX_PAGE_SIZE: i64 = 100;

lazy_static! {
    // sortBy=<field>:<direction>, direction optional
    static ref SORT_BY_REGEX: Regex =
        Regex::new(r"^(createdAt|updatedAt|description|completed)(?::(asc|desc))?$").unwrap();
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskInput {
    /// What needs doing. Between 1 and 1000 characters once trimmed.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,

    /// Defaults to `false` when omitted.
    #[serde(default)]
    pub completed: bool,
}

/// Partial update for a task. Only `description` and `completed` may change;
/// any other key is rejected while deserializing.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub description: String,
    pub completed: bool,
    /// Identifier of the user who owns the task.
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `owner`, trimming the description.
    pub fn new(input: TaskInput, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            completed: input.completed,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch in place.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(description) = &patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Description => "description",
            SortField::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Store-level listing options, already validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: i64,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

/// Query parameters accepted by `GET /tasks`.
///
/// `GET /tasks?completed=true`, `GET /tasks?limit=10&skip=20`,
/// `GET /tasks?sortBy=createdAt:desc`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl TaskQuery {
    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let limit = match self.limit {
            Some(limit) if limit <= 0 => {
                return Err(AppError::BadRequest("limit must be positive".into()))
            }
            Some(limit) => Some(limit.min(MAX_PAGE_SIZE)),
            None => None,
        };

        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(AppError::BadRequest("skip must not be negative".into()));
        }

        let (sort_field, sort_order) = match self.sort_by.as_deref() {
            None | Some("") => (SortField::default(), SortOrder::default()),
            Some(raw) => parse_sort_by(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid sortBy: {}", raw)))?,
        };

        Ok(TaskFilter {
            completed: self.completed,
            limit,
            skip,
            sort_field,
            sort_order,
        })
    }
}

fn parse_sort_by(raw: &str) -> Option<(SortField, SortOrder)> {
    let captures = SORT_BY_REGEX.captures(raw)?;
    let field = match &captures[1] {
        "createdAt" => SortField::CreatedAt,
        "updatedAt" => SortField::UpdatedAt,
        "description" => SortField::Description,
        _ => SortField::Completed,
    };
    let order = match captures.get(2).map(|m| m.as_str()) {
        Some("desc") => SortOrder::Desc,
        _ => SortOrder::Asc,
    };
    Some((field, order))
}
