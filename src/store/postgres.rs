use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::task::SortOrder;
use crate::models::{Avatar, IssuedToken, Task, TaskFilter, TaskPatch, User, UserChanges};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, created_at, updated_at";
const TASK_COLUMNS: &str = "id, description, completed, owner, created_at, updated_at";

/// Postgres-backed store. Issued tokens live in their own table, one row per
/// token, so adding or revoking a session is a single-row insert or delete.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations from `migrations/`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {}", e)))
    }

    async fn load_tokens(&self, mut user: User) -> StoreResult<User> {
        user.tokens = sqlx::query_as::<_, IssuedToken>(
            "SELECT token FROM user_tokens WHERE user_id = $1 ORDER BY id",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(user)
    }

    async fn load_optional_tokens(&self, user: Option<User>) -> StoreResult<Option<User>> {
        match user {
            Some(user) => Ok(Some(self.load_tokens(user).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, age, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.age)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.load_optional_tokens(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        self.load_optional_tokens(user).await
    }

    async fn find_user_with_token(&self, id: Uuid, token: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users u
             WHERE u.id = $1
               AND EXISTS (SELECT 1 FROM user_tokens t WHERE t.user_id = u.id AND t.token = $2)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        self.load_optional_tokens(user).await
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash),
                 age = COALESCE($5, age),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(&changes.password_hash)
            .bind(changes.age)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        self.load_tokens(user).await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn add_token(&self, user_id: Uuid, token: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO user_tokens (user_id, token)
             SELECT $1, $2 WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)",
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_avatar(&self, user_id: Uuid, avatar: Option<&Avatar>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET avatar = $2, avatar_content_type = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(avatar.map(|a| a.bytes.as_slice()))
        .bind(avatar.map(|a| a.content_type.as_str()))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_avatar(&self, user_id: Uuid) -> StoreResult<Option<Avatar>> {
        let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>)>(
            "SELECT avatar, avatar_content_type FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(match row {
            Some((Some(bytes), Some(content_type))) => Some(Avatar {
                content_type,
                bytes,
            }),
            _ => None,
        })
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, description, completed, owner, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            TASK_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.description)
            .bind(task.completed)
            .bind(task.owner)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let mut sql = format!("SELECT {} FROM tasks WHERE owner = $1", TASK_COLUMNS);
        let mut param_count = 2;

        if filter.completed.is_some() {
            sql.push_str(&format!(" AND completed = ${}", param_count));
            param_count += 1;
        }

        // Column and direction come from closed enums, never from the client.
        let direction = match filter.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(
            " ORDER BY {} {}, id {}",
            filter.sort_field.column(),
            direction,
            direction
        ));

        if filter.limit.is_some() {
            sql.push_str(&format!(" LIMIT ${}", param_count));
            param_count += 1;
        }
        sql.push_str(&format!(" OFFSET ${}", param_count));

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(owner);
        if let Some(completed) = filter.completed {
            query = query.bind(completed);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }
        query = query.bind(filter.skip);

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner = $2",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks
             SET description = COALESCE($3, description),
                 completed = COALESCE($4, completed),
                 updated_at = NOW()
             WHERE id = $1 AND owner = $2
             RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.description.as_deref().map(str::trim))
            .bind(patch.completed)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_tasks_by_owner(&self, owner: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
