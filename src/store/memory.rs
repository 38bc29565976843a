use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::task::{SortField, SortOrder};
use crate::models::{Avatar, IssuedToken, Task, TaskFilter, TaskPatch, User, UserChanges};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    avatars: HashMap<Uuid, Avatar>,
    tasks: HashMap<Uuid, Task>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

/// In-process store. Every operation takes the lock once, so each token-list
/// mutation is applied atomically with respect to other requests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} already exists",
                user.email
            )));
        }
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_with_token(&self, id: Uuid, token: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .get(&id)
            .filter(|user| user.has_token(token))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {} already exists", email)));
            }
        }
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(age) = changes.age {
            user.age = age;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.tasks.values().any(|task| task.owner == id) {
            return Err(StoreError::Database(format!(
                "user {} still owns tasks",
                id
            )));
        }
        state.users.remove(&id).ok_or(StoreError::NotFound)?;
        state.avatars.remove(&id);
        Ok(())
    }

    async fn add_token(&self, user_id: Uuid, token: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.tokens.push(IssuedToken {
            token: token.to_string(),
        });
        Ok(())
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = user.tokens.len();
        user.tokens.retain(|issued| issued.token != token);
        Ok(user.tokens.len() != before)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(0);
        };
        let removed = user.tokens.len() as u64;
        user.tokens.clear();
        Ok(removed)
    }

    async fn set_avatar(&self, user_id: Uuid, avatar: Option<&Avatar>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        match avatar {
            Some(avatar) => {
                state.avatars.insert(user_id, avatar.clone());
            }
            None => {
                state.avatars.remove(&user_id);
            }
        }
        Ok(())
    }

    async fn find_avatar(&self, user_id: Uuid) -> StoreResult<Option<Avatar>> {
        Ok(self.state.read().await.avatars.get(&user_id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<Task> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&task.owner) {
            return Err(StoreError::NotFound);
        }
        if state.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(format!("task {} already exists", task.id)));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.owner == owner)
            .filter(|task| filter.completed.map_or(true, |c| task.completed == c))
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            let ordering = match filter.sort_field {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Description => a.description.cmp(&b.description),
                SortField::Completed => a.completed.cmp(&b.completed),
            }
            .then_with(|| a.id.cmp(&b.id));
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let skip = usize::try_from(filter.skip).unwrap_or(0);
        let limit = filter
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        Ok(tasks.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .get(&id)
            .filter(|task| task.owner == owner)
            .cloned())
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        match state.tasks.get_mut(&id) {
            Some(task) if task.owner == owner => {
                task.apply(patch);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid, owner: Uuid) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        let owned = state
            .tasks
            .get(&id)
            .map_or(false, |task| task.owner == owner);
        if !owned {
            return Ok(None);
        }
        Ok(state.tasks.remove(&id))
    }

    async fn delete_tasks_by_owner(&self, owner: Uuid) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|_, task| task.owner != owner);
        Ok((before - state.tasks.len()) as u64)
    }
}
