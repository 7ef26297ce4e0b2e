/// In-memory storage backend
///
/// Keeps everything in process memory behind one `parking_lot::RwLock`.
/// Each operation takes the lock once, so every mutation (including token
/// append and revoke) is atomic with respect to concurrent requests. Data is
/// lost on restart; use it for development and tests.
///
/// Active tokens are kept per user in an insertion-ordered set, plus a
/// token → owner index for constant-time authentication lookups.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::models::{
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug)]
struct UserEntry {
    user: User,
    tokens: IndexSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, UserEntry>,
    token_owners: HashMap<String, Uuid>,
    tasks: IndexMap<Uuid, Task>,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|entry| entry.user.email == email && Some(entry.user.id) != except)
    }
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write();

        if inner.email_taken(&data.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            age: data.age,
            created_at: now,
            updated_at: now,
        };

        inner.users.insert(
            user.id,
            UserEntry {
                user: user.clone(),
                tokens: IndexSet::new(),
            },
        );

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).map(|entry| entry.user.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|entry| entry.user.email == email)
            .map(|entry| entry.user.clone()))
    }

    async fn find_user_by_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read();

        if inner.token_owners.get(token) != Some(&id) {
            return Ok(None);
        }

        Ok(inner.users.get(&id).map(|entry| entry.user.clone()))
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write();

        if let Some(email) = data.email.as_deref() {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(entry) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        let user = &mut entry.user;
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(age) = data.age {
            user.age = age;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write();

        let Some(entry) = inner.users.remove(&id) else {
            return Ok(None);
        };

        for token in &entry.tokens {
            inner.token_owners.remove(token);
        }
        inner.tasks.retain(|_, task| task.author != id);

        Ok(Some(entry.user))
    }

    async fn add_token(&self, id: Uuid, token: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        if inner.token_owners.contains_key(token) {
            return Err(StoreError::DuplicateToken);
        }

        let entry = inner.users.get_mut(&id).ok_or(StoreError::UserNotFound)?;
        entry.tokens.insert(token.to_string());
        inner.token_owners.insert(token.to_string(), id);

        Ok(())
    }

    async fn remove_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        if inner.token_owners.get(token) != Some(&id) {
            return Ok(false);
        }

        inner.token_owners.remove(token);
        if let Some(entry) = inner.users.get_mut(&id) {
            entry.tokens.shift_remove(token);
        }

        Ok(true)
    }

    async fn clear_tokens(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write();

        let tokens = match inner.users.get_mut(&id) {
            Some(entry) => std::mem::take(&mut entry.tokens),
            None => return Ok(0),
        };

        for token in &tokens {
            inner.token_owners.remove(token);
        }

        Ok(tokens.len() as u64)
    }

    async fn count_tokens(&self, id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .get(&id)
            .map_or(0, |entry| entry.tokens.len() as u64))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut inner = self.inner.write();

        if !inner.users.contains_key(&data.author) {
            return Err(StoreError::UserNotFound);
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            description: data.description,
            completed: data.completed,
            author: data.author,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn list_tasks(&self, author: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .inner
            .read()
            .tasks
            .values()
            .filter(|task| task.author == author && filter.matches(task))
            .skip(filter.skip() as usize)
            .take(filter.limit() as usize)
            .cloned()
            .collect())
    }

    async fn find_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self
            .inner
            .read()
            .tasks
            .get(&id)
            .filter(|task| task.author == author)
            .cloned())
    }

    async fn update_task(
        &self,
        author: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write();

        let Some(task) = inner.tasks.get_mut(&id).filter(|task| task.author == author) else {
            return Ok(None);
        };

        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(completed) = data.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write();

        let owned = inner
            .tasks
            .get(&id)
            .is_some_and(|task| task.author == author);
        if !owned {
            return Ok(None);
        }

        Ok(inner.tasks.shift_remove(&id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
