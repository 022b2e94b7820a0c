//! In-process record store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::user::{Filter, StoreResult, User, UserRepository};

/// [`UserRepository`] keeping records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    unique_names: bool,
    fault: Option<String>,
}

impl MemoryStore {
    /// Create an empty [`MemoryStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts whose `name` is already stored.
    pub fn unique_names(mut self) -> Self {
        self.unique_names = true;
        self
    }

    /// A store failing every operation with `detail`.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            fault: Some(detail.into()),
            ..Default::default()
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self) -> StoreResult<()> {
        match &self.fault {
            Some(detail) => Err(StoreError::Unavailable(detail.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<User>> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|user| filter.matches(user)).cloned())
    }

    async fn insert_one(&self, user: &User) -> StoreResult<()> {
        self.check()?;
        let mut users = self.users.write().await;
        if self.unique_names && users.iter().any(|u| u.name == user.name) {
            return Err(StoreError::Duplicate(format!(
                "name: \"{}\"",
                user.name
            )));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        self.check()?;
        let mut users = self.users.write().await;
        match users.iter().position(|user| filter.matches(user)) {
            Some(index) => {
                users.remove(index);
                Ok(1)
            },
            None => Ok(0),
        }
    }
}
