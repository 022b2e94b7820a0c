//! Record store port.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::user::{Filter, User};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port for user record persistence.
///
/// `find_one` distinguishes a found record (`Ok(Some)`), no record
/// (`Ok(None)`) and a failing store (`Err`).
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the first record selected by `filter`.
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<User>>;

    /// Insert a new record.
    async fn insert_one(&self, user: &User) -> StoreResult<()>;

    /// Delete the first record selected by `filter` and return how many
    /// records were removed.
    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;
}
