//! Signup, login and account deletion flows.

use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;
use crate::user::{Filter, User, UserRepository};

/// Account flows on top of a [`UserRepository`].
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
}

/// Result of [`AccountService::signup`].
#[derive(Debug)]
pub enum SignupOutcome {
    Created(String),
    AlreadyExists(String),
    PasswordMismatch,
    Failed(StoreError),
}

/// Result of [`AccountService::login`].
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Welcome(String),
    Rejected,
}

/// Result of [`AccountService::delete_account`].
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Failed(StoreError),
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Register `user` unless its name is taken.
    ///
    /// The name check runs before the password confirmation check.
    pub async fn signup(&self, user: User, confirm_password: &str) -> SignupOutcome {
        match self.repo.find_one(&Filter::Name(user.name.clone())).await {
            Ok(Some(_)) => return SignupOutcome::AlreadyExists(user.name),
            Ok(None) => (),
            Err(err) => {
                tracing::error!(error = %err, "name lookup failed");
                return SignupOutcome::Failed(err);
            },
        }

        if user.password != confirm_password {
            return SignupOutcome::PasswordMismatch;
        }

        match self.repo.insert_one(&user).await {
            Ok(()) => {
                tracing::info!(name = %user.name, "user created");
                SignupOutcome::Created(user.name)
            },
            // lost a concurrent signup race against the unique index.
            Err(StoreError::Duplicate(_)) => SignupOutcome::AlreadyExists(user.name),
            Err(err) => {
                tracing::error!(error = %err, "user not created");
                SignupOutcome::Failed(err)
            },
        }
    }

    /// Check that a record matches both `email` and `password`.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        match self.repo.find_one(&Filter::credentials(email, password)).await {
            Ok(Some(_)) => LoginOutcome::Welcome(email.to_owned()),
            Ok(None) => LoginOutcome::Rejected,
            Err(err) => {
                tracing::error!(error = %err, "credentials lookup failed");
                LoginOutcome::Rejected
            },
        }
    }

    /// Remove the record matching both `email` and `password`.
    pub async fn delete_account(&self, email: &str, password: &str) -> DeleteOutcome {
        match self.repo.delete_one(&Filter::credentials(email, password)).await {
            Ok(0) => DeleteOutcome::NotFound,
            Ok(_) => {
                tracing::info!(%email, "account deleted");
                DeleteOutcome::Deleted
            },
            Err(err) => {
                tracing::error!(error = %err, "account not deleted");
                DeleteOutcome::Failed(err)
            },
        }
    }
}

impl fmt::Display for SignupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignupOutcome::Created(name) => write!(f, "User '{name}' created successfully"),
            SignupOutcome::AlreadyExists(name) => write!(f, "User '{name}' already exists"),
            SignupOutcome::PasswordMismatch => {
                f.write_str("Password and Confirm Password do not match")
            },
            SignupOutcome::Failed(err) => write!(f, "Error creating user: {err}"),
        }
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginOutcome::Welcome(email) => write!(f, "Welcome, {email}!"),
            LoginOutcome::Rejected => {
                f.write_str("Incorrect password or user not found in MongoDB")
            },
        }
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Deleted => f.write_str("Account deleted successfully"),
            DeleteOutcome::NotFound => f.write_str("User not found for deletion"),
            DeleteOutcome::Failed(err) => write!(f, "Error deleting account: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::database::MemoryStore;
    use crate::user::StoreResult;

    fn user(name: &str, email: &str, password: &str) -> User {
        User {
            name: name.into(),
            lname: "A".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone());

        let outcome = service.signup(user("Alice", "a@x.com", "p1"), "p1").await;
        assert_eq!(outcome.to_string(), "User 'Alice' created successfully");
        assert_eq!(store.len().await, 1);

        let stored = store.find_one(&Filter::Name("Alice".into())).await.unwrap();
        assert_eq!(stored.unwrap().lname, "A");

        assert_eq!(
            service.login("a@x.com", "p1").await,
            LoginOutcome::Welcome("a@x.com".into())
        );
    }

    #[tokio::test]
    async fn test_signup_password_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone());

        let outcome = service.signup(user("Alice", "a@x.com", "p1"), "p2").await;
        assert!(matches!(outcome, SignupOutcome::PasswordMismatch));
        assert_eq!(
            outcome.to_string(),
            "Password and Confirm Password do not match"
        );
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_collision_checked_before_password() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone());
        service.signup(user("Alice", "a@x.com", "p1"), "p1").await;

        let outcome = service.signup(user("Alice", "other@x.com", "p3"), "nope").await;
        assert_eq!(outcome.to_string(), "User 'Alice' already exists");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_name_comparison_is_case_sensitive() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone());
        service.signup(user("Alice", "a@x.com", "p1"), "p1").await;

        let outcome = service.signup(user("alice", "b@x.com", "p1"), "p1").await;
        assert!(matches!(outcome, SignupOutcome::Created(_)));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_unique_names_rejects_second_insert() {
        let store = Arc::new(MemoryStore::new().unique_names());
        store.insert_one(&user("Alice", "a@x.com", "p1")).await.unwrap();

        let err = store.insert_one(&user("Alice", "b@x.com", "p2")).await;
        assert!(matches!(err, Err(StoreError::Duplicate(_))));
    }

    /// Holds every name lookup until two signups have looked up, so both
    /// reach `insert_one` believing the name is free.
    struct LookupBarrier {
        inner: MemoryStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl UserRepository for LookupBarrier {
        async fn find_one(&self, filter: &Filter) -> StoreResult<Option<User>> {
            let found = self.inner.find_one(filter).await;
            self.barrier.wait().await;
            found
        }

        async fn insert_one(&self, user: &User) -> StoreResult<()> {
            self.inner.insert_one(user).await
        }

        async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
            self.inner.delete_one(filter).await
        }
    }

    /// Name always looks free, insert always collides.
    struct AlwaysDuplicate;

    #[async_trait]
    impl UserRepository for AlwaysDuplicate {
        async fn find_one(&self, _: &Filter) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn insert_one(&self, user: &User) -> StoreResult<()> {
            Err(StoreError::Duplicate(format!("name: \"{}\"", user.name)))
        }

        async fn delete_one(&self, _: &Filter) -> StoreResult<u64> {
            Ok(0)
        }
    }

    async fn race(inner: MemoryStore) -> (Vec<SignupOutcome>, Arc<LookupBarrier>) {
        let store = Arc::new(LookupBarrier {
            inner,
            barrier: Barrier::new(2),
        });
        let service = AccountService::new(store.clone());

        let (first, second) = tokio::join!(
            service.signup(user("Alice", "a@x.com", "p1"), "p1"),
            service.signup(user("Alice", "b@x.com", "p2"), "p2"),
        );
        (vec![first, second], store)
    }

    #[tokio::test]
    async fn test_insert_collision_reported_as_existing() {
        let service = AccountService::new(Arc::new(AlwaysDuplicate));

        let outcome = service.signup(user("Alice", "a@x.com", "p1"), "p1").await;
        assert!(matches!(outcome, SignupOutcome::AlreadyExists(_)));
        assert_eq!(outcome.to_string(), "User 'Alice' already exists");
    }

    #[tokio::test]
    async fn test_concurrent_signups_both_pass_without_unique_index() {
        let (outcomes, store) = race(MemoryStore::new()).await;

        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o, SignupOutcome::Created(_)))
        );
        assert_eq!(store.inner.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_signups_with_unique_index() {
        let (outcomes, store) = race(MemoryStore::new().unique_names()).await;

        let created = outcomes
            .iter()
            .filter(|o| matches!(o, SignupOutcome::Created(_)))
            .count();
        assert_eq!(created, 1);
        assert!(outcomes.iter().any(|o| o.to_string() == "User 'Alice' already exists"));
        assert_eq!(store.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store);
        service.signup(user("Alice", "a@x.com", "p1"), "p1").await;

        let wrong_password = service.login("a@x.com", "p2").await;
        let wrong_email = service.login("b@x.com", "p1").await;
        let neither = service.login("b@x.com", "p2").await;

        assert_eq!(wrong_password, LoginOutcome::Rejected);
        assert_eq!(wrong_email, wrong_password);
        assert_eq!(neither, wrong_password);
        assert_eq!(
            neither.to_string(),
            "Incorrect password or user not found in MongoDB"
        );
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone());
        service.signup(user("Alice", "a@x.com", "p1"), "p1").await;

        assert!(matches!(
            service.delete_account("a@x.com", "wrong").await,
            DeleteOutcome::NotFound
        ));

        let first = service.delete_account("a@x.com", "p1").await;
        assert_eq!(first.to_string(), "Account deleted successfully");
        let second = service.delete_account("a@x.com", "p1").await;
        assert_eq!(second.to_string(), "User not found for deletion");
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_store_failures() {
        let service = AccountService::new(Arc::new(MemoryStore::unavailable(
            "server selection timeout",
        )));

        assert_eq!(
            service.signup(user("Alice", "a@x.com", "p1"), "p1").await.to_string(),
            "Error creating user: server selection timeout"
        );
        assert_eq!(service.login("a@x.com", "p1").await, LoginOutcome::Rejected);
        assert_eq!(
            service.delete_account("a@x.com", "p1").await.to_string(),
            "Error deleting account: server selection timeout"
        );
    }
}
