mod repository;
mod service;

pub use repository::*;
pub use service::*;

use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

/// User as saved on database.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// First name. Checked for collisions on signup.
    pub name: String,
    pub lname: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("lname", &self.lname)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Exact-match conjunction selecting user records.
#[derive(Clone, PartialEq, Eq)]
pub enum Filter {
    /// Match on `name` only.
    Name(String),
    /// Match on both `email` and `password`.
    Credentials { email: String, password: String },
}

impl Filter {
    /// Create a [`Filter::Credentials`].
    pub fn credentials(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Filter::Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Whether `user` is selected by this filter.
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Filter::Name(name) => user.name == *name,
            Filter::Credentials { email, password } => {
                user.email == *email && user.password == *password
            },
        }
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Filter::Credentials { email, .. } => f
                .debug_struct("Credentials")
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

impl From<&Filter> for Document {
    fn from(filter: &Filter) -> Document {
        match filter {
            Filter::Name(name) => doc! { "name": name },
            Filter::Credentials { email, password } => {
                doc! { "email": email, "password": password }
            },
        }
    }
}
