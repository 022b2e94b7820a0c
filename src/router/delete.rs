//! Delete user matching email and password.

use axum::Form;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{AppState, ServerError};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub email: String,
    pub password: String,
}

/// `POST` and `DELETE` read a form body. `GET` reads the query string and
/// is only served while `delete.allow_get` is set.
pub async fn handler(
    State(state): State<AppState>,
    method: Method,
    body: std::result::Result<Form<Body>, FormRejection>,
) -> Result<String> {
    let allowed = match method {
        Method::POST | Method::DELETE => true,
        Method::GET => state.config.delete.allow_get,
        _ => false,
    };
    if !allowed {
        return Err(ServerError::MethodNotAllowed);
    }

    let Form(body) = body?;

    Ok(state
        .accounts
        .delete_account(&body.email, &body.password)
        .await
        .to_string())
}
