//! Check email and password against stored users.

use axum::Form;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub email: String,
    pub password: String,
}

/// Handler to check credentials.
pub async fn handler(
    State(state): State<AppState>,
    Form(body): Form<Body>,
) -> String {
    state
        .accounts
        .login(&body.email, &body.password)
        .await
        .to_string()
}
