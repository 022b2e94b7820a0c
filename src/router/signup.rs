//! Register a new user from the signup form.

use axum::Form;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::user::User;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub name: String,
    pub lname: String,
    pub email: String,
    pub password: String,
    pub cpassword: String,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Form(body): Form<Body>,
) -> String {
    let user = User {
        name: body.name,
        lname: body.lname,
        email: body.email,
        password: body.password,
    };

    state.accounts.signup(user, &body.cpassword).await.to_string()
}
