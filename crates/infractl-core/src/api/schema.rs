//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::config::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct TokenExchangeRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// An authenticated user together with the API token issued for them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteWorkspace {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub git_url: Option<String>,
}
