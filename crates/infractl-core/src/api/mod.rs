//! HTTP client for the infractl API.
//!
//! Every request is gated on `CliSettings::api_enabled`. Non-success
//! responses are treated as "no data" rather than errors; transport failures
//! are errors.

pub mod events;
pub mod routes;
pub mod schema;

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::WorkspaceEntry;
use crate::settings::CliSettings;

pub use events::{EventResponse, EventWorkspace, WorkspaceEvent};
pub use schema::Session;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiClient {
    settings: CliSettings,
    http: reqwest::Client,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: CliSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("infractl/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            settings,
            http,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.api_enabled
    }

    pub fn settings(&self) -> &CliSettings {
        &self.settings
    }

    fn endpoint(&self, route: &str) -> anyhow::Result<Url> {
        self.settings
            .api_url
            .join(route)
            .with_context(|| format!("Invalid API route: {route}"))
    }

    fn ensure_enabled(&self) -> anyhow::Result<()> {
        if !self.settings.api_enabled {
            anyhow::bail!("API access is disabled (INFRACTL_API_ENABLED=false)");
        }
        Ok(())
    }

    async fn post_json<B, R>(&self, route: &str, body: &B) -> anyhow::Result<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(route)?;
        let mut request = self.http.post(url.clone()).json(body);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;
        if !response.status().is_success() {
            tracing::debug!("Invalid response from {}: HTTP {}", url, response.status());
            return Ok(None);
        }

        let parsed = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))?;
        Ok(Some(parsed))
    }

    /// Exchange the temporary token delivered by the browser sign-in flow.
    pub async fn authenticate(&self, temp_token: &str) -> anyhow::Result<Option<Session>> {
        self.ensure_enabled()?;
        tracing::debug!("Authenticating with temporary token");
        self.post_json(
            routes::USER_AUTHENTICATE,
            &schema::TokenExchangeRequest { token: temp_token },
        )
        .await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Option<Session>> {
        self.ensure_enabled()?;
        tracing::debug!("Signing in {}", email);
        self.post_json(routes::USER_SIGN_IN, &schema::SignInRequest { email, password })
            .await
    }

    /// Workspaces registered to the authenticated user.
    pub async fn workspaces(&self) -> anyhow::Result<Vec<WorkspaceEntry>> {
        self.ensure_enabled()?;
        let token = self
            .auth_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not signed in, run `infractl auth` first"))?;

        let url = self.endpoint(routes::USER_WORKSPACES)?;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to list workspaces: HTTP {} from {}", response.status(), url);
        }

        let remote: Vec<schema::RemoteWorkspace> = response
            .json()
            .await
            .context("Failed to parse workspace list")?;
        Ok(remote
            .into_iter()
            .map(|ws| WorkspaceEntry {
                name: ws.name,
                id: ws.id,
                git_url: ws.git_url,
                synced_at: None,
            })
            .collect())
    }
}
