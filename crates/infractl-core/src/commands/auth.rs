//! Sign-in, workspace sync and sign-out.
//!
//! All network calls are async; this command drives them on a dedicated tokio
//! runtime so the CLI can stay synchronous.

use chrono::Utc;
use url::Url;

use crate::api::{ApiClient, Session};
use crate::auth;
use crate::config::{CliConfigStore, UserProfile};

/// Outcome of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignInReport {
    pub user: UserProfile,
    /// Number of workspaces stored after syncing
    pub workspaces: usize,
    /// False when the workspace sync failed and the previous list was kept
    pub synced: bool,
}

#[derive(Debug, Clone)]
pub struct AuthCommand {
    store: CliConfigStore,
    api: ApiClient,
}

impl AuthCommand {
    pub fn new(store: CliConfigStore, api: ApiClient) -> Self {
        Self { store, api }
    }

    pub fn store(&self) -> &CliConfigStore {
        &self.store
    }

    /// Browser sign-in.
    ///
    /// Binds the callback listener, hands the sign-in URL to `announce` and
    /// waits for the web app to redirect back with a temporary token. Returns
    /// `Ok(None)` when no token arrived or the token was rejected.
    pub fn login_with_browser(
        &self,
        announce: impl FnOnce(&Url),
    ) -> anyhow::Result<Option<SignInReport>> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;

        let settings = self.api.settings().clone();
        let session = runtime.block_on(async {
            let listener = auth::bind_callback_listener(settings.auth_port).await?;
            let port = listener.local_addr()?.port();
            announce(&auth::signin_url(&settings.signin_url, port));

            let Some(token) = auth::receive_token(listener, settings.auth_timeout).await else {
                return Ok::<_, anyhow::Error>(None);
            };
            self.api.authenticate(&token).await
        })?;

        match session {
            Some(session) => self.complete_sign_in(&runtime, session).map(Some),
            None => {
                tracing::error!("Could not authenticate, please run `infractl auth` again");
                Ok(None)
            }
        }
    }

    /// Email and password sign-in.
    pub fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Option<SignInReport>> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;

        match runtime.block_on(self.api.sign_in(email, password))? {
            Some(session) => self.complete_sign_in(&runtime, session).map(Some),
            None => {
                tracing::error!("Could not sign in {}, check your credentials", email);
                Ok(None)
            }
        }
    }

    /// Refresh the stored workspace list for the signed-in user.
    pub fn sync_workspaces(&self) -> anyhow::Result<usize> {
        let mut config = self.store.load_or_default()?;
        let Some(token) = config.auth_token.clone() else {
            anyhow::bail!("Not signed in, run `infractl auth` first");
        };

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        let api = self.api.clone().with_auth_token(token);
        let workspaces = runtime.block_on(api.workspaces())?;

        let count = workspaces.len();
        config.replace_workspaces(workspaces, Utc::now());
        self.store.save(&config)?;
        Ok(count)
    }

    /// Forget the stored user, token and workspaces. Backend hooks are kept.
    pub fn sign_out(&self) -> anyhow::Result<bool> {
        let Some(mut config) = self.store.load_saved()? else {
            return Ok(false);
        };
        let was_signed_in = config.user.is_some() || config.auth_token.is_some();
        config.sign_out();
        self.store.save(&config)?;
        Ok(was_signed_in)
    }

    fn complete_sign_in(
        &self,
        runtime: &tokio::runtime::Runtime,
        session: Session,
    ) -> anyhow::Result<SignInReport> {
        let mut config = self.store.load_or_default()?;
        config.user = Some(session.user.clone());
        config.auth_token = Some(session.token.clone());

        let api = self.api.clone().with_auth_token(session.token);
        let synced = match runtime.block_on(api.workspaces()) {
            Ok(workspaces) => {
                config.replace_workspaces(workspaces, Utc::now());
                true
            }
            Err(e) => {
                tracing::warn!("Could not sync workspaces: {e:#}");
                false
            }
        };

        self.store.save(&config)?;
        tracing::info!("Signed in as {}", session.user.email);

        Ok(SignInReport {
            user: session.user,
            workspaces: config.workspaces.len(),
            synced,
        })
    }
}
