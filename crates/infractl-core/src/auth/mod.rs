//! Browser sign-in: a short-lived local axum server that receives the
//! temporary token the web app redirects back with.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

const PORT_ATTEMPTS: u16 = 20;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SIGNED_IN_PAGE: &str =
    "<html><body><h3>Signed in. You can close this window and return to the terminal.</h3></body></html>";
const MISSING_TOKEN_PAGE: &str =
    "<html><body><h3>No sign-in token received. Please try again.</h3></body></html>";

/// Sign-in page URL telling the web app where to deliver the token.
pub fn signin_url(base: &Url, port: u16) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("source", "cli")
        .append_pair("action", "signin")
        .append_pair("redirecturi", &format!("http://localhost:{port}/"));
    url
}

/// Try to open `url` in the default browser.
pub fn open_in_browser(url: &Url) -> bool {
    match open::that(url.as_str()) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Failed to launch browser: {}", e);
            false
        }
    }
}

/// Bind the callback listener on the first free port from `preferred`,
/// falling back to an OS-assigned port.
pub async fn bind_callback_listener(preferred: u16) -> anyhow::Result<TcpListener> {
    for offset in 0..PORT_ATTEMPTS {
        let Some(port) = preferred.checked_add(offset) else {
            break;
        };
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => tracing::debug!("Port {} unavailable: {}", port, e),
        }
    }
    TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("Failed to bind sign-in callback listener")
}

/// Serve the callback on `listener` until a token arrives or `timeout`
/// elapses.
///
/// Requests without a token are answered with 400 and the server keeps
/// waiting, so stray requests (favicon, speculative preconnects) never end
/// the sign-in.
pub async fn receive_token(listener: TcpListener, timeout: Duration) -> Option<String> {
    let (token_tx, token_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let router = callback_router(token_tx);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let token = match tokio::time::timeout(timeout, token_rx).await {
        Ok(Ok(token)) => Some(token),
        Ok(Err(_)) => {
            tracing::warn!("Sign-in callback server stopped before a token arrived");
            None
        }
        Err(_) => {
            tracing::warn!("Timed out waiting for sign-in after {}s", timeout.as_secs());
            None
        }
    };

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::debug!("Sign-in callback server error: {}", e),
        Ok(Err(e)) => tracing::debug!("Sign-in callback server task failed: {}", e),
        Err(_) => {
            tracing::debug!("Dropping idle sign-in callback connections");
            server.abort();
        }
    }
    token
}

#[derive(Debug, Default, Deserialize)]
struct TokenParams {
    #[serde(default)]
    token: Option<String>,
}

/// Hands the first token received to the waiting sign-in.
#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl CallbackState {
    fn deliver(&self, token: Option<String>) -> (StatusCode, Html<&'static str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return (StatusCode::BAD_REQUEST, Html(MISSING_TOKEN_PAGE));
        };
        if let Ok(mut slot) = self.sender.lock()
            && let Some(sender) = slot.take()
        {
            let _ = sender.send(token);
        }
        (StatusCode::OK, Html(SIGNED_IN_PAGE))
    }
}

fn callback_router(sender: oneshot::Sender<String>) -> Router {
    let state = CallbackState {
        sender: Arc::new(Mutex::new(Some(sender))),
    };
    Router::new()
        .route("/", get(token_from_query).post(token_from_body))
        .with_state(state)
}

async fn token_from_query(
    State(state): State<CallbackState>,
    Query(params): Query<TokenParams>,
) -> (StatusCode, Html<&'static str>) {
    state.deliver(params.token)
}

async fn token_from_body(
    State(state): State<CallbackState>,
    Query(params): Query<TokenParams>,
    body: String,
) -> (StatusCode, Html<&'static str>) {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| parse_token_body(&body));
    state.deliver(token)
}

/// Extract `token` from a form-encoded or JSON request body.
pub fn parse_token_body(body: &str) -> Option<String> {
    let body = body.trim();
    let token = if body.starts_with('{') {
        serde_json::from_str::<TokenParams>(body).ok()?.token
    } else {
        url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    };
    token.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    async fn start(timeout: Duration) -> (String, tokio::task::JoinHandle<Option<String>>) {
        let listener = bind_callback_listener(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(receive_token(listener, timeout));
        (format!("http://127.0.0.1:{port}/"), server)
    }

    #[test]
    fn test_signin_url_encodes_redirect() {
        let base = Url::parse("https://infractl.dev/signin").unwrap();
        let url = signin_url(&base, 9191);
        assert_eq!(
            url.as_str(),
            "https://infractl.dev/signin?source=cli&action=signin&redirecturi=http%3A%2F%2Flocalhost%3A9191%2F"
        );
    }

    #[test]
    fn test_parse_token_body() {
        assert_eq!(parse_token_body("token=xyz%2B"), Some("xyz+".to_string()));
        assert_eq!(parse_token_body(r#"{"token": "j-1"}"#), Some("j-1".to_string()));
        assert_eq!(parse_token_body("token="), None);
        assert_eq!(parse_token_body(r#"{"token": 5}"#), None);
        assert_eq!(parse_token_body(""), None);
    }

    #[tokio::test]
    async fn test_receive_token_from_query() {
        let (base, server) = start(Duration::from_secs(5)).await;

        let response = client()
            .get(format!("{base}?token=from-browser"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.text().await.unwrap().contains("Signed in"));
        assert_eq!(server.await.unwrap(), Some("from-browser".to_string()));
    }

    #[tokio::test]
    async fn test_empty_connection_does_not_end_sign_in() {
        let (base, server) = start(Duration::from_secs(5)).await;
        let addr = base
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();

        // Browsers open connections ahead of time and may close them unused.
        drop(TcpStream::connect(&addr).await.unwrap());

        let response = client()
            .get(format!("{base}?token=real"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(server.await.unwrap(), Some("real".to_string()));
    }

    #[tokio::test]
    async fn test_requests_without_token_keep_waiting() {
        let (base, server) = start(Duration::from_secs(5)).await;
        let client = client();

        let favicon = client.get(format!("{base}favicon.ico")).send().await.unwrap();
        assert_eq!(favicon.status(), reqwest::StatusCode::NOT_FOUND);

        let empty = client.get(&base).send().await.unwrap();
        assert_eq!(empty.status(), reqwest::StatusCode::BAD_REQUEST);

        let form = client
            .post(&base)
            .header("content-type", "application/x-www-form-urlencoded")
            .body("token=xyz%2B")
            .send()
            .await
            .unwrap();
        assert_eq!(form.status(), reqwest::StatusCode::OK);

        assert_eq!(server.await.unwrap(), Some("xyz+".to_string()));
    }

    #[tokio::test]
    async fn test_receive_token_from_json_body() {
        let (base, server) = start(Duration::from_secs(5)).await;

        let response = client()
            .post(&base)
            .json(&serde_json::json!({"token": "j-1"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(server.await.unwrap(), Some("j-1".to_string()));
    }

    #[tokio::test]
    async fn test_receive_token_times_out() {
        let listener = bind_callback_listener(0).await.unwrap();
        let token = receive_token(listener, Duration::from_millis(50)).await;
        assert_eq!(token, None);
    }
}
