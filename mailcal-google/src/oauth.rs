//! Google OAuth: consent URL, code exchange, and the local callback used by the CLI.

use anyhow::{Context, Result};
use google_calendar::Client;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;

use crate::app_config::AppConfig;
use crate::gmail::GmailClient;
use crate::session::{Session, SessionData};

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Address the CLI listens on for the OAuth redirect.
pub const CALLBACK_HOST: &str = "127.0.0.1";
pub const CALLBACK_PORT: u16 = 8085;

pub fn local_redirect_uri() -> String {
    format!("http://{CALLBACK_HOST}:{CALLBACK_PORT}/callback")
}

/// A consent URL plus the `state` value Google will echo back.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub url: String,
    pub state: String,
}

fn client(app_config: &AppConfig, redirect_uri: &str) -> Client {
    Client::new(
        app_config.client_id.clone(),
        app_config.client_secret.clone(),
        redirect_uri.to_string(),
        String::new(),
        String::new(),
    )
}

pub fn authorization_url(app_config: &AppConfig, redirect_uri: &str) -> Result<AuthRequest> {
    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let mut url = client(app_config, redirect_uri).user_consent_url(&scopes);

    // Without these Google may omit the refresh token on re-consent
    if !url.contains("access_type=") {
        url.push_str("&access_type=offline");
    }
    if !url.contains("prompt=") {
        url.push_str("&prompt=consent");
    }

    let state = state_of(&url)?;
    Ok(AuthRequest { url, state })
}

fn state_of(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).context("Invalid consent URL")?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .context("Consent URL has no state parameter")
}

/// Exchange an authorization code for tokens and store the session.
/// Returns the account email.
pub async fn complete(
    app_config: &AppConfig,
    code: &str,
    state: &str,
    redirect_uri: &str,
    session_path: &Path,
) -> Result<String> {
    let mut client = client(app_config, redirect_uri);

    let tokens = client
        .get_access_token(code, state)
        .await
        .context("Failed to exchange code for tokens")?;

    if tokens.refresh_token.is_empty() {
        anyhow::bail!("Google did not return a refresh token. Revoke access and try again.");
    }

    let email = GmailClient::new(tokens.access_token.clone())
        .profile_email()
        .await?;

    Session::new(session_path, SessionData::from_tokens(&email, &tokens)).save()?;
    info!(account = %email, "google account connected");

    Ok(email)
}

/// Query parameters of an OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub code: String,
    pub state: String,
}

/// Parse the request target of an OAuth redirect, e.g. `/callback?code=..&state=..`.
pub fn parse_callback(target: &str) -> Result<Callback> {
    let url = url::Url::parse(&format!("http://localhost{target}"))
        .context("Invalid callback request")?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        anyhow::bail!("Google denied access: {error}");
    }

    Ok(Callback {
        code: param("code").context("No code in callback")?,
        state: param("state").context("No state in callback")?,
    })
}

/// Accept a single OAuth redirect on `port` and answer the browser.
pub async fn wait_for_callback(port: u16) -> Result<Callback> {
    let listener = TcpListener::bind((CALLBACK_HOST, port))
        .await
        .with_context(|| format!("Failed to bind to port {port}"))?;

    info!(port, "waiting for OAuth callback");

    loop {
        let (mut stream, _) = listener.accept().await.context("Failed to accept connection")?;

        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let Some(target) = request.lines().next().and_then(|l| l.split_whitespace().nth(1)) else {
            continue;
        };

        // Browsers also ask for /favicon.ico
        if !target.starts_with("/callback") {
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n")
                .await?;
            continue;
        }

        let result = parse_callback(target);
        let page = match &result {
            Ok(_) => "<h1>Authentication successful!</h1>\
                <p>You can close this window and return to the terminal.</p>"
                .to_string(),
            Err(e) => format!("<h1>Authentication failed</h1><p>{e}</p>"),
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n\
            Content-Type: text/html; charset=utf-8\r\n\
            Connection: close\r\n\
            \r\n\
            <html><body>{page}</body></html>"
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await?;

        return result;
    }
}
