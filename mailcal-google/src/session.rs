//! Creates a valid Google session (access token) for the Gmail and Calendar APIs.
//!
//! One account per installation, stored at:
//!   ~/.config/mailcal/google/session.toml

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app_config::{AppConfig, base_dir};

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub struct Session {
    path: PathBuf,
    data: SessionData,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    account_email: String,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(account_email: &str, access_token: &str, refresh_token: &str, expires_in: i64) -> Self {
        SessionData {
            account_email: account_email.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    pub fn from_tokens(account_email: &str, tokens: &AccessToken) -> Self {
        Self::new(
            account_email,
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_in,
        )
    }
}

impl Session {
    pub fn default_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("session.toml"))
    }

    pub fn exists() -> Result<bool> {
        Ok(Self::default_path()?.exists())
    }

    pub fn new(path: &Path, data: SessionData) -> Self {
        Session {
            path: path.to_path_buf(),
            data,
        }
    }

    pub fn account_email(&self) -> &str {
        &self.data.account_email
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load the session and refresh it if it is (about to be) expired.
    pub async fn load_valid_from(path: &Path) -> Result<Self> {
        let mut session = Self::load_from(path)?;

        if session.needs_refresh(Utc::now()) {
            session.refresh().await?;
        }

        Ok(session)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Not logged in to Google.\n\
                Run `mailcal auth` or use the \"Connect Google\" link in the web UI."
            );
        }

        let contents = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read Google OAuth session from {}",
                path.display()
            )
        })?;

        let data: SessionData = toml::from_str(&contents).with_context(|| {
            format!(
                "Failed to parse Google OAuth session from {}",
                path.display()
            )
        })?;

        Ok(Session {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    /// Google Calendar client carrying this session's tokens.
    pub fn calendar_client(&self) -> Result<Client> {
        let app_config = AppConfig::load()?;

        Ok(Client::new(
            app_config.client_id,
            app_config.client_secret,
            String::new(),
            self.data.access_token.clone(),
            self.data.refresh_token.clone(),
        ))
    }

    async fn refresh(&mut self) -> Result<()> {
        info!(account = %self.data.account_email, "access token expired, refreshing");

        let client = self.calendar_client()?;

        let tokens = client
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        self.apply_refresh(&tokens.access_token, &tokens.refresh_token, tokens.expires_in);
        self.save()
    }

    fn apply_refresh(&mut self, access_token: &str, refresh_token: &str, expires_in: i64) {
        self.data.access_token = access_token.to_string();
        self.data.expires_at = Utc::now() + Duration::seconds(expires_in);

        // Google typically doesn't return a new refresh_token on refresh
        if !refresh_token.is_empty() {
            self.data.refresh_token = refresh_token.to_string();
        }
    }
}
