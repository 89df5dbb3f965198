use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;
use mailcal_core::{AssistantConfig, RunReport};
use mailcal_google::Session;
use tokio::sync::Mutex;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    config: Arc<AssistantConfig>,
    session_path: PathBuf,
    /// Held for the whole of a run, so runs never overlap
    run_lock: Arc<Mutex<()>>,
    last_report: Arc<Mutex<Option<RunReport>>>,
    /// `state` of the consent URL handed out most recently
    pending_oauth: Arc<StdMutex<Option<String>>>,
}

impl AppState {
    pub fn new(config: AssistantConfig) -> Result<Self> {
        Ok(Self::with_session_path(config, Session::default_path()?))
    }

    pub fn with_session_path(config: AssistantConfig, session_path: PathBuf) -> Self {
        AppState {
            config: Arc::new(config),
            session_path,
            run_lock: Arc::new(Mutex::new(())),
            last_report: Arc::new(Mutex::new(None)),
            pending_oauth: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    /// Account email of the stored session, if any.
    pub fn account(&self) -> Option<String> {
        Session::load_from(&self.session_path)
            .ok()
            .map(|s| s.account_email().to_string())
    }

    pub fn run_lock(&self) -> Arc<Mutex<()>> {
        self.run_lock.clone()
    }

    pub async fn last_report(&self) -> Option<RunReport> {
        self.last_report.lock().await.clone()
    }

    pub async fn set_last_report(&self, report: RunReport) {
        *self.last_report.lock().await = Some(report);
    }

    /// Where Google sends the browser back to after consent.
    ///
    /// Same address the server listens on; a wildcard bind is reached over loopback.
    pub fn redirect_uri(&self) -> String {
        let server = &self.config.server;
        let mut addr = server
            .socket_addr()
            .unwrap_or_else(|_| SocketAddr::from((Ipv4Addr::LOCALHOST, server.port)));
        if addr.ip().is_unspecified() {
            addr.set_ip(Ipv4Addr::LOCALHOST.into());
        }
        format!("http://{addr}/auth/google/callback")
    }

    pub fn remember_oauth_state(&self, state: String) {
        if let Ok(mut pending) = self.pending_oauth.lock() {
            *pending = Some(state);
        }
    }

    /// Consume the remembered state; true if it matches `state`.
    pub fn take_oauth_state(&self, state: &str) -> bool {
        self.pending_oauth
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
            .is_some_and(|expected| expected == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailcal_core::ServerConfig;

    fn with_server(host: &str, port: u16) -> AppState {
        let config = AssistantConfig {
            server: ServerConfig {
                host: host.into(),
                port,
            },
            ..Default::default()
        };
        AppState::with_session_path(config, PathBuf::from("session.toml"))
    }

    #[test]
    fn redirect_uri_matches_listen_address() {
        assert_eq!(
            with_server("127.0.0.1", 3000).redirect_uri(),
            "http://127.0.0.1:3000/auth/google/callback"
        );
        assert_eq!(
            with_server("0.0.0.0", 8080).redirect_uri(),
            "http://127.0.0.1:8080/auth/google/callback"
        );
        assert_eq!(
            with_server("::1", 3000).redirect_uri(),
            "http://[::1]:3000/auth/google/callback"
        );
    }
}
