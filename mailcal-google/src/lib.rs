//! Gmail and Google Calendar backends for mailcal.

pub mod app_config;
pub mod calendar;
pub mod gmail;
pub mod oauth;
pub mod session;

use anyhow::Result;
use std::path::Path;

pub use app_config::AppConfig;
pub use calendar::GoogleCalendar;
pub use gmail::GmailClient;
pub use session::Session;

/// Mailbox and calendar for the signed-in account, refreshing the token if needed.
pub async fn connect(session_path: &Path) -> Result<(Session, GmailClient, GoogleCalendar)> {
    let session = Session::load_valid_from(session_path).await?;
    let gmail = GmailClient::new(session.access_token());
    let calendar = GoogleCalendar::new(session.calendar_client()?);
    Ok((session, gmail, calendar))
}
