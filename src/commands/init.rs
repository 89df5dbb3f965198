use std::path::Path;

use anyhow::Result;
use mailcal_core::AssistantConfig;
use mailcal_google::{AppConfig, Session};

pub fn run() -> Result<()> {
    let path = AssistantConfig::config_path()?;

    if path.exists() {
        println!("Config already exists at {}", path.display());
    } else {
        AssistantConfig::create_default_config(&path)?;
        println!("Created {}", path.display());
    }

    let credentials = AppConfig::path()?;
    if let Some(hint) = next_step(&credentials, AppConfig::exists()?, Session::exists()?) {
        println!("\n{hint}");
    }

    Ok(())
}

/// What is still missing before `mailcal run` can work.
fn next_step(credentials: &Path, has_credentials: bool, has_session: bool) -> Option<String> {
    if !has_credentials {
        Some(format!(
            "Next, save your Google OAuth client credentials to {}\n\
            and run `mailcal auth`.",
            credentials.display()
        ))
    } else if !has_session {
        Some("Next, run `mailcal auth` to connect your Google account.".to_string())
    } else {
        None
    }
}
