use anyhow::Result;
use mailcal_core::{Assistant, AssistantConfig, BookedSlots};
use mailcal_google::Session;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run() -> Result<()> {
    let config = AssistantConfig::load()?;
    let (session, gmail, calendar) = mailcal_google::connect(&Session::default_path()?).await?;
    let memory = BookedSlots::load(&config.memory_path)?;

    let spinner = create_spinner(format!("📬 {}", session.account_email()));
    let mut assistant = Assistant::new(config, gmail, calendar, memory);
    let result = assistant.run().await;
    spinner.finish_and_clear();

    let report = result?;
    println!("📬 {}", session.account_email());

    if report.entries.is_empty() {
        println!("   {}", "No unread mail".dimmed());
        return Ok(());
    }

    for entry in &report.entries {
        println!("{}", entry.render());
    }

    println!("\n{}", report.render());

    Ok(())
}
