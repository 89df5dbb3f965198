use anyhow::Result;
use chrono::{DateTime, Utc};
use mailcal_core::{AssistantConfig, BookedSlots};

pub fn run() -> Result<()> {
    let config = AssistantConfig::load()?;
    let tz = config.tz()?;
    let memory = BookedSlots::load(&config.memory_path)?;

    if memory.is_empty() {
        println!("No booked slots in {}", memory.path().display());
        return Ok(());
    }

    println!(
        "{} booked slot(s) in {}:\n",
        memory.len(),
        memory.path().display()
    );

    for key in memory.iter() {
        match key.parse::<DateTime<Utc>>() {
            Ok(start) => println!(
                "  {}  ({})",
                start.with_timezone(&tz).format("%A %-d %B %Y, %H:%M"),
                key
            ),
            Err(_) => println!("  {key}"),
        }
    }

    Ok(())
}
