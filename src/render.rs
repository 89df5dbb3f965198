//! Colored terminal rendering for run reports.

use mailcal_core::{LogEntry, Outcome, RunReport};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Outcome {
    fn render(&self) -> String {
        match self {
            Outcome::Confirmed => "✓ booked".green().to_string(),
            Outcome::Busy => "✗ busy".red().to_string(),
            Outcome::AlreadyBooked => "= already booked".yellow().to_string(),
            Outcome::Acknowledged => "· acknowledged".dimmed().to_string(),
        }
    }
}

impl Render for LogEntry {
    fn render(&self) -> String {
        let mut line = format!("   {} {} {}", self.outcome.render(), self.to, self.subject.dimmed());
        if let Some(slot) = &self.slot {
            line.push_str(&format!("\n      {}", slot));
        }
        line
    }
}

impl Render for RunReport {
    fn render(&self) -> String {
        format!(
            "Processed {} {}, created {} {} and {} {}",
            self.emails,
            pluralize("email", self.emails),
            self.drafts,
            pluralize("draft", self.drafts),
            self.events,
            pluralize("event", self.events),
        )
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
