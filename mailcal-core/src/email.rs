//! Incoming email as the assistant sees it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MEETING_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(meet|meeting|meetings|call|schedule|scheduling|appointment|catch[- ]up|sync|availability|available)\b",
    )
    .expect("meeting keyword regex is valid")
});

/// A listed message, before its content is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingEmail {
    pub id: String,
    pub thread_id: String,
    /// Raw `From` header, e.g. `Alice <alice@example.com>`
    pub from: String,
    pub subject: String,
    pub body: String,
    /// `Message-ID` header, used for `In-Reply-To`
    pub message_id: Option<String>,
}

impl IncomingEmail {
    /// Bare address to reply to.
    pub fn reply_address(&self) -> String {
        let from = self.from.trim();
        match (from.rfind('<'), from.rfind('>')) {
            (Some(open), Some(close)) if open < close => from[open + 1..close].trim().to_string(),
            _ => from.to_string(),
        }
    }

    pub fn reply_subject(&self) -> String {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return "Re: (no subject)".to_string();
        }
        if subject.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
            subject.to_string()
        } else {
            format!("Re: {subject}")
        }
    }

    pub fn is_meeting_request(&self) -> bool {
        MEETING_WORDS.is_match(&self.subject) || MEETING_WORDS.is_match(&self.body)
    }
}
