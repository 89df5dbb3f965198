//! Core types for mailcal.
//!
//! This crate holds everything that does not talk to Google directly:
//! - `email` and `extract` for reading meeting requests
//! - `slot` and `memory` for booked meeting times
//! - `reply` and `mime` for building drafts
//! - `assistant` for the run itself, over the `Mailbox` and `Calendar` traits

pub mod assistant;
pub mod config;
pub mod email;
pub mod error;
pub mod extract;
pub mod memory;
pub mod mime;
pub mod reply;
pub mod slot;

pub use assistant::{Assistant, Calendar, LogEntry, Mailbox, NewEvent, Outcome, RunReport};
pub use config::{AssistantConfig, ServerConfig};
pub use email::{IncomingEmail, MessageRef};
pub use error::{MailcalError, MailcalResult};
pub use memory::BookedSlots;
pub use mime::DraftReply;
pub use slot::{BusyPeriod, MeetingSlot};
