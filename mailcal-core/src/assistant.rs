//! One assistant run: unread mail in, draft replies (and events) out.
//!
//! The run is strictly sequential. Every email gets exactly one draft; the
//! human reviews and sends it. Any backend error aborts the whole run.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AssistantConfig;
use crate::email::{IncomingEmail, MessageRef};
use crate::error::MailcalResult;
use crate::extract::extract_datetime;
use crate::memory::BookedSlots;
use crate::mime::DraftReply;
use crate::reply::ReplyKind;
use crate::slot::{BusyPeriod, MeetingSlot};

/// Where emails come from and drafts go to.
#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn list_unread(
        &self,
        max: u32,
        label_ids: &[String],
        query: Option<&str>,
    ) -> MailcalResult<Vec<MessageRef>>;

    async fn get_message(&self, message: &MessageRef) -> MailcalResult<IncomingEmail>;

    /// Save a draft and return its id. Never sends.
    async fn create_draft(&self, draft: &DraftReply) -> MailcalResult<String>;
}

/// Where availability is checked and meetings are booked.
#[async_trait]
pub trait Calendar: Send + Sync {
    async fn busy_between(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MailcalResult<Vec<BusyPeriod>>;

    /// Insert an event and return its id.
    async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> MailcalResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub slot: MeetingSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Acknowledged,
    Confirmed,
    Busy,
    AlreadyBooked,
}

impl From<&ReplyKind> for Outcome {
    fn from(kind: &ReplyKind) -> Self {
        match kind {
            ReplyKind::Acknowledge => Outcome::Acknowledged,
            ReplyKind::Confirm(_) => Outcome::Confirmed,
            ReplyKind::Busy(_) => Outcome::Busy,
            ReplyKind::AlreadyBooked(_) => Outcome::AlreadyBooked,
        }
    }
}

/// One processed email, as shown in the log panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub outcome: Outcome,
    pub slot: Option<String>,
    pub draft_id: String,
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub emails: usize,
    pub drafts: usize,
    pub events: usize,
    pub entries: Vec<LogEntry>,
}

impl RunReport {
    /// The draft shown in the preview pane.
    pub fn last_draft(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

pub struct Assistant<M, C> {
    config: AssistantConfig,
    mailbox: M,
    calendar: C,
    memory: BookedSlots,
}

impl<M: Mailbox, C: Calendar> Assistant<M, C> {
    pub fn new(config: AssistantConfig, mailbox: M, calendar: C, memory: BookedSlots) -> Self {
        Self {
            config,
            mailbox,
            calendar,
            memory,
        }
    }

    pub fn memory(&self) -> &BookedSlots {
        &self.memory
    }

    pub async fn run(&mut self) -> MailcalResult<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run as if the current time were `now`.
    pub async fn run_at(&mut self, now: DateTime<Utc>) -> MailcalResult<RunReport> {
        let tz = self.config.tz()?;
        let today = now.with_timezone(&tz).date_naive();

        let messages = self
            .mailbox
            .list_unread(
                self.config.max_messages,
                &self.config.label_ids,
                self.config.query.as_deref(),
            )
            .await?;

        info!(count = messages.len(), "fetched unread messages");

        let mut report = RunReport {
            emails: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            let email = self.mailbox.get_message(message).await?;
            let (kind, event_id) = self.decide(&email, now, today, tz).await?;

            let draft = DraftReply {
                to: email.reply_address(),
                subject: email.reply_subject(),
                body: kind.body(tz),
                thread_id: Some(email.thread_id.clone()).filter(|t| !t.is_empty()),
                in_reply_to: email.message_id.clone(),
            };

            let draft_id = self.mailbox.create_draft(&draft).await?;
            info!(to = %draft.to, subject = %draft.subject, draft_id = %draft_id, "created draft");

            report.drafts += 1;
            if event_id.is_some() {
                report.events += 1;
            }

            report.entries.push(LogEntry {
                time: now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string(),
                to: draft.to,
                subject: email.subject,
                body: draft.body,
                outcome: Outcome::from(&kind),
                slot: slot_of(&kind).map(|s| s.describe(tz)),
                draft_id,
                event_id,
            });
        }

        Ok(report)
    }

    async fn decide(
        &mut self,
        email: &IncomingEmail,
        now: DateTime<Utc>,
        today: NaiveDate,
        tz: Tz,
    ) -> MailcalResult<(ReplyKind, Option<String>)> {
        if !email.is_meeting_request() {
            debug!(id = %email.id, "not a meeting request");
            return Ok((ReplyKind::Acknowledge, None));
        }

        let text = format!("{}\n{}", email.subject, email.body);
        let Some(proposed) = extract_datetime(&text, today) else {
            debug!(id = %email.id, "meeting request without a usable date/time");
            return Ok((ReplyKind::Acknowledge, None));
        };

        let slot = match MeetingSlot::from_local(proposed, tz, self.config.meeting_minutes) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(id = %email.id, "{e}");
                return Ok((ReplyKind::Acknowledge, None));
            }
        };

        if slot.start <= now {
            debug!(id = %email.id, slot = %slot.key(), "proposed time is in the past");
            return Ok((ReplyKind::Acknowledge, None));
        }

        if self.memory.contains(&slot.key()) {
            info!(slot = %slot.key(), "slot already booked");
            return Ok((ReplyKind::AlreadyBooked(slot), None));
        }

        let busy = self
            .calendar
            .busy_between(&self.config.calendar_id, slot.start, slot.end)
            .await?;

        if let Some(conflict) = busy.iter().find(|b| slot.overlaps(b)) {
            info!(slot = %slot.key(), conflict = %conflict.summary, "calendar is busy");
            return Ok((ReplyKind::Busy(slot), None));
        }

        let event_id = if self.config.create_events {
            let event = NewEvent {
                summary: meeting_summary(email),
                description: format!(
                    "Requested by {} in \"{}\".\nBooked by mailcal.",
                    email.from.trim(),
                    email.subject.trim()
                ),
                slot,
            };
            let id = self
                .calendar
                .create_event(&self.config.calendar_id, &event)
                .await?;
            info!(slot = %slot.key(), event_id = %id, "created calendar event");
            Some(id)
        } else {
            None
        };

        // Recorded even when events are disabled
        self.memory.record(&slot.key());
        self.memory.save()?;

        Ok((ReplyKind::Confirm(slot), event_id))
    }
}

fn slot_of(kind: &ReplyKind) -> Option<&MeetingSlot> {
    match kind {
        ReplyKind::Acknowledge => None,
        ReplyKind::Confirm(slot) | ReplyKind::Busy(slot) | ReplyKind::AlreadyBooked(slot) => {
            Some(slot)
        }
    }
}

fn meeting_summary(email: &IncomingEmail) -> String {
    let subject = email.subject.trim();
    if subject.is_empty() {
        format!("Meeting with {}", email.reply_address())
    } else {
        format!("Meeting: {subject}")
    }
}
