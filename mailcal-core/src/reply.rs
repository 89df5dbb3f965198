//! Reply text for each outcome of looking at an email.

use chrono_tz::Tz;

use crate::slot::MeetingSlot;

const SIGNATURE: &str = "Best regards,\n(drafted by mailcal, reviewed before sending)";

/// What the draft should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// No meeting time found; hold the thread.
    Acknowledge,
    /// The proposed time is free and has been booked.
    Confirm(MeetingSlot),
    /// The calendar is already busy at the proposed time.
    Busy(MeetingSlot),
    /// The time was confirmed in an earlier run.
    AlreadyBooked(MeetingSlot),
}

impl ReplyKind {
    pub fn body(&self, tz: Tz) -> String {
        let text = match self {
            ReplyKind::Acknowledge => {
                "Thanks for your email. I will get back to you shortly.".to_string()
            }
            ReplyKind::Confirm(slot) => format!(
                "Thanks for reaching out. {} works for me, I have put it in my calendar.\n\n\
                 Looking forward to it.",
                slot.describe(tz)
            ),
            ReplyKind::Busy(slot) => format!(
                "Thanks for reaching out. Unfortunately I am not available on {}.\n\n\
                 Could you suggest another time?",
                slot.describe(tz)
            ),
            ReplyKind::AlreadyBooked(slot) => format!(
                "Thanks for your email. {} is already booked in my calendar.\n\n\
                 If you meant a different meeting, could you suggest another time?",
                slot.describe(tz)
            ),
        };

        format!("Hi,\n\n{text}\n\n{SIGNATURE}")
    }
}
