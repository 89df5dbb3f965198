//! Meeting slots and calendar busy periods.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{MailcalError, MailcalResult};

/// Format of a slot in the booked-slot memory file.
const SLOT_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A proposed (or booked) meeting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Time the calendar is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
}

impl MeetingSlot {
    pub fn new(start: DateTime<Utc>, minutes: i64) -> MailcalResult<Self> {
        let end = TimeDelta::try_minutes(minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                MailcalError::Extraction(format!("{minutes} minutes from {start} is out of range"))
            })?;

        Ok(Self { start, end })
    }

    /// Interpret a wall-clock time from an email in the user's zone.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant. Times that
    /// do not exist (DST spring-forward gap) are rejected.
    pub fn from_local(naive: NaiveDateTime, tz: Tz, minutes: i64) -> MailcalResult<Self> {
        let local = match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                return Err(MailcalError::Extraction(format!(
                    "{naive} does not exist in {tz}"
                )));
            }
        };

        Self::new(local.with_timezone(&Utc), minutes)
    }

    /// The string stored in booked-slot memory.
    pub fn key(&self) -> String {
        self.start.format(SLOT_KEY_FORMAT).to_string()
    }

    pub fn overlaps(&self, busy: &BusyPeriod) -> bool {
        self.start < busy.end && busy.start < self.end
    }

    /// Human-readable start/end in the user's zone, e.g.
    /// "Thursday 20 March 2025, 15:00-15:30 (Europe/London)".
    pub fn describe(&self, tz: Tz) -> String {
        let start = self.start.with_timezone(&tz);
        let end = self.end.with_timezone(&tz);
        format!(
            "{}, {}-{} ({})",
            start.format("%A %-d %B %Y"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            tz.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, h, m, 0).unwrap()
    }

    fn busy(start: DateTime<Utc>, end: DateTime<Utc>) -> BusyPeriod {
        BusyPeriod {
            start,
            end,
            summary: "Standup".into(),
        }
    }

    #[test]
    fn key_is_utc_start() {
        let slot = MeetingSlot::new(utc(15, 0), 30).unwrap();
        assert_eq!(slot.key(), "2025-03-20T15:00:00Z");
        assert_eq!(slot.end, utc(15, 30));
    }

    #[test]
    fn out_of_range_length_is_an_error() {
        let err = MeetingSlot::new(utc(15, 0), 9_000_000_000_000_000).unwrap_err();
        assert!(matches!(err, MailcalError::Extraction(_)));

        let err = MeetingSlot::new(DateTime::<Utc>::MAX_UTC, 30).unwrap_err();
        assert!(matches!(err, MailcalError::Extraction(_)));
    }

    #[test]
    fn overlap_is_half_open() {
        let slot = MeetingSlot::new(utc(15, 0), 30).unwrap();

        assert!(slot.overlaps(&busy(utc(14, 45), utc(15, 15))));
        assert!(slot.overlaps(&busy(utc(15, 10), utc(15, 20))));
        assert!(slot.overlaps(&busy(utc(14, 0), utc(17, 0))));
        assert!(!slot.overlaps(&busy(utc(14, 0), utc(15, 0))));
        assert!(!slot.overlaps(&busy(utc(15, 30), utc(16, 0))));
    }

    #[test]
    fn local_time_converts_through_zone() {
        let naive = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let slot = MeetingSlot::from_local(naive, chrono_tz::Europe::London, 45).unwrap();

        assert_eq!(slot.start, Utc.with_ymd_and_hms(2025, 7, 1, 14, 0, 0).unwrap());
        assert_eq!(slot.end, Utc.with_ymd_and_hms(2025, 7, 1, 14, 45, 0).unwrap());
        assert_eq!(
            slot.describe(chrono_tz::Europe::London),
            "Tuesday 1 July 2025, 15:00-15:45 (Europe/London)"
        );
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // Clocks jump from 01:00 to 02:00 in London on 2025-03-30.
        let naive = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let err = MeetingSlot::from_local(naive, chrono_tz::Europe::London, 30).unwrap_err();
        assert!(matches!(err, MailcalError::Extraction(_)));
    }

    #[test]
    fn ambiguous_local_time_takes_earliest() {
        // 01:30 happens twice in London on 2025-10-26.
        let naive = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let slot = MeetingSlot::from_local(naive, chrono_tz::Europe::London, 30).unwrap();
        assert_eq!(slot.start, Utc.with_ymd_and_hms(2025, 10, 26, 0, 30, 0).unwrap());
    }
}
