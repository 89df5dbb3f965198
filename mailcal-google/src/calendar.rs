//! Google Calendar backend: busy periods and event creation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_calendar::Client;
use google_calendar::types::{Event, EventDateTime, OrderBy, SendUpdates};
use mailcal_core::{BusyPeriod, Calendar, MailcalError, MailcalResult, NewEvent};
use tracing::debug;

pub struct GoogleCalendar {
    client: Client,
}

impl GoogleCalendar {
    pub fn new(client: Client) -> Self {
        GoogleCalendar { client }
    }

    pub async fn list_busy(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyPeriod>> {
        let time_min = start.to_rfc3339();
        let time_max = end.to_rfc3339();

        let response = self
            .client
            .events()
            .list_all(
                calendar_id,
                "",                 // i_cal_uid
                0,                  // max_attendees
                OrderBy::default(), // order_by
                &[],                // private_extended_property
                "",                 // q
                &[],                // shared_extended_property
                false,              // show_deleted
                false,              // show_hidden_invitations
                true,               // single_events: expand recurring events
                &time_max,
                &time_min,
                "",                 // time_zone
                "",                 // updated_min
            )
            .await
            .with_context(|| format!("Failed to fetch events from {calendar_id}"))?;

        let busy = busy_from_events(response.body);
        debug!(calendar = calendar_id, busy = busy.len(), "fetched busy periods");
        Ok(busy)
    }

    pub async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> Result<String> {
        let response = self
            .client
            .events()
            .insert(
                calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &to_google_event(event),
            )
            .await
            .with_context(|| format!("Failed to create event: {}", event.summary))?;

        Ok(response.body.id)
    }
}

#[async_trait]
impl Calendar for GoogleCalendar {
    async fn busy_between(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MailcalResult<Vec<BusyPeriod>> {
        self.list_busy(calendar_id, start, end)
            .await
            .map_err(|e| MailcalError::Calendar(format!("{e:#}")))
    }

    async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> MailcalResult<String> {
        self.insert_event(calendar_id, event)
            .await
            .map_err(|e| MailcalError::Calendar(format!("{e:#}")))
    }
}

/// Timed events that block the calendar.
///
/// Cancelled and free ("transparent") events are skipped, as are all-day
/// events, which usually mark holidays or reminders rather than meetings.
fn busy_from_events(events: Vec<Event>) -> Vec<BusyPeriod> {
    events
        .into_iter()
        .filter(|e| e.status != "cancelled" && e.transparency != "transparent")
        .filter_map(|e| {
            let start = e.start.as_ref()?.date_time?;
            let end = e.end.as_ref()?.date_time?;
            Some(BusyPeriod {
                start,
                end,
                summary: e.summary,
            })
        })
        .collect()
}

fn to_google_event(event: &NewEvent) -> Event {
    let time = |dt: DateTime<Utc>| EventDateTime {
        date: None,
        date_time: Some(dt),
        time_zone: "UTC".to_string(),
    };

    Event {
        summary: event.summary.clone(),
        description: event.description.clone(),
        start: Some(time(event.slot.start)),
        end: Some(time(event.slot.end)),
        status: "confirmed".to_string(),
        transparency: "opaque".to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use mailcal_core::MeetingSlot;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, h, m, 0).unwrap()
    }

    fn timed(summary: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            summary: summary.into(),
            status: "confirmed".into(),
            start: Some(EventDateTime {
                date: None,
                date_time: Some(start),
                time_zone: String::new(),
            }),
            end: Some(EventDateTime {
                date: None,
                date_time: Some(end),
                time_zone: String::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_only_blocking_timed_events() {
        let mut cancelled = timed("Cancelled", at(9, 0), at(10, 0));
        cancelled.status = "cancelled".into();

        let mut free = timed("Focus (free)", at(11, 0), at(12, 0));
        free.transparency = "transparent".into();

        let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let all_day = Event {
            summary: "Holiday".into(),
            start: Some(EventDateTime {
                date: Some(day),
                date_time: None,
                time_zone: String::new(),
            }),
            end: Some(EventDateTime {
                date: day.succ_opt(),
                date_time: None,
                time_zone: String::new(),
            }),
            ..Default::default()
        };

        let standup = timed("Standup", at(15, 0), at(15, 15));

        let busy = busy_from_events(vec![cancelled, free, all_day, standup]);
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].summary, "Standup");
        assert_eq!(busy[0].start, at(15, 0));
        assert_eq!(busy[0].end, at(15, 15));
    }

    #[test]
    fn event_without_times_is_ignored() {
        let event = Event {
            summary: "Broken".into(),
            ..Default::default()
        };
        assert!(busy_from_events(vec![event]).is_empty());
    }

    #[test]
    fn new_event_is_timed_and_opaque() {
        let event = NewEvent {
            summary: "Meeting: Lunch".into(),
            description: "Booked from email".into(),
            slot: MeetingSlot::new(at(15, 0), 30).unwrap(),
        };

        let google = to_google_event(&event);
        assert_eq!(google.summary, "Meeting: Lunch");
        assert_eq!(google.description, "Booked from email");
        assert!(google.id.is_empty());
        assert!(google.attendees.is_empty());
        assert_eq!(google.transparency, "opaque");

        let start = google.start.unwrap();
        assert_eq!(start.date_time, Some(at(15, 0)));
        assert_eq!(start.date, None);
        assert_eq!(google.end.unwrap().date_time, Some(at(15, 30)));
    }
}
