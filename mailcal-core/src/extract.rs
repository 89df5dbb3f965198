//! Pulls a proposed meeting date/time out of free text.
//!
//! Supported forms, searched together; the one appearing first in the text
//! wins:
//!   2025-03-20 15:00, 2025-03-20T15:00:00
//!   20/03/2025 at 3pm, 20-03-2025 15:30, 20.03.2025 at 3:30 p.m.
//!   March 20 at 3pm, Mar 20, 2025 at 10:30am, 20th of March at 15:00
//!   tomorrow at 10am, today at 4pm, at 9:30 tomorrow
//!
//! A date with no time is not a proposal and is skipped.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const TIME: &str = r"(?P<h>\d{1,2})(?::(?P<mi>\d{2})(?::(?P<s>\d{2}))?)?\s*(?P<ap>[ap]\.m\.|[ap]m\b)?";

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

#[derive(Debug, Clone, Copy)]
enum DateForm {
    Iso,
    DayFirst,
    MonthName,
    Relative,
}

struct Pattern {
    form: DateForm,
    regex: Regex,
}

impl Pattern {
    fn new(form: DateForm, date: &str) -> Self {
        let regex = Regex::new(&format!("(?i){}", date.replace("{TIME}", TIME)))
            .expect("date pattern regex is valid");
        Self { form, regex }
    }
}

static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    let month_day = format!(
        r"\b(?P<mon>{MONTHS})\b\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(?P<y>\d{{4}}))?(?:\s*,)?\s+(?:at\s+)?{{TIME}}"
    );
    let day_month = format!(
        r"\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<mon>{MONTHS})\b\.?(?:,?\s+(?P<y>\d{{4}}))?(?:\s*,)?\s+(?:at\s+)?{{TIME}}"
    );

    vec![
        Pattern::new(
            DateForm::Iso,
            r"\b(?P<y>\d{4})-(?P<mo>\d{1,2})-(?P<d>\d{1,2})(?:T|\s+(?:at\s+)?){TIME}",
        ),
        Pattern::new(
            DateForm::DayFirst,
            r"\b(?P<d>\d{1,2})[/.-](?P<mo>\d{1,2})[/.-](?P<y>\d{4})(?:\s*,)?\s+(?:at\s+)?{TIME}",
        ),
        Pattern::new(DateForm::MonthName, &month_day),
        Pattern::new(DateForm::MonthName, &day_month),
        Pattern::new(
            DateForm::Relative,
            r"\b(?P<rel>today|tomorrow)(?:\s+(?:morning|afternoon|evening))?\s+(?:(?:at|around)\s+)?{TIME}",
        ),
        Pattern::new(
            DateForm::Relative,
            r"\b(?:at|around)\s+{TIME}\s+(?P<rel>today|tomorrow)\b",
        ),
    ]
});

/// Find the first date/time proposal in `text`.
///
/// `today` anchors relative words and fills in a missing year: a month/day
/// that has already passed this year is taken to mean next year.
pub fn extract_datetime(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let mut candidates: Vec<(usize, usize, Captures<'_>)> = Vec::new();

    for (index, pattern) in PATTERNS.iter().enumerate() {
        for caps in pattern.regex.captures_iter(text) {
            let start = caps.get(0).map_or(0, |m| m.start());
            candidates.push((start, index, caps));
        }
    }

    candidates.sort_by_key(|(start, index, _)| (*start, *index));

    candidates
        .into_iter()
        .find_map(|(_, index, caps)| resolve(PATTERNS[index].form, &caps, today))
}

fn resolve(form: DateForm, caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDateTime> {
    let time = parse_time(caps)?;

    let date = match form {
        DateForm::Iso | DateForm::DayFirst => NaiveDate::from_ymd_opt(
            capture(caps, "y")?,
            capture(caps, "mo")?,
            capture(caps, "d")?,
        )?,
        DateForm::MonthName => {
            let month = month_number(caps.name("mon")?.as_str())?;
            let day: u32 = capture(caps, "d")?;

            match caps.name("y") {
                Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day)?,
                None => match NaiveDate::from_ymd_opt(today.year(), month, day) {
                    Some(date) if date >= today => date,
                    _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day)?,
                },
            }
        }
        DateForm::Relative => match caps.name("rel")?.as_str().to_ascii_lowercase().as_str() {
            "today" => today,
            "tomorrow" => today.succ_opt()?,
            _ => return None,
        },
    };

    Some(date.and_time(time))
}

fn parse_time(caps: &Captures<'_>) -> Option<NaiveTime> {
    let hour: u32 = capture(caps, "h")?;
    let minute: Option<u32> = match caps.name("mi") {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    let second: u32 = match caps.name("s") {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };

    let hour = match caps.name("ap") {
        Some(ap) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let pm = ap.as_str().to_ascii_lowercase().starts_with('p');
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        // A bare number ("at 3") is too ambiguous to book.
        None if minute.is_none() => return None,
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute.unwrap_or(0), second)
}

fn capture<T: FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name)?.as_str().parse().ok()
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        day(y, mo, d).and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn iso_forms() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("Can we meet on 2025-03-20 15:00?", today),
            Some(at(2025, 3, 20, 15, 0))
        );
        assert_eq!(
            extract_datetime("Slot: 2025-03-20T09:45:30Z", today),
            Some(day(2025, 3, 20).and_hms_opt(9, 45, 30).unwrap())
        );
        assert_eq!(
            extract_datetime("How about 2025-03-20 at 2pm", today),
            Some(at(2025, 3, 20, 14, 0))
        );
    }

    #[test]
    fn day_first_numeric_forms() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("Are you free 20/03/2025 at 3pm?", today),
            Some(at(2025, 3, 20, 15, 0))
        );
        assert_eq!(
            extract_datetime("20-03-2025 at 3:30 pm works for me", today),
            Some(at(2025, 3, 20, 15, 30))
        );
        assert_eq!(
            extract_datetime("Let's say 20.03.2025 15:30", today),
            Some(at(2025, 3, 20, 15, 30))
        );
    }

    #[test]
    fn month_name_forms() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("Could we do March 20 at 3pm?", today),
            Some(at(2025, 3, 20, 15, 0))
        );
        assert_eq!(
            extract_datetime("Thursday, 20th of March 2025 at 10:30am", today),
            Some(at(2025, 3, 20, 10, 30))
        );
        assert_eq!(
            extract_datetime("Mar 20, 2026 at 10:30 a.m. please", today),
            Some(at(2026, 3, 20, 10, 30))
        );
        assert_eq!(
            extract_datetime("sync on 5 april 14:00", today),
            Some(at(2025, 4, 5, 14, 0))
        );
    }

    #[test]
    fn month_name_without_year_rolls_forward() {
        let today = day(2025, 4, 1);
        assert_eq!(
            extract_datetime("March 20 at 3pm", today),
            Some(at(2026, 3, 20, 15, 0))
        );
        assert_eq!(
            extract_datetime("April 1 at 9am", today),
            Some(at(2025, 4, 1, 9, 0))
        );
    }

    #[test]
    fn relative_forms() {
        let today = day(2025, 3, 31);
        assert_eq!(
            extract_datetime("Call tomorrow at 10am?", today),
            Some(at(2025, 4, 1, 10, 0))
        );
        assert_eq!(
            extract_datetime("today afternoon at 4 PM", today),
            Some(at(2025, 3, 31, 16, 0))
        );
        assert_eq!(
            extract_datetime("meet at 9:30 tomorrow", today),
            Some(at(2025, 4, 1, 9, 30))
        );
    }

    #[test]
    fn twelve_hour_edges() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("2025-03-20 at 12am", today),
            Some(at(2025, 3, 20, 0, 0))
        );
        assert_eq!(
            extract_datetime("2025-03-20 at 12pm", today),
            Some(at(2025, 3, 20, 12, 0))
        );
        assert_eq!(extract_datetime("2025-03-20 at 13pm", today), None);
    }

    #[test]
    fn first_proposal_in_text_wins() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("tomorrow at 9am, or else 2025-03-20 15:00", today),
            Some(at(2025, 3, 2, 9, 0))
        );
    }

    #[test]
    fn invalid_dates_and_times_are_skipped() {
        let today = day(2025, 3, 1);
        assert_eq!(
            extract_datetime("31/02/2025 at 3pm, or 28/02/2025 at 4pm", today),
            Some(at(2025, 2, 28, 16, 0))
        );
        assert_eq!(extract_datetime("2025-03-20 25:00", today), None);
        assert_eq!(extract_datetime("2025-03-20 10:75", today), None);
    }

    #[test]
    fn dates_without_times_do_not_match() {
        let today = day(2025, 3, 1);
        assert_eq!(extract_datetime("The report is due 2025-03-20.", today), None);
        assert_eq!(extract_datetime("See you March 20", today), None);
        assert_eq!(extract_datetime("2025-03-20 at 3 apples", today), None);
        assert_eq!(extract_datetime("no dates here at all", today), None);
    }
}
