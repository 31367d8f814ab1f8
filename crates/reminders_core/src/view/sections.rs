//! Section buckets for grouped note lists.
//!
//! Keys are stable identifiers; turning them into display strings is the
//! presentation layer's job.

use crate::model::note::Note;
use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};

/// Note property a list is sectioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRole {
    ReminderTime,
    Created,
    Updated,
    Notebook,
}

impl SectionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReminderTime => "reminderTime",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Notebook => "notebookGuid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "reminderTime" => Some(Self::ReminderTime),
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "notebookGuid" => Some(Self::Notebook),
            _ => None,
        }
    }
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar date of a Unix epoch milliseconds timestamp.
pub fn local_date(millis: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(millis)
        .earliest()
        .map(|time| time.date_naive())
}

/// Due bucket of a reminder; `None` for notes without one.
pub fn reminder_bucket(note: &Note, today: NaiveDate) -> Option<&'static str> {
    if !note.reminder() {
        return None;
    }
    if note.reminder_done() {
        return Some("done");
    }
    let Some(due) = note.reminder_time().and_then(local_date) else {
        return Some("no_date");
    };
    let bucket = if due < today {
        "overdue"
    } else if due == today {
        "today"
    } else if due == today + Duration::days(1) {
        "tomorrow"
    } else if due <= today + Duration::days(7) {
        "next_week"
    } else if due <= today + Duration::days(14) {
        "in_two_weeks"
    } else {
        "later"
    };
    Some(bucket)
}

/// Age bucket of a timestamp: recent days by name, older ones by `YYYY-MM`.
pub fn date_bucket(millis: i64, today: NaiveDate) -> String {
    let Some(date) = local_date(millis) else {
        return "unknown".to_string();
    };
    if date == today {
        "today".to_string()
    } else if date == today - Duration::days(1) {
        "yesterday".to_string()
    } else if date >= today - Duration::days(7) {
        "last_week".to_string()
    } else if date >= today - Duration::days(14) {
        "two_weeks_ago".to_string()
    } else {
        format!("{:04}-{:02}", date.year(), date.month())
    }
}

/// Section key of `note` under `role`.
pub fn section_key(note: &Note, role: SectionRole, today: NaiveDate) -> Option<String> {
    match role {
        SectionRole::ReminderTime => reminder_bucket(note, today).map(str::to_string),
        SectionRole::Created => Some(date_bucket(note.created(), today)),
        SectionRole::Updated => Some(date_bucket(note.updated(), today)),
        SectionRole::Notebook => Some(note.notebook_guid().to_string()),
    }
}
