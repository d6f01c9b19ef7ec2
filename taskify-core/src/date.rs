//! Due date parsing and labelling
//!
//! Due dates are plain calendar dates. Accepted input:
//! - ISO: "2026-01-25"
//! - Relative: "today", "tomorrow"
//! - Weekdays: "friday", "next monday" (next occurrence, never today)
//! - Offset: "in 3 days", "in 2 weeks"
//!
//! Every function takes `today` explicitly so callers decide the clock.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{CoreError, Result};
use crate::task::Task;

/// Parse a due date relative to `today`
pub fn parse_due_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim().to_lowercase();

    if let Ok(date) = NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
        return Ok(date);
    }

    let parsed = match input.as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        _ => parse_weekday(&input, today).or_else(|| parse_offset(&input, today)),
    };

    parsed.ok_or_else(|| {
        CoreError::parse(format!(
            "Could not parse date '{}'. Try 'YYYY-MM-DD', 'tomorrow', 'next monday' or 'in 3 days'",
            input
        ))
    })
}

fn parse_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let name = input.strip_prefix("next ").unwrap_or(input);

    let target = match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };

    let ahead = (7 + target.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };

    today.checked_add_days(Days::new(u64::from(ahead)))
}

fn parse_offset(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let rest = input.strip_prefix("in ")?;
    let mut parts = rest.split_whitespace();

    let count: u64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    match unit {
        "day" | "days" => today.checked_add_days(Days::new(count)),
        "week" | "weeks" => today.checked_add_days(Days::new(count.checked_mul(7)?)),
        _ => None,
    }
}

/// Short label for a due date: "Today", "Tomorrow", otherwise "Jan 25"
pub fn format_due_label(date: NaiveDate, today: NaiveDate) -> String {
    match date.signed_duration_since(today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%b %-d").to_string(),
    }
}

/// Where a task stands relative to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// Past due and still open
    Overdue,
    Today,
    Upcoming,
    /// No due date, or past due but already completed
    None,
}

impl DueStatus {
    pub fn of(task: &Task, today: NaiveDate) -> Self {
        match task.due_date {
            None => DueStatus::None,
            Some(_) if task.is_overdue(today) => DueStatus::Overdue,
            Some(due) if due == today => DueStatus::Today,
            Some(due) if due > today => DueStatus::Upcoming,
            Some(_) => DueStatus::None,
        }
    }
}
