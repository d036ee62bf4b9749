//! Human-readable timestamps for the list view.

use chrono::{DateTime, Utc};

/// Describes `then` relative to `now`.
///
/// Under a minute reads "just now", then minutes, hours and days up to a
/// week; older timestamps fall back to an absolute date such as `Jan 5, 2025`.
/// Timestamps in the future read "just now".
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
