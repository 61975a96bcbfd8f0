use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde_json::Value;

const CALENDAR_DATE: &str = "%Y-%m-%d";

/// Current calendar date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `today` until `due`, negative once the date has passed.
/// Both sides are calendar dates so the time of day never skews the result.
pub fn days_until_due(due: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    due.map(|d| (d - today).num_days())
}

/// Strict `YYYY-MM-DD` check, matching what a browser date input submits
fn is_calendar_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

fn local_date_from_millis(ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.date_naive())
}

fn millis(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
}

/// Normalize a submitted due date.
///
/// `YYYY-MM-DD` is taken as a local calendar date verbatim. Any other string
/// must be an RFC 3339 timestamp and numbers are epoch milliseconds; both are
/// reduced to the local date they fall on. Null, empty and unparseable input
/// mean "no due date".
pub fn parse_due_date(input: Option<&Value>) -> Option<NaiveDate> {
    match input? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_calendar_date(s) {
                return NaiveDate::parse_from_str(s, CALENDAR_DATE).ok();
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Local).date_naive())
        }
        Value::Number(n) => millis(n).and_then(local_date_from_millis),
        _ => None,
    }
}

/// Normalize a submitted creation timestamp, falling back to `now` when the
/// value is absent or can't be read.
pub fn parse_creation_date(input: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = match input {
        Some(Value::String(s)) if is_calendar_date(s.trim()) => {
            NaiveDate::parse_from_str(s.trim(), CALENDAR_DATE)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                .map(|dt| dt.with_timezone(&Utc))
        }
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => millis(n).and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };

    parsed.unwrap_or(now)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(CALENDAR_DATE).to_string()
}
