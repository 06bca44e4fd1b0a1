use chrono::{DateTime, NaiveDateTime, Utc};

/// Renders a backend timestamp relative to `now`. Accepts RFC 3339, RFC 2822
/// and naive `YYYY-MM-DD[T ]HH:MM:SS` (read as UTC); anything else is
/// returned unchanged.
pub fn format_relative_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(parsed) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let duration = now.signed_duration_since(parsed);
    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{} min ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{} h ago", duration.num_hours())
    } else {
        format!("{} d ago", duration.num_days())
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
