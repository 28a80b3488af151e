use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::TypeError;

/// Wall-clock instant recorded in the logs.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time, truncated to the microsecond precision the logs keep.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp the way every log column stores it (RFC 3339, microseconds).
pub fn format(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a logged timestamp. Accepts any RFC 3339 offset and normalizes to UTC.
pub fn parse(s: &str) -> Result<Timestamp, TypeError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_then_parse_preserves_micros() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let text = format(&ts);
        assert_eq!(text, "2024-05-01T09:30:00.123456Z");
        assert_eq!(parse(&text).unwrap(), ts);
    }

    #[test]
    fn parse_normalizes_offset() {
        let ts = parse("2024-05-01T17:30:00+08:00").unwrap();
        assert_eq!(format(&ts), "2024-05-01T09:30:00.000000Z");
    }

    #[test]
    fn parse_rejects_naive_time() {
        assert!(matches!(
            parse("2024-05-01 09:30:00"),
            Err(TypeError::InvalidTimestamp(_))
        ));
    }
}
