use chrono::{NaiveTime, Timelike};

/// Parses one recognized duration shape into whole seconds.
///
/// The spreadsheet stores shift durations as time-of-day cells, so the text
/// form is "H:MM" or "H:MM:SS"; some exports flatten them to plain numbers
/// of seconds instead. Returns None for anything else. Because the values
/// are time-of-day shaped, a span of 24 hours or more cannot be
/// represented; that is a limitation of the source format, not of this
/// parser.
pub fn parse_seconds(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(i64::from(t.num_seconds_from_midnight()));
        }
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n.trunc().max(0.0) as i64),
        _ => None,
    }
}

/// Total-seconds view of an optional raw field. Missing or unrecognized
/// values count as zero seconds; this never fails.
pub fn to_seconds(raw: Option<&str>) -> i64 {
    raw.and_then(parse_seconds).unwrap_or(0)
}
