//! Time and duration literals
//!
//! InfluxQL takes instants as single-quoted RFC3339 strings and durations as
//! integer literals followed by a unit, with mixed units allowed:
//!
//! ```text
//! duration_lit  = int_lit duration_unit .
//! duration_unit = "ns" | "u" | "µ" | "ms" | "s" | "m" | "h" | "d" | "w" .
//! ```
//!
//! Two encodings exist for durations and they must not be confused:
//! [`format_duration_literal`] is exact and mixes units, while
//! [`format_interval_literal`] rounds to a single unit and is only meant for
//! `GROUP BY time(...)` bucket sizes.

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Which side of a time window is inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bounds {
    /// `time >= start AND time < end`
    #[default]
    InclusiveLower,
    /// `time > start AND time <= end`
    ExclusiveLower,
}

impl Bounds {
    fn lower(&self) -> &'static str {
        match self {
            Self::InclusiveLower => ">=",
            Self::ExclusiveLower => ">",
        }
    }

    fn upper(&self) -> &'static str {
        match self {
            Self::InclusiveLower => "<",
            Self::ExclusiveLower => "<=",
        }
    }
}

/// Format an instant as a quoted RFC3339 literal in UTC, e.g. `'2024-01-01T00:00:00Z'`
pub fn format_instant_literal<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format!(
        "'{}'",
        instant
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    )
}

/// `time >= '<start>'`
pub fn start_time_where_clause<Tz: TimeZone>(start: &DateTime<Tz>) -> String {
    format!("time >= {}", format_instant_literal(start))
}

/// Half-open range `[start, end)`, or an open lower bound when `end` is absent.
///
/// The pair is swapped when `start > end`.
pub fn range_where_clause<Tz: TimeZone>(start: &DateTime<Tz>, end: Option<&DateTime<Tz>>) -> String {
    range_where_clause_with(Bounds::InclusiveLower, start, end)
}

/// Half-open range `(start, end]`, or an open lower bound when `end` is absent.
///
/// Adjacent windows built with one variant never share an instant. Mixing
/// this with [`range_where_clause`] over consecutive windows breaks that.
pub fn range_where_clause_exclusive<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: Option<&DateTime<Tz>>,
) -> String {
    range_where_clause_with(Bounds::ExclusiveLower, start, end)
}

fn range_where_clause_with<Tz: TimeZone>(
    bounds: Bounds,
    start: &DateTime<Tz>,
    end: Option<&DateTime<Tz>>,
) -> String {
    let Some(end) = end else {
        return format!("time {} {}", bounds.lower(), format_instant_literal(start));
    };

    let (start, end) = if start > end { (end, start) } else { (start, end) };
    format!(
        "time {} {} AND time {} {}",
        bounds.lower(),
        format_instant_literal(start),
        bounds.upper(),
        format_instant_literal(end)
    )
}

/// `[start, start + offset)`
pub fn offset_where_clause<Tz: TimeZone>(start: &DateTime<Tz>, offset: Duration) -> String {
    let end = start.clone() + offset;
    range_where_clause(start, Some(&end))
}

/// The UTC day containing `date`.
///
/// With `whole_day` the range starts at midnight, otherwise at `date` itself;
/// it always ends at the next midnight.
pub fn date_where_clause<Tz: TimeZone>(date: &DateTime<Tz>, whole_day: bool) -> String {
    let date = date.with_timezone(&Utc);
    let midnight = date.date_naive().and_time(NaiveTime::MIN).and_utc();
    let next_midnight = midnight + Duration::days(1);
    if whole_day {
        range_where_clause(&midnight, Some(&next_midnight))
    } else {
        range_where_clause(&date, Some(&next_midnight))
    }
}

/// `time >= now() - <seconds>s`
pub fn last_where_clause(duration: Duration) -> String {
    format!("time >= now() - {}s", format_seconds(duration))
}

/// `time > now() - <seconds>s`
pub fn last_where_clause_exclusive(duration: Duration) -> String {
    format!("time > now() - {}s", format_seconds(duration))
}

/// Total seconds, without a fraction when the duration is whole
fn format_seconds(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        (millis as f64 / 1000.0).to_string()
    }
}

/// Mixed-unit duration literal, largest unit first: `1d2h3m4s5ms`.
///
/// Zero components are omitted, so a zero (or negative) duration renders as
/// an empty string.
pub fn format_duration_literal(duration: Duration) -> String {
    if duration <= Duration::zero() {
        return String::new();
    }

    let components = [
        (duration.num_days(), "d"),
        (duration.num_hours() % 24, "h"),
        (duration.num_minutes() % 60, "m"),
        (duration.num_seconds() % 60, "s"),
        (duration.num_milliseconds() % 1000, "ms"),
    ];

    components
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect()
}

/// Single-unit bucket size for `GROUP BY time(...)`.
///
/// | duration      | unit    |
/// |---------------|---------|
/// | `< 10m`       | seconds |
/// | `< 10h`       | minutes |
/// | `< 5d`        | hours   |
/// | otherwise     | days    |
///
/// The value is rounded to the nearest whole unit. Buckets never render below
/// `1s`, since InfluxDB rejects `time(0s)`.
pub fn format_interval_literal(duration: Duration) -> String {
    let duration = duration.abs();
    let seconds = duration.num_milliseconds() as f64 / 1000.0;

    if duration < Duration::minutes(10) {
        format!("{}s", (seconds.round() as i64).max(1))
    } else if duration < Duration::hours(10) {
        format!("{}m", (seconds / 60.0).round() as i64)
    } else if duration < Duration::days(5) {
        format!("{}h", (seconds / 3600.0).round() as i64)
    } else {
        format!("{}d", (seconds / 86400.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_instant_literal() {
        assert_eq!(
            format_instant_literal(&utc("2024-01-01T00:00:00Z")),
            "'2024-01-01T00:00:00Z'"
        );
        assert_eq!(
            format_instant_literal(&utc("2024-01-01T08:00:00.250+08:00")),
            "'2024-01-01T00:00:00.250Z'"
        );
    }

    #[test]
    fn test_range_open_and_closed() {
        let start = utc("2024-01-01T00:00:00Z");
        let end = utc("2024-01-02T00:00:00Z");

        assert_eq!(
            range_where_clause(&start, None),
            "time >= '2024-01-01T00:00:00Z'"
        );
        assert_eq!(
            range_where_clause(&start, Some(&end)),
            "time >= '2024-01-01T00:00:00Z' AND time < '2024-01-02T00:00:00Z'"
        );
        assert_eq!(
            range_where_clause_exclusive(&start, Some(&end)),
            "time > '2024-01-01T00:00:00Z' AND time <= '2024-01-02T00:00:00Z'"
        );
        assert_eq!(
            range_where_clause_exclusive(&start, None),
            "time > '2024-01-01T00:00:00Z'"
        );
    }

    #[test]
    fn test_range_swaps_reversed_pair() {
        let start = utc("2024-01-02T00:00:00Z");
        let end = utc("2024-01-01T00:00:00Z");

        assert_eq!(
            range_where_clause(&start, Some(&end)),
            "time >= '2024-01-01T00:00:00Z' AND time < '2024-01-02T00:00:00Z'"
        );
    }

    #[test]
    fn test_start_and_offset_clauses() {
        let start = utc("2024-03-10T12:00:00Z");
        assert_eq!(
            start_time_where_clause(&start),
            "time >= '2024-03-10T12:00:00Z'"
        );
        assert_eq!(
            offset_where_clause(&start, Duration::hours(1)),
            "time >= '2024-03-10T12:00:00Z' AND time < '2024-03-10T13:00:00Z'"
        );
    }

    #[test]
    fn test_date_where_clause() {
        let date = utc("2024-03-10T15:30:00Z");
        assert_eq!(
            date_where_clause(&date, true),
            "time >= '2024-03-10T00:00:00Z' AND time < '2024-03-11T00:00:00Z'"
        );
        assert_eq!(
            date_where_clause(&date, false),
            "time >= '2024-03-10T15:30:00Z' AND time < '2024-03-11T00:00:00Z'"
        );
    }

    #[test]
    fn test_last_where_clause() {
        assert_eq!(
            last_where_clause(Duration::minutes(5)),
            "time >= now() - 300s"
        );
        assert_eq!(
            last_where_clause_exclusive(Duration::minutes(5)),
            "time > now() - 300s"
        );
        assert_eq!(
            last_where_clause(Duration::milliseconds(1500)),
            "time >= now() - 1.5s"
        );
    }

    #[test]
    fn test_duration_literal() {
        assert_eq!(format_duration_literal(Duration::minutes(3)), "3m");
        assert_eq!(format_duration_literal(Duration::zero()), "");

        let mixed = Duration::days(1)
            + Duration::hours(2)
            + Duration::minutes(3)
            + Duration::seconds(4)
            + Duration::milliseconds(5);
        assert_eq!(format_duration_literal(mixed), "1d2h3m4s5ms");

        let gaps = Duration::days(2) + Duration::seconds(30);
        assert_eq!(format_duration_literal(gaps), "2d30s");
    }

    #[test]
    fn test_interval_literal_boundaries() {
        assert_eq!(
            format_interval_literal(Duration::minutes(9) + Duration::seconds(59)),
            "599s"
        );
        assert_eq!(format_interval_literal(Duration::seconds(30)), "30s");
        assert_eq!(format_interval_literal(Duration::minutes(10)), "10m");
        assert_eq!(format_interval_literal(Duration::hours(10)), "10h");
        assert_eq!(format_interval_literal(Duration::days(5)), "5d");
        assert_eq!(
            format_interval_literal(Duration::hours(2) + Duration::seconds(40)),
            "121m"
        );
        assert_eq!(format_interval_literal(Duration::days(12)), "12d");
    }

    #[test]
    fn test_interval_literal_sub_second() {
        assert_eq!(format_interval_literal(Duration::milliseconds(200)), "1s");
        assert_eq!(format_interval_literal(Duration::zero()), "1s");
        assert_eq!(format_interval_literal(Duration::milliseconds(1400)), "1s");
        assert_eq!(format_interval_literal(Duration::milliseconds(1600)), "2s");
    }
}
