//! Time utilities: timezone-aware "now" overrides and deadline distances.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// Parse a local time like "2026-02-20 23:59" in an IANA tz like "Asia/Taipei",
/// returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Milliseconds from `now` until `deadline`; negative once it has passed.
pub fn millis_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_milliseconds()
}

/// Fractional hours until `deadline`.
pub fn hours_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    millis_until(deadline, now) as f64 / MS_PER_HOUR
}

/// Fractional days until `deadline`.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    millis_until(deadline, now) as f64 / MS_PER_DAY
}
