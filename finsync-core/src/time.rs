//! Calendar utilities: the pipeline's notion of "today" and month stepping.

use anyhow::Result;
use chrono::{DateTime, Months, NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date of `now` as seen in an IANA timezone like "America/Argentina/Buenos_Aires".
pub fn today_in(tz: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Advance `date` by `months`, keeping the day of month.
///
/// Days that do not exist in the target month clamp to its last day, so
/// 2025-01-31 + 1 month is 2025-02-28.
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
