//! Cron-style schedules for the polling and ledger-sweep drivers
//!
//! Only the shapes the tracker actually needs are supported: a fixed step
//! in seconds, minutes or hours, and a daily wall-clock time (UTC).

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, TrackerError};

/// Longest accepted step; keeps wall-clock arithmetic in range
const MAX_PERIOD_SECS: u64 = 366 * 24 * 60 * 60;

/// When a periodic job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fires on every multiple of the period since the Unix epoch
    Every(Duration),
    /// Fires once a day at the given UTC time
    Daily { hour: u32, minute: u32 },
}

impl Schedule {
    /// Parse a cron expression (`*/30 * * * * *`, `*/5 * * * *`, `0 0 * * *`)
    /// or a shorthand (`30s`, `5m`, `1h`)
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let fields: Vec<&str> = raw.split_whitespace().collect();

        let parsed = match fields.len() {
            1 => parse_shorthand(raw),
            5 => parse_five_fields(&fields),
            6 => match fields[0] {
                "0" => parse_five_fields(&fields[1..]),
                seconds => step(seconds)
                    .filter(|_| fields[1..].iter().all(|f| *f == "*"))
                    .map(|n| Schedule::Every(Duration::from_secs(n))),
            },
            _ => None,
        };

        parsed
            .filter(|schedule| match schedule {
                Schedule::Every(period) => period.as_secs() <= MAX_PERIOD_SECS,
                Schedule::Daily { .. } => true,
            })
            .ok_or_else(|| TrackerError::Schedule {
                schedule: raw.to_string(),
                reason: "expected '*/N' step of at most a year, daily 'M H * * *', \
                         or shorthand like '30s'"
                    .to_string(),
            })
    }

    /// Next firing instant strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Schedule::Every(period) => {
                let period_secs = period.as_secs().max(1) as i64;
                let next = (now.timestamp() / period_secs + 1) * period_secs;
                Utc.timestamp_opt(next, 0)
                    .single()
                    .unwrap_or_else(|| now + ChronoDuration::seconds(period_secs))
            }
            Schedule::Daily { hour, minute } => {
                let today = now
                    .date_naive()
                    .and_hms_opt(hour, minute, 0)
                    .map(|naive| Utc.from_utc_datetime(&naive));
                match today {
                    Some(at) if at > now => at,
                    Some(at) => at + ChronoDuration::days(1),
                    None => now + ChronoDuration::days(1),
                }
            }
        }
    }

    /// How long to wait from `now` until the next firing
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now)
            .to_std()
            .unwrap_or(Duration::from_secs(1))
    }
}

/// Run `task` every time `schedule` fires, forever.
///
/// Each run is awaited before the next delay is computed, so runs of the
/// same driver never overlap.
pub async fn drive<F, Fut>(schedule: Schedule, job: &'static str, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let delay = schedule.delay_from(Utc::now());
        debug!(job, delay_ms = delay.as_millis() as u64, "Waiting for next run");
        sleep(delay).await;
        task().await;
    }
}

fn parse_shorthand(raw: &str) -> Option<Schedule> {
    let (split, _) = raw.char_indices().last()?;
    let (amount, unit) = raw.split_at(split);
    let amount: u64 = amount.parse().ok().filter(|n| *n > 0)?;
    let secs = match unit {
        "s" => Some(amount),
        "m" => amount.checked_mul(60),
        "h" => amount.checked_mul(3600),
        _ => None,
    }?;
    Some(Schedule::Every(Duration::from_secs(secs)))
}

fn parse_five_fields(fields: &[&str]) -> Option<Schedule> {
    match fields {
        [minute, "*", "*", "*", "*"] if minute.starts_with('*') => step(minute)
            .and_then(|n| n.checked_mul(60))
            .map(|secs| Schedule::Every(Duration::from_secs(secs))),
        ["0", hour, "*", "*", "*"] if hour.starts_with('*') => step(hour)
            .and_then(|n| n.checked_mul(3600))
            .map(|secs| Schedule::Every(Duration::from_secs(secs))),
        [minute, hour, "*", "*", "*"] => {
            let minute: u32 = minute.parse().ok().filter(|m| *m < 60)?;
            let hour: u32 = hour.parse().ok().filter(|h| *h < 24)?;
            Some(Schedule::Daily { hour, minute })
        }
        _ => None,
    }
}

/// `*` is a step of one, `*/N` a step of N
fn step(field: &str) -> Option<u64> {
    if field == "*" {
        return Some(1);
    }
    field
        .strip_prefix("*/")
        .and_then(|n| n.parse().ok())
        .filter(|n| *n > 0)
}
