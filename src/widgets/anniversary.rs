use chrono::{DateTime, NaiveDate, Utc};

use crate::config::AnniversaryConfig;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const YEAR_MS: f64 = 365.25 * DAY_MS;
const MONTH_MS: f64 = 30.44 * DAY_MS;

/// Human phrase for the time elapsed between `since` and `now`.
///
/// Uses average year (365.25 d) and month (30.44 d) lengths. Shows years and
/// months once a year has passed, months and days once a month has passed,
/// and days otherwise. Dates in the future read as `0 days`.
pub fn elapsed_phrase(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - since).num_milliseconds().max(0) as f64;

    let years = (diff / YEAR_MS).floor() as i64;
    let months = ((diff % YEAR_MS) / MONTH_MS).floor() as i64;
    let days = ((diff % MONTH_MS) / DAY_MS).floor() as i64;

    if years > 0 {
        format!("{}, {}", count(years, "year"), count(months, "month"))
    } else if months > 0 {
        format!("{}, {}", count(months, "month"), count(days, "day"))
    } else {
        count(days, "day")
    }
}

fn count(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Labelled counters refreshed by the anniversary task.
#[derive(Debug, Clone, Default)]
pub struct AnniversaryCounter {
    entries: Vec<AnniversaryConfig>,
}

impl AnniversaryCounter {
    pub fn new(entries: Vec<AnniversaryConfig>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(label, phrase)` for every configured anniversary at `now`.
    pub fn phrases(&self, now: DateTime<Utc>) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.label.clone(),
                    elapsed_phrase(midnight_utc(entry.since), now),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        midnight_utc(NaiveDate::from_ymd_opt(2012, 12, 1).unwrap())
    }

    fn after_days(days: i64) -> String {
        elapsed_phrase(start(), start() + Duration::days(days))
    }

    #[test]
    fn days_only_below_a_month() {
        assert_eq!(after_days(0), "0 days");
        assert_eq!(after_days(1), "1 day");
        assert_eq!(after_days(29), "29 days");
    }

    #[test]
    fn months_and_days_below_a_year() {
        assert_eq!(after_days(31), "1 month, 0 days");
        assert_eq!(after_days(45), "1 month, 14 days");
        assert_eq!(after_days(100), "3 months, 8 days");
    }

    #[test]
    fn years_and_months_after_a_year() {
        assert_eq!(after_days(400), "1 year, 1 month");
        assert_eq!(after_days(731), "2 years, 0 months");
    }

    #[test]
    fn future_dates_read_as_zero() {
        assert_eq!(elapsed_phrase(start(), start() - Duration::days(3)), "0 days");
    }

    #[test]
    fn counter_labels_each_entry() {
        let counter = AnniversaryCounter::new(vec![AnniversaryConfig {
            label: "wedding".into(),
            since: NaiveDate::from_ymd_opt(2023, 6, 10).unwrap(),
        }]);
        let now = midnight_utc(NaiveDate::from_ymd_opt(2023, 6, 12).unwrap());
        assert_eq!(
            counter.phrases(now),
            vec![("wedding".to_string(), "2 days".to_string())]
        );
    }
}
