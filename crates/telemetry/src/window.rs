use std::time::Duration;

use anyhow::{Result, ensure};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

pub const DEFAULT_GAP: Duration = Duration::from_secs(3600);

const PARAM_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Time range requested from the windowed endpoints, plus the minimum gap
/// between plotted samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub gap: Duration,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, gap: Duration) -> Result<Self> {
        ensure!(start <= end, "window start {start} is after end {end}");

        Ok(Self { start, end, gap })
    }

    /// 00:00 to 23:59 of `day`, with the default gap.
    pub fn whole_day(day: NaiveDate) -> Self {
        let last_minute = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);

        Self {
            start: day.and_time(NaiveTime::MIN),
            end: day.and_time(last_minute),
            gap: DEFAULT_GAP,
        }
    }

    pub fn today() -> Self {
        Self::whole_day(Local::now().date_naive())
    }

    pub fn start_param(&self) -> String {
        self.start.format(PARAM_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(PARAM_FORMAT).to_string()
    }

    pub fn query(&self, user_timezone: &str) -> Vec<(&'static str, String)> {
        vec![
            ("user_timezone", user_timezone.to_string()),
            ("start", self.start_param()),
            ("end", self.end_param()),
        ]
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn whole_day_spans_midnight_to_last_minute() {
        let window = TimeWindow::whole_day(day());

        assert_eq!(window.start_param(), "2025-07-01 00:00");
        assert_eq!(window.end_param(), "2025-07-01 23:59");
        assert_eq!(window.gap, DEFAULT_GAP);
    }

    #[test]
    fn query_carries_timezone_and_range() {
        let window = TimeWindow::whole_day(day());

        let query = window.query("Europe/Oslo");

        assert_eq!(
            query,
            vec![
                ("user_timezone", "Europe/Oslo".to_string()),
                ("start", "2025-07-01 00:00".to_string()),
                ("end", "2025-07-01 23:59".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_inverted_range() {
        let start = day().and_hms_opt(12, 0, 0).unwrap();
        let end = day().and_hms_opt(11, 0, 0).unwrap();

        assert!(TimeWindow::new(start, end, DEFAULT_GAP).is_err());
        assert!(TimeWindow::new(end, start, DEFAULT_GAP).is_ok());
    }
}
