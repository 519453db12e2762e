use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

use crate::timestamp::Timestamped;

/// Thins out a time series so that kept samples are at least `gap` apart.
///
/// The first readable sample is always kept; each later sample is kept only if it
/// is `gap` or more after the last kept one. Samples with unreadable timestamps,
/// and samples older than the last kept one, are dropped. Order is preserved.
pub fn filter_by_interval<T, I>(samples: I, gap: Duration) -> Vec<T>
where
    T: Timestamped,
    I: IntoIterator<Item = T>,
{
    let gap = TimeDelta::from_std(gap).unwrap_or(TimeDelta::MAX);
    let mut last_kept: Option<NaiveDateTime> = None;

    samples
        .into_iter()
        .filter(|sample| {
            let Some(current) = sample.timestamp().parse() else {
                return false;
            };

            let keep = match last_kept {
                None => true,
                Some(last) => current - last >= gap,
            };

            if keep {
                last_kept = Some(current);
            }

            keep
        })
        .collect()
}
