//! Data used in tests.

use crate::sample::WeatherSample;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Midnight UTC on a January day, comfortably inside the winter season.
pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid test date")
}

/// A time `hour` hours after `start_time()`.
pub fn at_hour(hour: i64) -> NaiveDateTime {
    start_time() + Duration::hours(hour)
}

/// Build an hourly series of `n` samples. The closure gets the index and a sample with only the
/// valid time set.
pub fn hourly_series<F>(n: usize, build: F) -> Vec<WeatherSample>
where
    F: Fn(usize, WeatherSample) -> WeatherSample,
{
    (0..n)
        .map(|i| build(i, WeatherSample::new(at_hour(i as i64))))
        .collect()
}

/// The valid time of the last sample, used as the evaluation instant in most tests.
pub fn last_time(series: &[WeatherSample]) -> NaiveDateTime {
    series.last().expect("non-empty test series").valid_time
}
