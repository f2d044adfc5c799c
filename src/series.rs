//! Functions for working with a time series of weather samples.
//!
//! All windows are anchored at the newest sample in the slice, not at the evaluation instant, and
//! include the sample exactly `hours` before it. The slices are assumed to be sorted ascending by
//! valid time, which `check_series` verifies.

use crate::{
    error::{AnalysisError, Result},
    met_formulas::{precip_phase, PrecipPhase},
    sample::WeatherSample,
};
use chrono::Duration;
use itertools::Itertools;
use metfor::{Celsius, Cm, Mm, Quantity};
use optional::Optioned;

/// Make sure the series is not empty and strictly ascending in time.
pub fn check_series(series: &[WeatherSample]) -> Result<()> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    series
        .iter()
        // Look at neighbors two at a time
        .tuple_windows::<(_, _)>()
        // Find the first pair that isn't in order, duplicates count as out of order
        .find(|(prev, next)| next.valid_time <= prev.valid_time)
        .map_or(Ok(()), |(prev, next)| {
            Err(AnalysisError::UnorderedSeries {
                previous: prev.valid_time,
                next: next.valid_time,
            })
        })
}

/// The newest sample.
#[inline]
pub fn newest(series: &[WeatherSample]) -> Result<&WeatherSample> {
    series.last().ok_or(AnalysisError::EmptySeries)
}

/// The samples valid within `hours` of the newest sample.
pub fn window(series: &[WeatherSample], hours: i64) -> &[WeatherSample] {
    match series.len() {
        0 => series,
        len => window_ending(series, len - 1, hours),
    }
}

/// The samples valid within `hours` before, and including, `series[end]`.
///
/// A window reaching back further than a date can be represented covers the whole slice.
pub fn window_ending(series: &[WeatherSample], end: usize, hours: i64) -> &[WeatherSample] {
    debug_assert!(end < series.len());

    let up_to = &series[..=end];
    let start = Duration::try_hours(hours)
        .and_then(|span| up_to[end].valid_time.checked_sub_signed(span))
        .map_or(0, |start_time| {
            up_to.partition_point(|s| s.valid_time < start_time)
        });

    &up_to[start..]
}

/// The most recent non-missing value of a field.
pub fn latest_value<T, F>(series: &[WeatherSample], field: F) -> Option<T>
where
    T: optional::Noned + Copy,
    F: Fn(&WeatherSample) -> Optioned<T>,
{
    series.iter().rev().find_map(|s| field(s).into_option())
}

/// Change in snow depth over the window, newest valid depth minus oldest valid depth.
///
/// Positive values are accumulation. Returns `None` unless there are at least two valid depths.
pub fn snow_change_over(series: &[WeatherSample], hours: i64) -> Option<Cm> {
    let mut depths = window(series, hours)
        .iter()
        .filter_map(|s| s.snow_depth.into_option());

    let first = depths.next()?;
    let last = depths.last()?;

    Some(Cm(last.unpack() - first.unpack()))
}

/// Total precipitation in the window. Returns `None` if no sample in the window reported any.
pub fn precip_total_over(series: &[WeatherSample], hours: i64) -> Option<Mm> {
    sum_precipitation(window(series, hours).iter())
}

/// Total precipitation in the window that fell as rain.
///
/// Samples where the phase can't be determined are left out. Returns `None` if no sample in the
/// window reported precipitation.
pub fn liquid_precip_over(
    series: &[WeatherSample],
    hours: i64,
    rain_air_temp_min: Celsius,
) -> Option<Mm> {
    let window = window(series, hours);

    if window.iter().all(|s| s.precipitation.is_none()) {
        return None;
    }

    let total = window
        .iter()
        // Keep only the samples where it rained
        .filter(|s| {
            precip_phase(
                s.air_temperature.into_option(),
                s.dew_point.into_option(),
                rain_air_temp_min,
            ) == Some(PrecipPhase::Rain)
        })
        .filter_map(|s| s.precipitation.into_option())
        .fold(0.0, |acc, pcp| acc + pcp.unpack());

    Some(Mm(total))
}

/// Mean air temperature in the window, `None` without any valid temperature.
pub fn mean_air_temperature_over(series: &[WeatherSample], hours: i64) -> Option<Celsius> {
    let (sum, count) = window(series, hours)
        .iter()
        .filter_map(|s| s.air_temperature.into_option())
        .fold((0.0, 0usize), |(sum, count), t| (sum + t.unpack(), count + 1));

    if count == 0 {
        None
    } else {
        Some(Celsius(sum / count as f64))
    }
}

/// Whether any sample in the window satisfies the predicate.
pub fn any_over<F>(series: &[WeatherSample], hours: i64, pred: F) -> bool
where
    F: Fn(&WeatherSample) -> bool,
{
    window(series, hours).iter().any(pred)
}

fn sum_precipitation<'a, I>(samples: I) -> Option<Mm>
where
    I: Iterator<Item = &'a WeatherSample>,
{
    samples
        .filter_map(|s| s.precipitation.into_option())
        .fold(None, |acc: Option<f64>, pcp| {
            Some(acc.unwrap_or(0.0) + pcp.unpack())
        })
        .map(Mm)
}
