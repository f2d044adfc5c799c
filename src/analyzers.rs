//! The hazard analyzers and the evaluation contract they share.
//!
//! Every analyzer has an `analyze` method that never fails. It checks the season, the ordering and
//! age of the series, runs the hazard specific rules and turns any error into a result with an
//! unknown risk level. The hazard specific rules are also available as plain functions returning a
//! `Result` for callers that want to handle missing data themselves.

use crate::{
    config::{AnalyzerConfig, Season},
    error::{AnalysisError, Result},
    risk::{AnalysisResult, Hazard},
    sample::WeatherSample,
    series::{check_series, latest_value, newest, window},
};
use chrono::{Datelike, Duration, NaiveDateTime};
use optional::Optioned;
use strum::IntoEnumIterator;

mod fresh_snow;
pub use fresh_snow::{fresh_snow_risk, FreshSnowAnalyzer};
mod slaps;
pub use slaps::{slaps_risk, SlapsAnalyzer};
mod slippery_road;
pub use slippery_road::{slippery_road_risk, SlipperyRoadAnalyzer, SNOW_ICE_CAVEAT};
mod snowdrift;
pub use snowdrift::{loose_snow_availability, snowdrift_risk, LooseSnow, SnowdriftAnalyzer};

/// How far back a missing "current" value may be filled from an earlier sample.
const CURRENT_VALUE_HOURS: i64 = 2;

/// One analyzer per hazard.
#[derive(Clone, Debug)]
pub enum Analyzer {
    /// See `FreshSnowAnalyzer`.
    FreshSnow(FreshSnowAnalyzer),
    /// See `SlapsAnalyzer`.
    Slaps(SlapsAnalyzer),
    /// See `SlipperyRoadAnalyzer`.
    SlipperyRoad(SlipperyRoadAnalyzer),
    /// See `SnowdriftAnalyzer`.
    Snowdrift(SnowdriftAnalyzer),
}

impl Analyzer {
    /// Create the analyzer for a hazard from the full configuration.
    pub fn new(hazard: Hazard, config: &AnalyzerConfig) -> Self {
        match hazard {
            Hazard::FreshSnow => Analyzer::FreshSnow(FreshSnowAnalyzer::from_config(config)),
            Hazard::Slaps => Analyzer::Slaps(SlapsAnalyzer::from_config(config)),
            Hazard::SlipperyRoad => {
                Analyzer::SlipperyRoad(SlipperyRoadAnalyzer::from_config(config))
            }
            Hazard::Snowdrift => Analyzer::Snowdrift(SnowdriftAnalyzer::from_config(config)),
        }
    }

    /// One analyzer for every hazard.
    pub fn all(config: &AnalyzerConfig) -> Vec<Analyzer> {
        Hazard::iter().map(|hazard| Analyzer::new(hazard, config)).collect()
    }

    /// The hazard this analyzer assesses.
    pub fn hazard(&self) -> Hazard {
        match self {
            Analyzer::FreshSnow(_) => Hazard::FreshSnow,
            Analyzer::Slaps(_) => Hazard::Slaps,
            Analyzer::SlipperyRoad(_) => Hazard::SlipperyRoad,
            Analyzer::Snowdrift(_) => Hazard::Snowdrift,
        }
    }

    /// Assess the hazard at the evaluation instant `now`.
    pub fn analyze(&self, series: &[WeatherSample], now: NaiveDateTime) -> AnalysisResult {
        match self {
            Analyzer::FreshSnow(anal) => anal.analyze(series, now),
            Analyzer::Slaps(anal) => anal.analyze(series, now),
            Analyzer::SlipperyRoad(anal) => anal.analyze(series, now),
            Analyzer::Snowdrift(anal) => anal.analyze(series, now),
        }
    }
}

/// Run hazard specific rules behind the gates every analyzer shares.
pub(crate) fn evaluate<F>(
    hazard: Hazard,
    season: &Season,
    series: &[WeatherSample],
    now: NaiveDateTime,
    rules: F,
) -> AnalysisResult
where
    F: FnOnce(&[WeatherSample]) -> Result<AnalysisResult>,
{
    if !season.is_winter(now) {
        tracing::debug!(hazard = %hazard, month = now.month(), "outside the winter season");
        return AnalysisResult::out_of_season(hazard, now.month(), now);
    }

    let outcome = check_series(series)
        .and_then(|_| check_data_age(season, series, now))
        .and_then(|_| rules(series));

    match outcome {
        Ok(res) => {
            tracing::debug!(
                hazard = %hazard,
                risk = %res.risk_level(),
                scenario = res.scenario(),
                "hazard evaluated"
            );
            res
        }
        Err(err) => {
            tracing::warn!(hazard = %hazard, error = %err, "hazard could not be evaluated");
            AnalysisResult::unknown(hazard, &err, now)
        }
    }
}

fn check_data_age(season: &Season, series: &[WeatherSample], now: NaiveDateTime) -> Result<()> {
    let newest = newest(series)?.valid_time;

    if newest > now {
        return Err(AnalysisError::FutureData { newest, now });
    }

    // An age limit too long to represent is no limit
    let oldest_allowed = season
        .max_data_age_hours
        .and_then(Duration::try_hours)
        .and_then(|age| now.checked_sub_signed(age));

    match oldest_allowed {
        Some(oldest) if newest < oldest => Err(AnalysisError::StaleData { newest, now }),
        _ => Ok(()),
    }
}

/// The newest valid value of a field, looking back a short while past missing values.
pub(crate) fn current<T, F>(series: &[WeatherSample], field: F) -> Option<T>
where
    T: optional::Noned + Copy,
    F: Fn(&WeatherSample) -> Optioned<T>,
{
    latest_value(window(series, CURRENT_VALUE_HOURS), field)
}

/// Like `current`, but the value is required.
pub(crate) fn required<T, F>(series: &[WeatherSample], field: F, name: &'static str) -> Result<T>
where
    T: optional::Noned + Copy,
    F: Fn(&WeatherSample) -> Optioned<T>,
{
    current(series, field).ok_or(AnalysisError::MissingValue(name))
}

/// Format an optional figure for a factor string.
pub(crate) fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(val) => format!("{:.1} {}", val, unit),
        None => "ukjent".to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        risk::RiskLevel,
        test_data::{at_hour, hourly_series, last_time},
    };
    use chrono::NaiveDate;
    use metfor::{Celsius, Cm, MetersPSec, Mm};

    fn stormy_series() -> Vec<WeatherSample> {
        hourly_series(13, |i, s| {
            s.with_air_temperature(Celsius(-8.0))
                .with_dew_point(Celsius(-9.0))
                .with_surface_temperature(Celsius(-6.0))
                .with_wind_speed(MetersPSec(14.0))
                .with_wind_gust(MetersPSec(25.0))
                .with_wind_direction(200.0)
                .with_snow_depth(Cm(40.0 + 2.0 * i as f64))
                .with_precipitation(Mm(2.0))
        })
    }

    #[test]
    fn test_every_hazard_has_an_analyzer() {
        let analyzers = Analyzer::all(&AnalyzerConfig::default());
        let hazards: Vec<Hazard> = analyzers.iter().map(Analyzer::hazard).collect();

        assert_eq!(hazards, Hazard::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_out_of_season_is_low_whatever_the_weather() {
        let july = NaiveDate::from_ymd_opt(2024, 7, 10)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&stormy_series(), july);
            assert_eq!(res.risk_level(), RiskLevel::Low);
            assert_eq!(res.scenario(), "Utenfor sesong");
            assert_eq!(res.detail("month"), Some(7.0));

            // Not even an empty series is looked at
            let res = anal.analyze(&[], july);
            assert_eq!(res.risk_level(), RiskLevel::Low);
        }
    }

    #[test]
    fn test_empty_series_is_unknown() {
        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&[], at_hour(0));
            assert_eq!(res.risk_level(), RiskLevel::Unknown);
            assert!(res.message().contains("empty"));
        }
    }

    #[test]
    fn test_unordered_series_is_unknown() {
        let mut series = stormy_series();
        series.swap(3, 4);

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&series, last_time(&series));
            assert_eq!(res.risk_level(), RiskLevel::Unknown);
        }
    }

    #[test]
    fn test_stale_data_is_unknown() {
        let series = stormy_series();
        let now = last_time(&series) + Duration::hours(7);

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&series, now);
            assert_eq!(res.risk_level(), RiskLevel::Unknown);
            assert!(res.message().contains("too old"));
        }

        let mut config = AnalyzerConfig::default();
        config.season.max_data_age_hours = None;
        for anal in Analyzer::all(&config) {
            let res = anal.analyze(&series, now);
            assert!(res.risk_level().is_known());
        }
    }

    #[test]
    fn test_huge_windows_do_not_panic() {
        let series = stormy_series();
        let now = last_time(&series);

        let mut config = AnalyzerConfig::default();
        config.season.max_data_age_hours = Some(10_000_000_000_000);
        config.fresh_snow.lookback_hours = 10_000_000_000_000;
        config.slaps.rain_window_hours = i64::MAX;
        config.slippery_road.liquid_lookback_hours = i64::MAX;
        config.snowdrift.lookback_hours = 10_000_000_000_000;
        assert!(config.validate().is_err());

        for anal in Analyzer::all(&config) {
            let res = anal.analyze(&series, now);
            assert!(res.risk_level().is_known(), "{:#?}", res);
        }
    }

    #[test]
    fn test_samples_after_the_evaluation_are_unknown() {
        let series = stormy_series();
        let now = last_time(&series) - Duration::hours(1);

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&series, now);
            assert_eq!(res.risk_level(), RiskLevel::Unknown);
            assert!(res.message().contains("later than"));
        }
    }

    #[test]
    fn test_missing_temperature_is_unknown() {
        let series = hourly_series(13, |_, s| {
            s.with_wind_speed(MetersPSec(3.0))
                .with_snow_depth(Cm(30.0))
                .with_precipitation(Mm(0.0))
        });

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            let res = anal.analyze(&series, last_time(&series));
            assert_eq!(res.risk_level(), RiskLevel::Unknown, "{:?}", anal.hazard());
            assert!(res.message().contains("air_temperature"));
        }
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let series = stormy_series();
        let now = last_time(&series);

        for anal in Analyzer::all(&AnalyzerConfig::default()) {
            assert_eq!(anal.analyze(&series, now), anal.analyze(&series, now));
        }
    }

    #[test]
    fn test_current_looks_past_a_short_gap() {
        let series = hourly_series(6, |i, s| match i {
            5 => s,
            _ => s.with_air_temperature(Celsius(i as f64)),
        });
        assert_eq!(current(&series, |s| s.air_temperature), Some(Celsius(4.0)));

        let series = hourly_series(6, |i, s| match i {
            0 => s.with_air_temperature(Celsius(0.0)),
            _ => s,
        });
        assert_eq!(current(&series, |s| s.air_temperature), None);
        assert_eq!(
            required(&series, |s| s.air_temperature, "air_temperature"),
            Err(AnalysisError::MissingValue("air_temperature"))
        );
    }
}
