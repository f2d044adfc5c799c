//! Snowdrift, wind transported snow.
//!
//! Every sample in the lookback window is scored on its own, and the verdict is the worst of them.
//! A gust six hours ago closes the road as surely as one right now. Snow can only drift if it is
//! loose, so a mild spell in the last day rules out drifting altogether.
use super::{evaluate, fmt_opt};
use crate::{
    config::{AnalyzerConfig, Season, SnowdriftThresholds},
    error::{AnalysisError, Result},
    met_formulas::{in_wind_sector, wind_chill},
    risk::{AnalysisResult, Hazard, RiskLevel},
    sample::WeatherSample,
    series::{latest_value, newest, snow_change_over, window},
};
use chrono::NaiveDateTime;
use metfor::{Celsius, Quantity};
use std::cmp::Ordering;

/// Assesses snowdrift.
#[derive(Clone, Debug)]
pub struct SnowdriftAnalyzer {
    thresholds: SnowdriftThresholds,
    season: Season,
}

impl SnowdriftAnalyzer {
    /// Create a new analyzer.
    pub fn new(thresholds: SnowdriftThresholds, season: Season) -> Self {
        SnowdriftAnalyzer { thresholds, season }
    }

    /// Create a new analyzer with the relevant parts of the full configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.snowdrift.clone(), config.season.clone())
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &SnowdriftThresholds {
        &self.thresholds
    }

    /// Assess the hazard at `now`, never fails.
    pub fn analyze(&self, series: &[WeatherSample], now: NaiveDateTime) -> AnalysisResult {
        evaluate(Hazard::Snowdrift, &self.season, series, now, |series| {
            snowdrift_risk(series, &self.thresholds, now)
        })
    }
}

/// Whether the snow on the ground is loose enough to drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LooseSnow {
    /// Continuous frost, the snow is loose.
    Available,
    /// Mixed or unknown history, some of the snow may be loose.
    Partial,
    /// A mild spell has packed the snow.
    Unavailable,
}

/// Classify the snow as loose or packed from the air temperature history.
///
/// With no temperatures at all in the window the snow is assumed to be partially loose.
pub fn loose_snow_availability(series: &[WeatherSample], th: &SnowdriftThresholds) -> LooseSnow {
    let temps: Vec<f64> = window(series, th.loose_snow_lookback_hours)
        .iter()
        .filter_map(|s| s.air_temperature.into_option())
        .map(|t| t.unpack())
        .collect();

    if temps.is_empty() {
        LooseSnow::Partial
    } else if temps.iter().all(|&t| t <= th.loose_snow_cold_temp) {
        LooseSnow::Available
    } else if temps.iter().filter(|&&t| t > th.loose_snow_mild_temp).count()
        >= th.loose_snow_mild_hours
    {
        LooseSnow::Unavailable
    } else {
        LooseSnow::Partial
    }
}

/// The verdict for a single sample.
#[derive(Debug)]
struct SampleScore<'a> {
    sample: &'a WeatherSample,
    level: RiskLevel,
    scenario: &'static str,
    message: String,
    factors: Vec<String>,
    air_t: f64,
    wind: f64,
    gust: Option<f64>,
    chill: f64,
    depth: Option<f64>,
}

impl<'a> SampleScore<'a> {
    /// Higher level first, then the stronger gust. Equal scores favor the later sample when used
    /// with `Iterator::max_by`.
    fn cmp_severity(&self, other: &Self) -> Ordering {
        self.level
            .priority()
            .cmp(&other.level.priority())
            .then_with(|| {
                let lhs = self.gust.unwrap_or(f64::NEG_INFINITY);
                let rhs = other.gust.unwrap_or(f64::NEG_INFINITY);
                lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
            })
    }
}

/// A rule that fired for a sample.
struct Trigger {
    level: RiskLevel,
    scenario: &'static str,
    message: String,
    factor: String,
}

/// Score one sample. `None` if the air temperature or wind speed is missing.
fn score_sample<'a>(
    series: &'a [WeatherSample],
    idx: usize,
    th: &SnowdriftThresholds,
) -> Option<SampleScore<'a>> {
    let sample = &series[idx];
    let air_t = sample.air_temperature.into_option()?.unpack();
    let wind_speed = sample.wind_speed.into_option()?;
    let wind = wind_speed.unpack();
    let gust = sample.wind_gust.into_option().map(|g| g.unpack());
    let direction = sample.wind_direction.into_option();
    let chill = wind_chill(Celsius(air_t), wind_speed).unpack();
    // The depth sensor reports less often than the wind, use the last known depth
    let depth = latest_value(&series[..=idx], |s| s.snow_depth).map(|d| d.unpack());

    let score = |level, scenario, message: String, factors: Vec<String>| SampleScore {
        sample,
        level,
        scenario,
        message,
        factors,
        air_t,
        wind,
        gust,
        chill,
        depth,
    };

    match depth {
        Some(d) if d >= th.snow_depth_min_cm => {}
        _ => {
            return Some(score(
                RiskLevel::Low,
                "Lite snø",
                "For lite snø til snøfokk".to_owned(),
                vec![format!(
                    "Snødybde {}, under {:.1} cm",
                    fmt_opt(depth, "cm"),
                    th.snow_depth_min_cm
                )],
            ))
        }
    }

    let cold_enough = air_t <= th.temp_max;
    let mut triggers: Vec<Trigger> = Vec::with_capacity(5);

    if let Some(g) = gust {
        let in_sector = direction.map_or(false, |dir| {
            in_wind_sector(dir, th.critical_wind_dir_min, th.critical_wind_dir_max)
        });
        let gust_factor = format!(
            "Vindkast {:.1} m/s, middelvind {:.1} m/s, retning {}",
            g,
            wind,
            fmt_opt(direction, "°")
        );

        if g >= th.wind_gust_critical && wind >= th.gust_wind_gate_critical && cold_enough {
            let (scenario, message) = if in_sector {
                (
                    "Vindkast-kritisk",
                    format!("KRITISK: vindkast {:.1} m/s fra kritisk retning", g),
                )
            } else {
                ("Vindkast-høy", format!("Høy: vindkast {:.1} m/s", g))
            };
            triggers.push(Trigger {
                level: RiskLevel::High,
                scenario,
                message,
                factor: gust_factor.clone(),
            });
        }

        if g >= th.wind_gust_warning && wind >= th.gust_wind_gate_warning && cold_enough {
            triggers.push(Trigger {
                level: RiskLevel::Medium,
                scenario: "Vindkast-moderat",
                message: format!("Moderat: vindkast {:.1} m/s", g),
                factor: gust_factor,
            });
        }
    }

    let chill_factor = format!("Vindavkjøling {:.1} °C ved {:.1} m/s", chill, wind);
    if chill <= th.wind_chill_critical && wind >= th.wind_speed_critical {
        triggers.push(Trigger {
            level: RiskLevel::High,
            scenario: "Vindavkjøling-kritisk",
            message: format!("Sterk vind og vindavkjøling {:.1} °C", chill),
            factor: chill_factor.clone(),
        });
    }
    if chill <= th.wind_chill_warning && wind >= th.wind_speed_warning {
        triggers.push(Trigger {
            level: RiskLevel::Medium,
            scenario: "Vindavkjøling-moderat",
            message: format!("Vind og vindavkjøling {:.1} °C", chill),
            factor: chill_factor,
        });
    }

    if wind >= th.wind_speed_warning && cold_enough {
        let (level, scenario) = if wind >= th.wind_speed_critical {
            (RiskLevel::High, "Sterk vind")
        } else {
            (RiskLevel::Medium, "Moderat vind")
        };
        triggers.push(Trigger {
            level,
            scenario,
            message: format!("{} {:.1} m/s og løs snø", scenario, wind),
            factor: format!("Middelvind {:.1} m/s ved {:.1} °C", wind, air_t),
        });
    }

    // The highest level wins, the first trigger to reach it names the scenario
    let best = triggers.into_iter().fold(None, |best: Option<Trigger>, trig| match best {
        Some(b) if b.level.priority() >= trig.level.priority() => Some(b),
        _ => Some(trig),
    });

    Some(match best {
        Some(trig) => score(trig.level, trig.scenario, trig.message, vec![trig.factor]),
        None => score(
            RiskLevel::Low,
            "Rolig",
            "Ingen kritisk vind".to_owned(),
            vec![format!(
                "Middelvind {:.1} m/s, vindkast {}",
                wind,
                fmt_opt(gust, "m/s")
            )],
        ),
    })
}

/// Assess snowdrift for a series that is sorted in time.
///
/// Samples without an air temperature or wind speed are skipped. Fails if no sample in the
/// lookback window can be scored, or no snow depth is known at all.
pub fn snowdrift_risk(
    series: &[WeatherSample],
    th: &SnowdriftThresholds,
    now: NaiveDateTime,
) -> Result<AnalysisResult> {
    newest(series)?;
    let start = series.len() - window(series, th.lookback_hours).len();

    let scores: Vec<SampleScore> = (start..series.len())
        .filter_map(|idx| score_sample(series, idx, th))
        .collect();

    if scores.is_empty() {
        let window = &series[start..];
        return Err(if window.iter().all(|s| s.air_temperature.is_none()) {
            AnalysisError::MissingValue("air_temperature")
        } else {
            AnalysisError::MissingValue("wind_speed")
        });
    }

    if scores.iter().all(|sc| sc.depth.is_none()) {
        return Err(AnalysisError::MissingValue("snow_depth"));
    }

    let loose = loose_snow_availability(series, th);
    let snow_change = snow_change_over(series, th.lookback_hours).map(|c| c.unpack());

    let mut peak = scores
        .into_iter()
        .max_by(SampleScore::cmp_severity)
        .ok_or(AnalysisError::EmptySeries)?;

    let loose_factor = match loose {
        LooseSnow::Available => format!(
            "Løs snø: kontinuerlig frost siste {} timer",
            th.loose_snow_lookback_hours
        ),
        LooseSnow::Partial => "Delvis løs snø".to_owned(),
        LooseSnow::Unavailable => format!(
            "Mildvær siste {} timer har pakket snøen",
            th.loose_snow_lookback_hours
        ),
    };

    if loose == LooseSnow::Unavailable {
        peak.level = RiskLevel::Low;
        peak.scenario = "Ingen løs snø";
        peak.message = "Snøen er pakket av mildvær, lite snøfokk".to_owned();
    }

    let mut res = AnalysisResult::new(Hazard::Snowdrift, peak.level, peak.scenario, peak.message, now)
        .with_source_time(peak.sample.valid_time)
        .with_factors(peak.factors)
        .with_factor(loose_factor)
        .with_details(vec![
            ("air_temperature", Some(peak.air_t)),
            ("wind_speed", Some(peak.wind)),
            ("wind_gust", peak.gust),
            ("wind_direction", peak.sample.wind_direction.into_option()),
            ("wind_chill", Some(peak.chill)),
            ("snow_depth_cm", peak.depth),
            ("snow_change_cm", snow_change),
            (
                "loose_snow",
                Some(match loose {
                    LooseSnow::Available => 1.0,
                    LooseSnow::Partial => 0.5,
                    LooseSnow::Unavailable => 0.0,
                }),
            ),
        ]);

    if let Some(change) = snow_change.filter(|&c| c <= th.snow_transport_cm) {
        res = res.with_factor(format!(
            "Snødybde redusert {:.1} cm siste {} timer, snøen flytter seg",
            -change, th.lookback_hours
        ));
    }

    Ok(res)
}
