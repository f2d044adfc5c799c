//! Slush, wet snow mixed with water on top of a snow cover.
use super::{current, evaluate, fmt_opt, required};
use crate::{
    config::{AnalyzerConfig, SlapsThresholds, Season},
    error::Result,
    met_formulas::{precip_phase, PrecipPhase},
    risk::{AnalysisResult, Hazard, RiskLevel},
    sample::WeatherSample,
    series::{mean_air_temperature_over, precip_total_over, snow_change_over},
};
use chrono::NaiveDateTime;
use metfor::{Celsius, Cm, Quantity};

/// Assesses slush.
#[derive(Clone, Debug)]
pub struct SlapsAnalyzer {
    thresholds: SlapsThresholds,
    season: Season,
}

impl SlapsAnalyzer {
    /// Create a new analyzer.
    pub fn new(thresholds: SlapsThresholds, season: Season) -> Self {
        SlapsAnalyzer { thresholds, season }
    }

    /// Create a new analyzer with the relevant parts of the full configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.slaps.clone(), config.season.clone())
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &SlapsThresholds {
        &self.thresholds
    }

    /// Assess the hazard at `now`, never fails.
    pub fn analyze(&self, series: &[WeatherSample], now: NaiveDateTime) -> AnalysisResult {
        evaluate(Hazard::Slaps, &self.season, series, now, |series| {
            slaps_risk(series, &self.thresholds, now)
        })
    }
}

/// Assess slush for a series that is sorted in time.
///
/// Both a recent air temperature and a recent snow depth are required. Missing precipitation in
/// the rain window counts as none.
pub fn slaps_risk(
    series: &[WeatherSample],
    th: &SlapsThresholds,
    now: NaiveDateTime,
) -> Result<AnalysisResult> {
    let air_t: Celsius = required(series, |s| s.air_temperature, "air_temperature")?;
    let depth: Cm = required(series, |s| s.snow_depth, "snow_depth")?;
    let dew_point: Option<Celsius> = current(series, |s| s.dew_point);

    let melt = snow_change_over(series, th.melt_window_hours).map(|c| c.unpack());
    let rain_total = precip_total_over(series, th.rain_window_hours).map_or(0.0, |p| p.unpack());
    let mean_t = mean_air_temperature_over(series, th.falling_window_hours);
    let phase = precip_phase(Some(air_t), dew_point, Celsius(th.rain_air_temp_min));

    let t = air_t.unpack();
    let depth = depth.unpack();

    let result = |level, scenario: &str, message: &str| {
        AnalysisResult::new(Hazard::Slaps, level, scenario, message, now).with_details(vec![
            ("air_temperature", Some(t)),
            ("dew_point", dew_point.map(|dp| dp.unpack())),
            ("snow_depth_cm", Some(depth)),
            ("snow_change_cm", melt),
            ("precip_total_mm", Some(rain_total)),
            ("mean_air_temperature", mean_t.map(|m| m.unpack())),
        ])
    };

    if depth < th.snow_depth_min_cm {
        return Ok(result(RiskLevel::Low, "Lite snø", "For lite snø på bakken for slaps")
            .with_factor(format!(
                "Snødybde {:.1} cm, under {:.1} cm",
                depth, th.snow_depth_min_cm
            )));
    }

    let melt_factor = format!(
        "Snødybde endret {} siste {} timer",
        fmt_opt(melt, "cm"),
        th.melt_window_hours
    );

    if t < th.temp_min {
        return Ok(result(RiskLevel::Low, "Frost", "Frost, ikke slaps")
            .with_factor(format!("Lufttemperatur {:.1} °C holder snøen frossen", t)));
    }

    if t > th.temp_max {
        let warm_melt = melt.map_or(false, |c| c <= -th.warm_melt_threshold_cm);
        return Ok(if warm_melt {
            result(
                RiskLevel::Medium,
                "Mildvær med smelting",
                "Mildvær smelter snødekket, slaps mulig",
            )
            .with_factor(format!("Lufttemperatur {:.1} °C", t))
            .with_factor(melt_factor)
        } else {
            result(RiskLevel::Low, "Mildvær", "For mildt for slaps")
                .with_factor(format!("Lufttemperatur {:.1} °C", t))
        });
    }

    // In the slush band from here on
    let band_factor = format!(
        "Lufttemperatur {:.1} °C, snødybde {:.1} cm",
        t, depth
    );
    let raining = phase == Some(PrecipPhase::Rain) && rain_total >= th.rain_precip_min_mm;
    let melting = melt.map_or(false, |c| c <= -th.melt_threshold_cm);
    let rain_factor = format!(
        "{:.1} mm regn siste {} timer",
        rain_total, th.rain_window_hours
    );

    if raining && melting {
        return Ok(result(
            RiskLevel::High,
            "Kraftig slaps",
            "Regn og snøsmelting gir kraftig slaps",
        )
        .with_factor(rain_factor)
        .with_factor(melt_factor)
        .with_factor(band_factor));
    }

    if raining {
        let level = if rain_total >= th.rain_precip_heavy_mm {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
        return Ok(result(level, "Regn på snø", "Regn på snødekke gir slaps")
            .with_factor(rain_factor)
            .with_factor(band_factor));
    }

    if melting {
        return Ok(result(
            RiskLevel::Medium,
            "Snøsmelting",
            "Snøen smelter, slaps på vegen",
        )
        .with_factor(melt_factor)
        .with_factor(band_factor));
    }

    let falling = mean_t.map_or(false, |m| t < m.unpack() - th.falling_temp_delta);
    if falling {
        return Ok(result(
            RiskLevel::Medium,
            "Frysefare",
            "Fallende temperatur, slaps kan fryse til",
        )
        .with_factor(format!(
            "Lufttemperatur {:.1} °C, snitt siste {} timer {}",
            t,
            th.falling_window_hours,
            fmt_opt(mean_t.map(|m| m.unpack()), "°C")
        ))
        .with_factor(band_factor));
    }

    Ok(result(
        RiskLevel::Low,
        "Stabilt",
        "Temperatur rundt null, men verken regn eller smelting",
    )
    .with_factor(band_factor))
}
