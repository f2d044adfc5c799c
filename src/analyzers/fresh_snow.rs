//! New snow on the road.
//!
//! The primary signal is the increase in snow depth over the lookback window, compared against
//! thresholds that are lower for wet, heavy snow than for dry snow. In strong wind the depth
//! sensor is often swept clean, so precipitation falling as snow on a cold surface is used instead.
use super::{evaluate, fmt_opt, required};
use crate::{
    config::{AnalyzerConfig, FreshSnowThresholds, Season},
    error::Result,
    met_formulas::{precip_phase, PrecipPhase},
    risk::{AnalysisResult, Hazard, RiskLevel},
    sample::WeatherSample,
    series::{newest, precip_total_over, snow_change_over},
};
use chrono::NaiveDateTime;
use metfor::{Celsius, Quantity};

/// Assesses new snow accumulation.
#[derive(Clone, Debug)]
pub struct FreshSnowAnalyzer {
    thresholds: FreshSnowThresholds,
    season: Season,
}

impl FreshSnowAnalyzer {
    /// Create a new analyzer.
    pub fn new(thresholds: FreshSnowThresholds, season: Season) -> Self {
        FreshSnowAnalyzer { thresholds, season }
    }

    /// Create a new analyzer with the relevant parts of the full configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.fresh_snow.clone(), config.season.clone())
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &FreshSnowThresholds {
        &self.thresholds
    }

    /// Assess the hazard at `now`, never fails.
    pub fn analyze(&self, series: &[WeatherSample], now: NaiveDateTime) -> AnalysisResult {
        evaluate(Hazard::FreshSnow, &self.season, series, now, |series| {
            fresh_snow_risk(series, &self.thresholds, now)
        })
    }
}

/// Assess new snow accumulation for a series that is sorted in time.
///
/// Fails if the series is empty or there is no recent air temperature.
pub fn fresh_snow_risk(
    series: &[WeatherSample],
    th: &FreshSnowThresholds,
    now: NaiveDateTime,
) -> Result<AnalysisResult> {
    let latest = newest(series)?;
    let air_t: Celsius = required(series, |s| s.air_temperature, "air_temperature")?;
    let dew_point: Option<Celsius> = latest.dew_point.into_option();
    let surface_t: Option<Celsius> = latest.surface_temperature.into_option();
    let wind = latest.wind_speed.into_option().map(|w| w.unpack());
    let precip_now = latest.precipitation.into_option().map(|p| p.unpack());

    let snow_change = snow_change_over(series, th.lookback_hours).map(|c| c.unpack());
    let precip_total = precip_total_over(series, th.lookback_hours).map(|p| p.unpack());
    let precip_fallback = precip_total_over(series, th.fallback_window_hours).map(|p| p.unpack());

    let is_snowing =
        precip_phase(Some(air_t), dew_point, Celsius(th.air_temp_max)) == Some(PrecipPhase::Snow);
    let wet = is_wet_snow(air_t, dew_point, surface_t, th);
    let (warning, critical, kind) = if wet {
        (th.wet_snow_warning_cm, th.wet_snow_critical_cm, "våt")
    } else {
        (th.dry_snow_warning_cm, th.dry_snow_critical_cm, "tørr")
    };
    let surface_cold = match surface_t {
        Some(st) => st <= Celsius(th.surface_temp_max),
        None => air_t <= Celsius(th.air_temp_max),
    };

    let kind_factor = format!(
        "{} snø (luft {:.1} °C, duggpunkt {}, vegbane {})",
        if wet { "Våt" } else { "Tørr" },
        air_t.unpack(),
        fmt_opt(dew_point.map(|t| t.unpack()), "°C"),
        fmt_opt(surface_t.map(|t| t.unpack()), "°C"),
    );
    let change_factor = format!(
        "Snødybde endret {} siste {} timer",
        fmt_opt(snow_change, "cm"),
        th.lookback_hours
    );

    let result = |level, scenario: &str, message: String| {
        AnalysisResult::new(Hazard::FreshSnow, level, scenario, message, now).with_details(vec![
            ("snow_change_cm", snow_change),
            ("precip_total_mm", precip_total),
            ("precip_fallback_mm", precip_fallback),
            ("precip_now_mm", precip_now),
            ("air_temperature", Some(air_t.unpack())),
            ("dew_point", dew_point.map(|t| t.unpack())),
            ("surface_temperature", surface_t.map(|t| t.unpack())),
            ("wind_speed", wind),
            ("warning_threshold_cm", Some(warning)),
            ("critical_threshold_cm", Some(critical)),
            ("wet_snow", Some(if wet { 1.0 } else { 0.0 })),
        ])
    };

    // Depth increase, the direct evidence
    if let Some(change) = snow_change {
        if change >= critical {
            return Ok(result(
                RiskLevel::High,
                "Kraftig snøfall",
                format!(
                    "Kraftig snøfall: {:.1} cm nysnø siste {} timer",
                    change, th.lookback_hours
                ),
            )
            .with_factor(format!(
                "Snødybde økt {:.1} cm, grensen for {} snø er {:.1} cm",
                change, kind, critical
            ))
            .with_factor(kind_factor));
        }

        if change >= warning {
            return Ok(result(
                RiskLevel::Medium,
                "Moderat snøfall",
                format!(
                    "Moderat snøfall: {:.1} cm nysnø siste {} timer",
                    change, th.lookback_hours
                ),
            )
            .with_factor(format!(
                "Snødybde økt {:.1} cm, varselgrensen for {} snø er {:.1} cm",
                change, kind, warning
            ))
            .with_factor(kind_factor));
        }
    }

    // Windy, so the depth sensor can't be trusted, use the precipitation instead
    let windy = wind.map_or(false, |w| w > th.wind_gate);
    if windy && is_snowing && surface_cold {
        let fallback_factor = format!(
            "Vind {} kan ha blåst snøen bort fra målestedet, {} nedbør siste {} timer",
            fmt_opt(wind, "m/s"),
            fmt_opt(precip_fallback, "mm"),
            th.fallback_window_hours
        );

        match precip_fallback {
            Some(pcp) if pcp >= th.fallback_precip_critical_mm => {
                return Ok(result(
                    RiskLevel::High,
                    "Snøfall i vind",
                    format!("Kraftig snøfall i sterk vind: {:.1} mm nedbør som snø", pcp),
                )
                .with_factor(fallback_factor)
                .with_factor(change_factor)
                .with_factor(kind_factor));
            }
            Some(pcp) if pcp >= th.fallback_precip_warning_mm => {
                return Ok(result(
                    RiskLevel::Medium,
                    "Snøfall i vind",
                    format!("Snøfall i sterk vind: {:.1} mm nedbør som snø", pcp),
                )
                .with_factor(fallback_factor)
                .with_factor(change_factor)
                .with_factor(kind_factor));
            }
            _ => {}
        }
    }

    // It is snowing now and the road holds it
    let active = precip_now.map_or(false, |pcp| pcp >= th.active_precip_min_mm);
    if active && is_snowing && surface_cold {
        return Ok(result(
            RiskLevel::Medium,
            "Aktivt snøfall",
            "Snøfall pågår og vegbanen er kald nok til at snøen legger seg".to_owned(),
        )
        .with_factor(format!(
            "Nedbør som snø nå: {}",
            fmt_opt(precip_now, "mm")
        ))
        .with_factor(change_factor)
        .with_factor(kind_factor));
    }

    let some_snow = snow_change.map_or(false, |c| c > 0.0)
        || (is_snowing && precip_total.map_or(false, |pcp| pcp > 0.0));

    if some_snow && !surface_cold {
        Ok(result(
            RiskLevel::Low,
            "Snø på mild veg",
            "Noe snøfall, men vegbanen er for mild til at snøen legger seg".to_owned(),
        )
        .with_factor(change_factor)
        .with_factor(kind_factor))
    } else if some_snow {
        Ok(result(
            RiskLevel::Low,
            "Lett snøfall",
            "Lett snøfall under varslingsgrensene".to_owned(),
        )
        .with_factor(change_factor)
        .with_factor(kind_factor))
    } else {
        Ok(result(
            RiskLevel::Low,
            "Stabilt",
            "Ingen vesentlig nysnø".to_owned(),
        )
        .with_factor(change_factor))
    }
}

/// Wet snow when the air, the dew point or the road surface is close to freezing.
fn is_wet_snow(
    air_t: Celsius,
    dew_point: Option<Celsius>,
    surface_t: Option<Celsius>,
    th: &FreshSnowThresholds,
) -> bool {
    let in_band = |t: Celsius| {
        let t = t.unpack();
        t >= th.wet_snow_temp_min && t <= th.wet_snow_temp_max
    };

    in_band(air_t)
        || dew_point.map_or(false, in_band)
        || surface_t.map_or(false, |st| st.unpack().abs() <= th.wet_surface_band)
}
