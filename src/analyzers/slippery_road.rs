//! Ice on the road.
//!
//! The rules are tuned for a road with an established snow or ice cover, or frozen ground. The
//! branches are tried in order and the first one that applies decides the verdict:
//!
//! 1. Fresh snow gives friction, relief unless it is raining.
//! 2. Hidden freeze, mild air above a frozen surface.
//! 3. Rain on a snow cover, with or without cold in the recent past.
//! 4. Freezing precipitation on a frozen surface.
//! 5. Quiet weather, with a few low risk variants.
use super::{current, evaluate, fmt_opt, required};
use crate::{
    config::{AnalyzerConfig, Season, SlipperyRoadThresholds},
    error::Result,
    met_formulas::{precip_phase, relative_humidity, PrecipPhase},
    risk::{AnalysisResult, Hazard, RiskLevel},
    sample::WeatherSample,
    series::{any_over, liquid_precip_over, mean_air_temperature_over, newest, snow_change_over},
};
use chrono::NaiveDateTime;
use metfor::{Celsius, Quantity};

/// Appended to every medium or high slippery road verdict.
pub const SNOW_ICE_CAVEAT: &str = "Forutsetter etablert snø-/isdekke eller frossen grunn; regn på \
                                   bar asfalt tidlig i sesongen eller om våren gir ikke samme \
                                   risiko.";

/// Assesses slippery roads.
#[derive(Clone, Debug)]
pub struct SlipperyRoadAnalyzer {
    thresholds: SlipperyRoadThresholds,
    season: Season,
}

impl SlipperyRoadAnalyzer {
    /// Create a new analyzer.
    pub fn new(thresholds: SlipperyRoadThresholds, season: Season) -> Self {
        SlipperyRoadAnalyzer { thresholds, season }
    }

    /// Create a new analyzer with the relevant parts of the full configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.slippery_road.clone(), config.season.clone())
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &SlipperyRoadThresholds {
        &self.thresholds
    }

    /// Assess the hazard at `now`, never fails.
    pub fn analyze(&self, series: &[WeatherSample], now: NaiveDateTime) -> AnalysisResult {
        evaluate(Hazard::SlipperyRoad, &self.season, series, now, |series| {
            slippery_road_risk(series, &self.thresholds, now)
        })
    }
}

/// The current conditions and recent history the rules look at.
#[derive(Debug)]
struct Conditions {
    air_t: f64,
    surface_t: Option<f64>,
    dew_point: Option<f64>,
    humidity: Option<f64>,
    wind: Option<f64>,
    depth: Option<f64>,
    precip_now: Option<f64>,
    rain_now: bool,
    recent_snow: Option<f64>,
    fresh_snow: Option<f64>,
    liquid_recent: f64,
    cold_context: bool,
    warming: bool,
}

impl Conditions {
    fn gather(series: &[WeatherSample], th: &SlipperyRoadThresholds) -> Result<Self> {
        let air_t: Celsius = required(series, |s| s.air_temperature, "air_temperature")?;
        let surface_t: Option<Celsius> = current(series, |s| s.surface_temperature);
        let dew_point: Option<Celsius> = current(series, |s| s.dew_point);
        let rain_t = Celsius(th.rain_air_temp_min);

        // The latest hour only, an earlier shower isn't "now"
        let precip_now = newest(series)?.precipitation.into_option().map(|p| p.unpack());
        let rain_now = precip_now.map_or(false, |pcp| pcp >= th.rain_now_min_mm)
            && precip_phase(Some(air_t), dew_point, rain_t) == Some(PrecipPhase::Rain);

        let cold = Celsius(th.cold_context_temp);
        let cold_context = any_over(series, th.cold_context_hours, |s| {
            s.air_temperature.into_option().map_or(false, |t| t < cold)
                || s.surface_temperature.into_option().map_or(false, |t| t < cold)
        });

        let warming = mean_air_temperature_over(series, th.warming_window_hours)
            .map_or(false, |mean| air_t.unpack() - mean.unpack() >= th.warming_delta);

        Ok(Conditions {
            air_t: air_t.unpack(),
            surface_t: surface_t.map(|t| t.unpack()),
            dew_point: dew_point.map(|t| t.unpack()),
            humidity: relative_humidity(
                current(series, |s| s.relative_humidity),
                Some(air_t),
                dew_point,
            ),
            wind: current(series, |s| s.wind_speed).map(|w| w.unpack()),
            depth: current(series, |s| s.snow_depth).map(|d| d.unpack()),
            precip_now,
            rain_now,
            recent_snow: snow_change_over(series, th.recent_snow_window_hours).map(|c| c.unpack()),
            fresh_snow: snow_change_over(series, th.fresh_snow_window_hours).map(|c| c.unpack()),
            liquid_recent: liquid_precip_over(series, th.liquid_lookback_hours, rain_t)
                .map_or(0.0, |p| p.unpack()),
            cold_context,
            warming,
        })
    }

    fn surface_frozen(&self, th: &SlipperyRoadThresholds) -> bool {
        self.surface_t
            .map_or(false, |st| st <= th.surface_freeze_threshold)
    }

    fn details(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("air_temperature", Some(self.air_t)),
            ("surface_temperature", self.surface_t),
            ("dew_point", self.dew_point),
            ("relative_humidity", self.humidity),
            ("wind_speed", self.wind),
            ("snow_depth_cm", self.depth),
            ("precip_now_mm", self.precip_now),
            ("recent_snow_change_cm", self.recent_snow),
            ("fresh_snow_change_cm", self.fresh_snow),
            ("liquid_precip_mm", Some(self.liquid_recent)),
            ("cold_context", Some(if self.cold_context { 1.0 } else { 0.0 })),
        ]
    }

    fn temperature_factor(&self) -> String {
        format!(
            "Luft {:.1} °C, vegbane {}, duggpunkt {}",
            self.air_t,
            fmt_opt(self.surface_t, "°C"),
            fmt_opt(self.dew_point, "°C")
        )
    }
}

/// Assess slippery road conditions for a series that is sorted in time.
///
/// Fails if the series is empty or there is no recent air temperature. Other missing values only
/// rule out the branches that need them.
pub fn slippery_road_risk(
    series: &[WeatherSample],
    th: &SlipperyRoadThresholds,
    now: NaiveDateTime,
) -> Result<AnalysisResult> {
    let cond = Conditions::gather(series, th)?;

    let verdict = relief(&cond, th)
        .or_else(|| hidden_freeze(&cond, th))
        .or_else(|| rain_on_snow(&cond, th))
        .or_else(|| freezing_precipitation(&cond, th))
        .unwrap_or_else(|| quiet_weather(&cond, th));

    let res = AnalysisResult::new(
        Hazard::SlipperyRoad,
        verdict.level,
        verdict.scenario,
        verdict.message,
        now,
    )
    .with_details(cond.details())
    .with_factors(verdict.factors)
    .with_factor(cond.temperature_factor());

    Ok(if res.risk_level() >= RiskLevel::Medium {
        res.with_factor(SNOW_ICE_CAVEAT)
    } else {
        res
    })
}

/// The outcome of a branch before it is turned into a result.
struct Verdict {
    level: RiskLevel,
    scenario: &'static str,
    message: &'static str,
    factors: Vec<String>,
}

impl Verdict {
    fn new(level: RiskLevel, scenario: &'static str, message: &'static str) -> Self {
        Verdict {
            level,
            scenario,
            message,
            factors: vec![],
        }
    }

    fn with_factor(mut self, factor: String) -> Self {
        self.factors.push(factor);
        self
    }
}

fn relief(cond: &Conditions, th: &SlipperyRoadThresholds) -> Option<Verdict> {
    let snow = cond.recent_snow.filter(|&c| c >= th.recent_snow_min_cm)?;

    if cond.rain_now {
        return None;
    }

    Some(
        Verdict::new(RiskLevel::Low, "Nysnø", "Nysnø gir bedre friksjon").with_factor(format!(
            "Snødybde økt {:.1} cm siste {} timer",
            snow, th.recent_snow_window_hours
        )),
    )
}

fn hidden_freeze(cond: &Conditions, th: &SlipperyRoadThresholds) -> Option<Verdict> {
    let mild_air = cond.air_t > th.hidden_freeze_air_min && cond.air_t <= th.hidden_freeze_air_max;
    if !mild_air || !cond.surface_frozen(th) {
        return None;
    }

    let frozen_factor = format!(
        "Mild luft over frossen vegbane ({})",
        fmt_opt(cond.surface_t, "°C")
    );

    let verdict = if cond.rain_now {
        Verdict::new(
            RiskLevel::High,
            "Skjult frost",
            "Regn fryser på kald vegbane",
        )
        .with_factor(frozen_factor)
        .with_factor(format!("Regn nå: {}", fmt_opt(cond.precip_now, "mm")))
    } else if cond.liquid_recent >= th.liquid_precip_min_mm {
        Verdict::new(
            RiskLevel::Medium,
            "Skjult frost",
            "Våt vegbane kan fryse",
        )
        .with_factor(frozen_factor)
        .with_factor(format!(
            "{:.1} mm regn siste {} timer",
            cond.liquid_recent, th.liquid_lookback_hours
        ))
    } else {
        Verdict::new(
            RiskLevel::Low,
            "Kald bakke uten regn",
            "Kald vegbane, men ikke noe vann som kan fryse",
        )
        .with_factor(frozen_factor)
    };

    Some(verdict)
}

fn rain_on_snow(cond: &Conditions, th: &SlipperyRoadThresholds) -> Option<Verdict> {
    let in_band = cond.air_t >= th.rain_on_snow_temp_min && cond.air_t <= th.rain_on_snow_temp_max;
    let snow_cover = cond
        .depth
        .filter(|&d| d >= th.snow_depth_min_cm)?;

    if !in_band || !cond.rain_now {
        return None;
    }

    let cover_factor = format!(
        "Regn ({}) på {:.1} cm snø",
        fmt_opt(cond.precip_now, "mm"),
        snow_cover
    );
    let fresh = cond
        .fresh_snow
        .map_or(false, |c| c >= th.fresh_snow_min_cm);

    let verdict = match (cond.cold_context, fresh) {
        (true, false) => Verdict::new(
            RiskLevel::High,
            "Regn på snø",
            "Regn på gammel, kald snø gir blank is",
        )
        .with_factor(cover_factor)
        .with_factor(format!(
            "Kuldegrader siste {} timer",
            th.cold_context_hours
        )),
        (true, true) => Verdict::new(
            RiskLevel::Medium,
            "Regn på nysnø",
            "Regn på nysnø, sørpete og glatt",
        )
        .with_factor(cover_factor)
        .with_factor(format!(
            "Nysnø {} siste {} timer demper isdannelsen",
            fmt_opt(cond.fresh_snow, "cm"),
            th.fresh_snow_window_hours
        )),
        (false, _) => Verdict::new(
            RiskLevel::Medium,
            "Vått/slaps",
            "Vått/slaps, ikke is",
        )
        .with_factor(cover_factor)
        .with_factor(format!(
            "Ingen kuldegrader siste {} timer",
            th.cold_context_hours
        )),
    };

    Some(verdict)
}

fn freezing_precipitation(cond: &Conditions, th: &SlipperyRoadThresholds) -> Option<Verdict> {
    let near_freezing =
        cond.air_t >= th.near_freezing_air_min && cond.air_t <= th.near_freezing_air_max;
    let liquid = cond.dew_point.map_or(false, |dp| dp >= th.freezing_rain_dew_min);
    let precip = cond.precip_now?;

    if !cond.surface_frozen(th) || !near_freezing || !liquid {
        return None;
    }

    let level = if precip >= th.freezing_rain_critical_mm {
        RiskLevel::High
    } else if precip >= th.freezing_rain_warning_mm {
        RiskLevel::Medium
    } else {
        return None;
    };

    Some(
        Verdict::new(
            level,
            "Underkjølt nedbør",
            "Underkjølt regn fryser på vegbanen",
        )
        .with_factor(format!(
            "{:.1} mm nedbør med duggpunkt {}",
            precip,
            fmt_opt(cond.dew_point, "°C")
        )),
    )
}

fn quiet_weather(cond: &Conditions, th: &SlipperyRoadThresholds) -> Verdict {
    let frozen = cond.surface_frozen(th);

    // Hoar frost on a snow covered road hardly changes the friction
    let spread = cond.dew_point.map(|dp| (cond.air_t - dp).abs());
    let rimfrost = frozen
        && spread.map_or(false, |s| s <= th.rimfrost_spread_max)
        && cond.humidity.map_or(false, |rh| rh >= th.rimfrost_humidity_min)
        && cond.wind.map_or(false, |w| w <= th.rimfrost_wind_max);

    if rimfrost {
        Verdict::new(
            RiskLevel::Low,
            "Rimfrost",
            "Mulig rimfrost, liten betydning på snødekt veg",
        )
        .with_factor(format!(
            "Rimfrost mulig: fuktighet {}, vind {}",
            fmt_opt(cond.humidity, "%"),
            fmt_opt(cond.wind, "m/s")
        ))
    } else if cond.rain_now {
        Verdict::new(RiskLevel::Low, "Våt veg", "Regn på mild veg, ingen frysefare")
    } else if frozen {
        Verdict::new(RiskLevel::Low, "Tørr kald veg", "Kald, men tørr vegbane")
    } else if cond.warming {
        Verdict::new(RiskLevel::Low, "Mildvær uten regn", "Mildvær uten regn")
            .with_factor(format!(
                "Temperaturen har steget minst {:.1} °C siste {} timer",
                th.warming_delta, th.warming_window_hours
            ))
    } else {
        Verdict::new(RiskLevel::Low, "Normale forhold", "Ingen tegn til glatte veger")
    }
}
