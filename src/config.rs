//! Thresholds for the analyzers.
//!
//! Every struct here implements `Default` with the calibrated values and `Deserialize` with
//! `#[serde(default)]`, so a configuration file only needs to list the values it changes. Loading
//! the file is up to the caller. Temperatures are in °C, wind in m/s, snow depth in cm,
//! precipitation in mm and windows in hours.

use crate::error::{AnalysisError, Result};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// When hazards are evaluated at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Season {
    /// Months (1 = January) that count as winter.
    pub winter_months: Vec<u32>,
    /// Results are unknown if the newest sample is older than this at the evaluation instant.
    pub max_data_age_hours: Option<i64>,
}

impl Default for Season {
    fn default() -> Self {
        Season {
            winter_months: vec![10, 11, 12, 1, 2, 3, 4],
            max_data_age_hours: Some(6),
        }
    }
}

impl Season {
    /// Whether the evaluation instant falls in a winter month.
    #[inline]
    pub fn is_winter(&self, now: NaiveDateTime) -> bool {
        self.winter_months.contains(&now.month())
    }

    fn validate(&self) -> Result<()> {
        if let Some(month) = self.winter_months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(AnalysisError::InvalidConfig(format!(
                "winter month {} is not in 1-12",
                month
            )));
        }
        if let Some(hours) = self.max_data_age_hours {
            check_positive_hours("max_data_age_hours", hours)?;
        }
        Ok(())
    }
}

/// Thresholds for new snow accumulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshSnowThresholds {
    /// Window for the snow depth change and total precipitation.
    pub lookback_hours: i64,
    /// Window for the precipitation used when the depth sensor is not trusted.
    pub fallback_window_hours: i64,
    /// Without a dew point, precipitation is snow below this air temperature.
    pub air_temp_max: f64,
    /// Depth increase for a warning with dry snow.
    pub dry_snow_warning_cm: f64,
    /// Depth increase for a critical verdict with dry snow.
    pub dry_snow_critical_cm: f64,
    /// Depth increase for a warning with wet snow.
    pub wet_snow_warning_cm: f64,
    /// Depth increase for a critical verdict with wet snow.
    pub wet_snow_critical_cm: f64,
    /// Lower end of the near freezing band for air temperature or dew point.
    pub wet_snow_temp_min: f64,
    /// Upper end of the near freezing band for air temperature or dew point.
    pub wet_snow_temp_max: f64,
    /// A surface temperature this close to 0 °C means wet snow.
    pub wet_surface_band: f64,
    /// Above this wind speed the depth sensor may be swept clean.
    pub wind_gate: f64,
    /// Fallback window precipitation for a warning.
    pub fallback_precip_warning_mm: f64,
    /// Fallback window precipitation for a critical verdict.
    pub fallback_precip_critical_mm: f64,
    /// The surface is cold enough to hold snow at or below this temperature.
    pub surface_temp_max: f64,
    /// Hourly precipitation that counts as snowing right now.
    pub active_precip_min_mm: f64,
}

impl Default for FreshSnowThresholds {
    fn default() -> Self {
        FreshSnowThresholds {
            lookback_hours: 12,
            fallback_window_hours: 6,
            air_temp_max: 1.0,
            dry_snow_warning_cm: 5.0,
            dry_snow_critical_cm: 10.0,
            wet_snow_warning_cm: 3.0,
            wet_snow_critical_cm: 6.0,
            wet_snow_temp_min: -1.0,
            wet_snow_temp_max: 1.0,
            wet_surface_band: 0.5,
            wind_gate: 8.0,
            fallback_precip_warning_mm: 3.0,
            fallback_precip_critical_mm: 6.0,
            surface_temp_max: 0.5,
            active_precip_min_mm: 0.2,
        }
    }
}

impl FreshSnowThresholds {
    fn validate(&self) -> Result<()> {
        check_positive_hours("fresh_snow.lookback_hours", self.lookback_hours)?;
        check_positive_hours("fresh_snow.fallback_window_hours", self.fallback_window_hours)?;
        check_ascending(
            "fresh_snow.dry_snow_warning_cm",
            self.dry_snow_warning_cm,
            "fresh_snow.dry_snow_critical_cm",
            self.dry_snow_critical_cm,
        )?;
        check_ascending(
            "fresh_snow.wet_snow_warning_cm",
            self.wet_snow_warning_cm,
            "fresh_snow.wet_snow_critical_cm",
            self.wet_snow_critical_cm,
        )?;
        check_ascending(
            "fresh_snow.wet_snow_temp_min",
            self.wet_snow_temp_min,
            "fresh_snow.wet_snow_temp_max",
            self.wet_snow_temp_max,
        )?;
        check_ascending(
            "fresh_snow.fallback_precip_warning_mm",
            self.fallback_precip_warning_mm,
            "fresh_snow.fallback_precip_critical_mm",
            self.fallback_precip_critical_mm,
        )
    }
}

/// Thresholds for slush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlapsThresholds {
    /// Bottom of the slush temperature band.
    pub temp_min: f64,
    /// Top of the slush temperature band.
    pub temp_max: f64,
    /// Slush needs at least this much snow on the ground.
    pub snow_depth_min_cm: f64,
    /// Window for accumulated rain.
    pub rain_window_hours: i64,
    /// Rain in the window needed for rain-on-snow.
    pub rain_precip_min_mm: f64,
    /// Rain in the window that makes rain-on-snow a high risk on its own.
    pub rain_precip_heavy_mm: f64,
    /// Without a dew point, precipitation is rain at or above this air temperature.
    pub rain_air_temp_min: f64,
    /// Window for the snow depth decrease.
    pub melt_window_hours: i64,
    /// Depth decrease inside the band that counts as active melting.
    pub melt_threshold_cm: f64,
    /// Depth decrease above the band needed before warm weather is reported.
    pub warm_melt_threshold_cm: f64,
    /// Window for the mean used to detect falling temperatures.
    pub falling_window_hours: i64,
    /// The latest temperature must be this much below the window mean to count as falling.
    pub falling_temp_delta: f64,
}

impl Default for SlapsThresholds {
    fn default() -> Self {
        SlapsThresholds {
            temp_min: -1.0,
            temp_max: 4.0,
            snow_depth_min_cm: 5.0,
            rain_window_hours: 12,
            rain_precip_min_mm: 5.0,
            rain_precip_heavy_mm: 15.0,
            rain_air_temp_min: 1.0,
            melt_window_hours: 6,
            melt_threshold_cm: 2.0,
            warm_melt_threshold_cm: 3.0,
            falling_window_hours: 3,
            falling_temp_delta: 0.5,
        }
    }
}

impl SlapsThresholds {
    fn validate(&self) -> Result<()> {
        check_ascending("slaps.temp_min", self.temp_min, "slaps.temp_max", self.temp_max)?;
        check_ascending(
            "slaps.rain_precip_min_mm",
            self.rain_precip_min_mm,
            "slaps.rain_precip_heavy_mm",
            self.rain_precip_heavy_mm,
        )?;
        check_positive_hours("slaps.rain_window_hours", self.rain_window_hours)?;
        check_positive_hours("slaps.melt_window_hours", self.melt_window_hours)?;
        check_positive_hours("slaps.falling_window_hours", self.falling_window_hours)
    }
}

/// Thresholds for ice on the road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipperyRoadThresholds {
    /// Rain-on-snow needs at least this much snow on the ground.
    pub snow_depth_min_cm: f64,
    /// Window for new snow that sands the road naturally.
    pub recent_snow_window_hours: i64,
    /// Depth increase in that window that counts as new snow.
    pub recent_snow_min_cm: f64,
    /// Hourly precipitation that counts as raining right now.
    pub rain_now_min_mm: f64,
    /// Without a dew point, precipitation is rain at or above this air temperature.
    pub rain_air_temp_min: f64,
    /// Hidden freeze needs an air temperature above this.
    pub hidden_freeze_air_min: f64,
    /// Hidden freeze needs an air temperature at or below this.
    pub hidden_freeze_air_max: f64,
    /// The surface is frozen at or below this temperature.
    pub surface_freeze_threshold: f64,
    /// Window for earlier liquid precipitation that may still freeze.
    pub liquid_lookback_hours: i64,
    /// Liquid precipitation in that window that counts as a wet road.
    pub liquid_precip_min_mm: f64,
    /// Lower end of the air temperature for rain-on-snow.
    pub rain_on_snow_temp_min: f64,
    /// Upper end of the air temperature for rain-on-snow.
    pub rain_on_snow_temp_max: f64,
    /// Window for a recent cold spell before rain-on-snow.
    pub cold_context_hours: i64,
    /// Air or surface temperature below this is a cold spell.
    pub cold_context_temp: f64,
    /// Window for fresh snow under rain.
    pub fresh_snow_window_hours: i64,
    /// Depth increase in that window that counts as fresh snow.
    pub fresh_snow_min_cm: f64,
    /// Lower end of the air temperature for freezing precipitation.
    pub near_freezing_air_min: f64,
    /// Upper end of the air temperature for freezing precipitation.
    pub near_freezing_air_max: f64,
    /// A dew point at or above this with near freezing air means the precipitation is liquid.
    pub freezing_rain_dew_min: f64,
    /// Hourly freezing precipitation for a warning.
    pub freezing_rain_warning_mm: f64,
    /// Hourly freezing precipitation for a critical verdict.
    pub freezing_rain_critical_mm: f64,
    /// Rimfrost needs the air to be within this many degrees of the dew point.
    pub rimfrost_spread_max: f64,
    /// Rimfrost needs at least this relative humidity in percent.
    pub rimfrost_humidity_min: f64,
    /// Rimfrost needs the wind to be at or below this.
    pub rimfrost_wind_max: f64,
    /// Window used to see if the air is warming.
    pub warming_window_hours: i64,
    /// Air temperature rise in that window that counts as warming.
    pub warming_delta: f64,
}

impl Default for SlipperyRoadThresholds {
    fn default() -> Self {
        SlipperyRoadThresholds {
            snow_depth_min_cm: 3.0,
            recent_snow_window_hours: 3,
            recent_snow_min_cm: 1.0,
            rain_now_min_mm: 0.2,
            rain_air_temp_min: 1.0,
            hidden_freeze_air_min: 0.0,
            hidden_freeze_air_max: 4.0,
            surface_freeze_threshold: 0.0,
            liquid_lookback_hours: 12,
            liquid_precip_min_mm: 0.2,
            rain_on_snow_temp_min: 0.0,
            rain_on_snow_temp_max: 4.0,
            cold_context_hours: 6,
            cold_context_temp: -1.0,
            fresh_snow_window_hours: 6,
            fresh_snow_min_cm: 2.0,
            near_freezing_air_min: -3.0,
            near_freezing_air_max: 0.0,
            freezing_rain_dew_min: -1.0,
            freezing_rain_warning_mm: 0.3,
            freezing_rain_critical_mm: 1.0,
            rimfrost_spread_max: 1.0,
            rimfrost_humidity_min: 90.0,
            rimfrost_wind_max: 2.0,
            warming_window_hours: 3,
            warming_delta: 1.0,
        }
    }
}

impl SlipperyRoadThresholds {
    fn validate(&self) -> Result<()> {
        check_ascending(
            "slippery_road.hidden_freeze_air_min",
            self.hidden_freeze_air_min,
            "slippery_road.hidden_freeze_air_max",
            self.hidden_freeze_air_max,
        )?;
        check_ascending(
            "slippery_road.rain_on_snow_temp_min",
            self.rain_on_snow_temp_min,
            "slippery_road.rain_on_snow_temp_max",
            self.rain_on_snow_temp_max,
        )?;
        check_ascending(
            "slippery_road.near_freezing_air_min",
            self.near_freezing_air_min,
            "slippery_road.near_freezing_air_max",
            self.near_freezing_air_max,
        )?;
        check_ascending(
            "slippery_road.freezing_rain_warning_mm",
            self.freezing_rain_warning_mm,
            "slippery_road.freezing_rain_critical_mm",
            self.freezing_rain_critical_mm,
        )?;
        for &(name, hours) in &[
            ("slippery_road.recent_snow_window_hours", self.recent_snow_window_hours),
            ("slippery_road.liquid_lookback_hours", self.liquid_lookback_hours),
            ("slippery_road.cold_context_hours", self.cold_context_hours),
            ("slippery_road.fresh_snow_window_hours", self.fresh_snow_window_hours),
            ("slippery_road.warming_window_hours", self.warming_window_hours),
        ] {
            check_positive_hours(name, hours)?;
        }
        Ok(())
    }
}

/// Thresholds for wind transported snow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowdriftThresholds {
    /// Every sample this far back from the newest one is evaluated.
    pub lookback_hours: i64,
    /// Window for deciding if there is loose snow to transport.
    pub loose_snow_lookback_hours: i64,
    /// All temperatures at or below this keep the snow loose.
    pub loose_snow_cold_temp: f64,
    /// Temperatures above this compact or melt the snow.
    pub loose_snow_mild_temp: f64,
    /// This many mild samples in the window means no loose snow.
    pub loose_snow_mild_hours: usize,
    /// Less snow than this on the ground cannot drift.
    pub snow_depth_min_cm: f64,
    /// Mean wind for a warning.
    pub wind_speed_warning: f64,
    /// Mean wind for a critical verdict.
    pub wind_speed_critical: f64,
    /// Gust for a warning.
    pub wind_gust_warning: f64,
    /// Gust for a critical verdict.
    pub wind_gust_critical: f64,
    /// Mean wind needed alongside a critical gust.
    pub gust_wind_gate_critical: f64,
    /// Mean wind needed alongside a warning gust.
    pub gust_wind_gate_warning: f64,
    /// Wind triggers only apply at or below this air temperature.
    pub temp_max: f64,
    /// Wind chill for a warning.
    pub wind_chill_warning: f64,
    /// Wind chill for a critical verdict.
    pub wind_chill_critical: f64,
    /// Start of the critical wind sector in degrees.
    pub critical_wind_dir_min: f64,
    /// End of the critical wind sector in degrees. Smaller than the start if it wraps north.
    pub critical_wind_dir_max: f64,
    /// A depth change at or below this across the window is snow blown off the sensor.
    pub snow_transport_cm: f64,
}

impl Default for SnowdriftThresholds {
    fn default() -> Self {
        SnowdriftThresholds {
            lookback_hours: 6,
            loose_snow_lookback_hours: 24,
            loose_snow_cold_temp: -1.0,
            loose_snow_mild_temp: 0.0,
            loose_snow_mild_hours: 6,
            snow_depth_min_cm: 3.0,
            wind_speed_warning: 7.0,
            wind_speed_critical: 10.0,
            wind_gust_warning: 15.0,
            wind_gust_critical: 20.0,
            gust_wind_gate_critical: 8.0,
            gust_wind_gate_warning: 5.0,
            temp_max: -1.0,
            wind_chill_warning: -10.0,
            wind_chill_critical: -15.0,
            critical_wind_dir_min: 170.0,
            critical_wind_dir_max: 270.0,
            snow_transport_cm: -3.0,
        }
    }
}

impl SnowdriftThresholds {
    fn validate(&self) -> Result<()> {
        check_ascending(
            "snowdrift.wind_speed_warning",
            self.wind_speed_warning,
            "snowdrift.wind_speed_critical",
            self.wind_speed_critical,
        )?;
        check_ascending(
            "snowdrift.wind_gust_warning",
            self.wind_gust_warning,
            "snowdrift.wind_gust_critical",
            self.wind_gust_critical,
        )?;
        check_ascending(
            "snowdrift.wind_chill_critical",
            self.wind_chill_critical,
            "snowdrift.wind_chill_warning",
            self.wind_chill_warning,
        )?;
        for &(name, dir) in &[
            ("snowdrift.critical_wind_dir_min", self.critical_wind_dir_min),
            ("snowdrift.critical_wind_dir_max", self.critical_wind_dir_max),
        ] {
            if !(0.0..=360.0).contains(&dir) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} = {} is not a compass bearing",
                    name, dir
                )));
            }
        }
        check_positive_hours("snowdrift.lookback_hours", self.lookback_hours)?;
        check_positive_hours(
            "snowdrift.loose_snow_lookback_hours",
            self.loose_snow_lookback_hours,
        )
    }
}

/// All the thresholds needed to run every analyzer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Season and data age gates shared by all analyzers.
    pub season: Season,
    /// New snow thresholds.
    pub fresh_snow: FreshSnowThresholds,
    /// Slush thresholds.
    pub slaps: SlapsThresholds,
    /// Ice thresholds.
    pub slippery_road: SlipperyRoadThresholds,
    /// Snowdrift thresholds.
    pub snowdrift: SnowdriftThresholds,
}

impl AnalyzerConfig {
    /// Check that the thresholds are consistent, e.g. every warning level is below its critical
    /// level and every window is a positive number of hours.
    pub fn validate(&self) -> Result<()> {
        self.season.validate()?;
        self.fresh_snow.validate()?;
        self.slaps.validate()?;
        self.slippery_road.validate()?;
        self.snowdrift.validate()
    }
}

/// Longest window or data age accepted, one year.
const MAX_HOURS: i64 = 24 * 366;

fn check_positive_hours(name: &str, hours: i64) -> Result<()> {
    if hours > 0 && hours <= MAX_HOURS {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{} must be between 1 and {} hours, got {}",
            name, MAX_HOURS, hours
        )))
    }
}

fn check_ascending(low_name: &str, low: f64, high_name: &str, high: f64) -> Result<()> {
    if low <= high {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{} ({}) must not exceed {} ({})",
            low_name, low, high_name, high
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::start_time;
    use chrono::NaiveDate;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_season_gate() {
        let season = Season::default();

        assert!(season.is_winter(start_time()));

        let july = NaiveDate::from_ymd_opt(2024, 7, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        assert!(!season.is_winter(july));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: AnalyzerConfig = serde_json::from_str(
            r#"{ "snowdrift": { "wind_gust_critical": 22.5 }, "season": { "winter_months": [11, 12, 1, 2, 3] } }"#,
        )
        .unwrap();

        assert_eq!(cfg.snowdrift.wind_gust_critical, 22.5);
        assert_eq!(cfg.snowdrift.wind_gust_warning, 15.0);
        assert_eq!(cfg.season.winter_months, vec![11, 12, 1, 2, 3]);
        assert_eq!(cfg.season.max_data_age_hours, Some(6));
        assert_eq!(cfg.slaps, SlapsThresholds::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_inverted_thresholds() {
        let mut cfg = AnalyzerConfig::default();
        cfg.snowdrift.wind_gust_warning = 25.0;
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut cfg = AnalyzerConfig::default();
        cfg.season.winter_months.push(13);
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut cfg = AnalyzerConfig::default();
        cfg.fresh_snow.lookback_hours = 0;
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut cfg = AnalyzerConfig::default();
        cfg.snowdrift.critical_wind_dir_max = 400.0;
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation_rejects_huge_windows() {
        let mut cfg = AnalyzerConfig::default();
        cfg.snowdrift.lookback_hours = 10_000_000_000_000;
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut cfg = AnalyzerConfig::default();
        cfg.season.max_data_age_hours = Some(i64::MAX);
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut cfg = AnalyzerConfig::default();
        cfg.slaps.rain_window_hours = MAX_HOURS;
        assert!(cfg.validate().is_ok());
    }
}
