//! Data type for a single weather observation.

use chrono::NaiveDateTime;
use metfor::{Celsius, Cm, MetersPSec, Mm};
use optional::Optioned;

/// One row of the weather time series.
///
/// Any value may be missing. Floating point values that are NaN are also treated as missing since
/// `Optioned` uses NaN as its marker for none.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherSample {
    /// Valid time of the observation, UTC.
    pub valid_time: NaiveDateTime,
    /// Air temperature at screen height.
    pub air_temperature: Optioned<Celsius>,
    /// Road or ground surface temperature.
    pub surface_temperature: Optioned<Celsius>,
    /// Mean wind speed.
    pub wind_speed: Optioned<MetersPSec>,
    /// Maximum wind gust.
    pub wind_gust: Optioned<MetersPSec>,
    /// Direction the wind blows from in degrees, 0-360.
    pub wind_direction: Optioned<f64>,
    /// Depth of snow on the ground.
    pub snow_depth: Optioned<Cm>,
    /// Precipitation accumulated over the hour ending at `valid_time`.
    pub precipitation: Optioned<Mm>,
    /// Dew point temperature.
    pub dew_point: Optioned<Celsius>,
    /// Relative humidity in percent.
    pub relative_humidity: Optioned<f64>,
}

impl WeatherSample {
    /// Create a sample valid at `valid_time` with every value missing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use metfor::{Celsius, Cm, MetersPSec};
    /// use winter_road_analysis::WeatherSample;
    ///
    /// let valid_time = NaiveDate::from_ymd_opt(2024, 1, 15)
    ///     .and_then(|d| d.and_hms_opt(6, 0, 0))
    ///     .unwrap();
    ///
    /// let sample = WeatherSample::new(valid_time)
    ///     .with_air_temperature(Celsius(-5.0))
    ///     .with_wind_speed(MetersPSec(10.3))
    ///     .with_snow_depth(Cm(50.0));
    ///
    /// assert!(sample.air_temperature.is_some());
    /// assert!(sample.dew_point.is_none());
    /// ```
    #[inline]
    pub fn new(valid_time: NaiveDateTime) -> Self {
        WeatherSample {
            valid_time,
            air_temperature: Optioned::none(),
            surface_temperature: Optioned::none(),
            wind_speed: Optioned::none(),
            wind_gust: Optioned::none(),
            wind_direction: Optioned::none(),
            snow_depth: Optioned::none(),
            precipitation: Optioned::none(),
            dew_point: Optioned::none(),
            relative_humidity: Optioned::none(),
        }
    }

    /// Builder method for the air temperature.
    #[inline]
    pub fn with_air_temperature<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + metfor::Temperature,
        Celsius: From<U>,
    {
        let temperature: Optioned<U> = Optioned::from(value);
        self.air_temperature = temperature.map_t(Celsius::from);
        self
    }

    /// Builder method for the surface temperature.
    #[inline]
    pub fn with_surface_temperature<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + metfor::Temperature,
        Celsius: From<U>,
    {
        let temperature: Optioned<U> = Optioned::from(value);
        self.surface_temperature = temperature.map_t(Celsius::from);
        self
    }

    /// Builder method for the dew point.
    #[inline]
    pub fn with_dew_point<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + metfor::Temperature,
        Celsius: From<U>,
    {
        let dew_point: Optioned<U> = Optioned::from(value);
        self.dew_point = dew_point.map_t(Celsius::from);
        self
    }

    /// Builder method for the mean wind speed.
    #[inline]
    pub fn with_wind_speed<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + Copy,
        MetersPSec: From<U>,
    {
        let speed: Optioned<U> = Optioned::from(value);
        self.wind_speed = speed.map_t(MetersPSec::from);
        self
    }

    /// Builder method for the wind gust.
    #[inline]
    pub fn with_wind_gust<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + Copy,
        MetersPSec: From<U>,
    {
        let gust: Optioned<U> = Optioned::from(value);
        self.wind_gust = gust.map_t(MetersPSec::from);
        self
    }

    /// Builder method for the wind direction in degrees, wrapped into `[0, 360)`.
    #[inline]
    pub fn with_wind_direction<T>(mut self, value: T) -> Self
    where
        Optioned<f64>: From<T>,
    {
        let direction: Optioned<f64> = Optioned::from(value);
        self.wind_direction = direction.map_t(|dir| dir.rem_euclid(360.0));
        self
    }

    /// Builder method for the snow depth.
    ///
    /// Negative depths are sensor sentinels and are stored as missing.
    #[inline]
    pub fn with_snow_depth<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + metfor::Length,
        Cm: From<U>,
    {
        let depth: Optioned<U> = Optioned::from(value);
        let depth: Option<Cm> = depth
            .into_option()
            .map(Cm::from)
            .filter(|depth: &Cm| <Cm as PartialOrd<Cm>>::ge(depth, &Cm(0.0)));

        self.snow_depth = Optioned::<Cm>::from(depth);
        self
    }

    /// Builder method for the one hour precipitation.
    #[inline]
    pub fn with_precipitation<T, U>(mut self, value: T) -> Self
    where
        Optioned<U>: From<T>,
        U: optional::Noned + metfor::Length,
        Mm: From<U>,
    {
        let precipitation: Optioned<U> = Optioned::from(value);
        self.precipitation = precipitation.map_t(Mm::from);
        self
    }

    /// Builder method for the relative humidity in percent.
    #[inline]
    pub fn with_relative_humidity<T>(mut self, value: T) -> Self
    where
        Optioned<f64>: From<T>,
    {
        self.relative_humidity = Optioned::from(value);
        self
    }
}
