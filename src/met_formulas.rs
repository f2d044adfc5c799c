//! Meteorological formulas shared by the analyzers.

use metfor::{Celsius, MetersPSec, Quantity, FREEZING};

/// Lowest wind speed the wind chill formula is valid for, 4.8 km/h.
const MIN_WIND_CHILL_SPEED: MetersPSec = MetersPSec(1.34);

/// Highest temperature the wind chill formula is valid for.
const MAX_WIND_CHILL_TEMPERATURE: Celsius = Celsius(10.0);

/// Wind chill temperature.
///
/// Outside the valid domain of the formula, temperatures of 10 °C and above or wind speeds below
/// 1.34 m/s, the air temperature is returned unchanged.
///
/// # References
///
/// Osczevski, R., & Bluestein, M. (2005). **The New Wind Chill Equivalent Temperature Chart**,
///     Bulletin of the American Meteorological Society, 86(10), 1453-1458.
///
/// # Examples
///
/// ```rust
/// use metfor::{Celsius, MetersPSec, Quantity};
/// use winter_road_analysis::met_formulas::wind_chill;
///
/// let chill = wind_chill(Celsius(-10.0), MetersPSec(10.0));
/// assert!((chill.unpack() - -20.3).abs() < 0.1);
///
/// // Calm wind, no chill
/// assert_eq!(wind_chill(Celsius(-10.0), MetersPSec(1.0)), Celsius(-10.0));
/// ```
pub fn wind_chill(temperature: Celsius, wind_speed: MetersPSec) -> Celsius {
    if temperature >= MAX_WIND_CHILL_TEMPERATURE || wind_speed < MIN_WIND_CHILL_SPEED {
        return temperature;
    }

    let t = temperature.unpack();
    let v_pow = (wind_speed.unpack() * 3.6).powf(0.16);

    Celsius(13.12 + 0.6215 * t - 11.37 * v_pow + 0.3965 * t * v_pow)
}

/// The phase of falling precipitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipPhase {
    /// Frozen precipitation.
    Snow,
    /// Liquid precipitation.
    Rain,
}

/// Infer whether precipitation falls as snow or rain.
///
/// The dew point decides when it is available, rain at or above freezing. Without it the air
/// temperature decides, rain at or above `rain_air_temp_min`. Returns `None` if both are missing.
pub fn precip_phase(
    air_temperature: Option<Celsius>,
    dew_point: Option<Celsius>,
    rain_air_temp_min: Celsius,
) -> Option<PrecipPhase> {
    match (dew_point, air_temperature) {
        (Some(dp), _) if dp < FREEZING => Some(PrecipPhase::Snow),
        (Some(_), _) => Some(PrecipPhase::Rain),
        (None, Some(t)) if t < rain_air_temp_min => Some(PrecipPhase::Snow),
        (None, Some(_)) => Some(PrecipPhase::Rain),
        (None, None) => None,
    }
}

/// Whether a wind direction falls in a compass sector, inclusive at both ends.
///
/// A sector with `min > max` wraps through north, so 300 to 30 covers 350 and 10.
pub fn in_wind_sector(direction: f64, min: f64, max: f64) -> bool {
    let direction = direction.rem_euclid(360.0);

    if min <= max {
        direction >= min && direction <= max
    } else {
        direction >= min || direction <= max
    }
}

/// Relative humidity in percent, calculated from the temperature and dew point when the sensor
/// value is missing.
pub fn relative_humidity(
    measured: Option<f64>,
    air_temperature: Option<Celsius>,
    dew_point: Option<Celsius>,
) -> Option<f64> {
    measured.or_else(|| {
        let t = air_temperature?;
        let dp = dew_point?;
        metfor::rh(t, dp).map(|rh| rh * 100.0)
    })
}
