#![warn(missing_docs)]
/*!
Functions and data types for assessing winter road hazards from a series of weather
observations.

Four hazards are assessed independently of each other: fresh snow, slush (slaps), slippery roads
and snowdrift. Each analyzer maps a time ordered series of `WeatherSample`s, its thresholds and
an explicit evaluation instant to an `AnalysisResult`. The analyzers never fail, if there isn't
enough data the verdict has an unknown risk level and a message saying what was missing.

```rust
use chrono::NaiveDate;
use metfor::{Celsius, Cm, MetersPSec, Mm};
use winter_road_analysis::{Analyzer, AnalyzerConfig, Hazard, RiskLevel, WeatherSample};

let now = NaiveDate::from_ymd_opt(2024, 1, 15)
    .and_then(|d| d.and_hms_opt(6, 0, 0))
    .unwrap();

let series = vec![WeatherSample::new(now)
    .with_air_temperature(Celsius(-5.0))
    .with_wind_speed(MetersPSec(10.3))
    .with_wind_gust(MetersPSec(21.9))
    .with_wind_direction(180.0)
    .with_snow_depth(Cm(50.0))
    .with_precipitation(Mm(0.2))];

let analyzer = Analyzer::new(Hazard::Snowdrift, &AnalyzerConfig::default());
let result = analyzer.analyze(&series, now);

assert_eq!(result.risk_level(), RiskLevel::High);
assert_eq!(result.scenario(), "Vindkast-kritisk");
```

The crate logs with `tracing`, install a subscriber in the application to see the events.
*/

//
// API
//
pub use crate::{
    analysis::RoadAnalysis,
    analyzers::{
        fresh_snow_risk, loose_snow_availability, slaps_risk, slippery_road_risk, snowdrift_risk,
        Analyzer, FreshSnowAnalyzer, LooseSnow, SlapsAnalyzer, SlipperyRoadAnalyzer,
        SnowdriftAnalyzer, SNOW_ICE_CAVEAT,
    },
    config::{
        AnalyzerConfig, FreshSnowThresholds, Season, SlapsThresholds, SlipperyRoadThresholds,
        SnowdriftThresholds,
    },
    error::{AnalysisError, Result},
    risk::{AnalysisResult, Hazard, RiskLevel},
    sample::WeatherSample,
};

pub mod met_formulas;
pub mod series;

//
// Internal use only
//

// Modules
mod analysis;
mod analyzers;
mod config;
mod error;
mod risk;
mod sample;

#[cfg(test)]
mod test_data;
