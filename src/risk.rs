//! Risk levels and the verdict produced by every analyzer.

use crate::error::AnalysisError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap, fmt::Display};
use strum_macros::EnumIter;

/// Severity of a hazard.
///
/// `Low < Medium < High` is a total order. `Unknown` means the analysis could not be done and is
/// not comparable with the other levels, so `RiskLevel::Unknown >= RiskLevel::Low` is false, as
/// is `RiskLevel::Unknown < RiskLevel::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Required data was missing.
    Unknown,
    /// Data present, hazard absent or minor.
    Low,
    /// Elevated risk, keep an eye on it.
    Medium,
    /// Act now.
    High,
}

impl RiskLevel {
    /// Rank used when picking the worst of several verdicts. `None` for `Unknown`.
    #[inline]
    pub fn priority(self) -> Option<u8> {
        use RiskLevel::*;

        match self {
            Unknown => None,
            Low => Some(1),
            Medium => Some(2),
            High => Some(3),
        }
    }

    /// Whether this level came from an actual evaluation.
    #[inline]
    pub fn is_known(self) -> bool {
        self.priority().is_some()
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.priority(), other.priority()) {
            (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Unknown => "UNKNOWN",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(formatter, "{}", label)
    }
}

/// The four winter road hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    /// Accumulation of new snow.
    FreshSnow,
    /// Wet snow and water slush.
    Slaps,
    /// Ice on the road.
    SlipperyRoad,
    /// Wind transported snow.
    Snowdrift,
}

impl Display for Hazard {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            Hazard::FreshSnow => "Nysnø",
            Hazard::Slaps => "Slaps",
            Hazard::SlipperyRoad => "Glatt veg",
            Hazard::Snowdrift => "Snøfokk",
        };
        write!(formatter, "{}", label)
    }
}

/// The verdict of one analyzer for one evaluation.
///
/// The `factors` are listed in the order they were considered and together with `details` they
/// explain the verdict without going back to the weather data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    hazard: Hazard,
    risk_level: RiskLevel,
    scenario: String,
    message: String,
    factors: Vec<String>,
    details: BTreeMap<&'static str, Option<f64>>,
    timestamp: NaiveDateTime,
    source_time: Option<NaiveDateTime>,
}

impl AnalysisResult {
    /// Create a new result without any factors or details.
    pub fn new<S, M>(
        hazard: Hazard,
        risk_level: RiskLevel,
        scenario: S,
        message: M,
        timestamp: NaiveDateTime,
    ) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        AnalysisResult {
            hazard,
            risk_level,
            scenario: scenario.into(),
            message: message.into(),
            factors: vec![],
            details: BTreeMap::new(),
            timestamp,
            source_time: None,
        }
    }

    /// A result for when the analysis could not be done.
    pub fn unknown(hazard: Hazard, err: &AnalysisError, timestamp: NaiveDateTime) -> Self {
        AnalysisResult::new(
            hazard,
            RiskLevel::Unknown,
            "Ukjent",
            format!("Utilstrekkelige data for vurdering: {}", err),
            timestamp,
        )
    }

    /// A neutral result for an evaluation outside the winter season.
    pub fn out_of_season(hazard: Hazard, month: u32, timestamp: NaiveDateTime) -> Self {
        AnalysisResult::new(
            hazard,
            RiskLevel::Low,
            "Utenfor sesong",
            "Utenfor vintersesongen, ingen vurdering",
            timestamp,
        )
        .with_detail("month", f64::from(month))
    }

    /// Append a piece of evidence.
    pub fn with_factor<S: Into<String>>(mut self, factor: S) -> Self {
        self.factors.push(factor.into());
        self
    }

    /// Append several pieces of evidence, keeping their order.
    pub fn with_factors<I, S>(mut self, factors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.factors.extend(factors.into_iter().map(Into::into));
        self
    }

    /// Record a figure used in the decision. Use `None` when the figure was unavailable.
    pub fn with_detail<T>(mut self, key: &'static str, value: T) -> Self
    where
        Option<f64>: From<T>,
    {
        self.details.insert(key, Option::from(value));
        self
    }

    /// Record several figures at once.
    pub fn with_details<I>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Option<f64>)>,
    {
        self.details.extend(details);
        self
    }

    /// Set the valid time of the sample the verdict came from.
    pub fn with_source_time<T>(mut self, source_time: T) -> Self
    where
        Option<NaiveDateTime>: From<T>,
    {
        self.source_time = Option::from(source_time);
        self
    }

    /// The hazard this verdict is about.
    pub fn hazard(&self) -> Hazard {
        self.hazard
    }

    /// The risk level.
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Short tag naming the decision branch.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Human readable headline.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evidence in evaluation order.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// The figures used in the decision.
    pub fn details(&self) -> &BTreeMap<&'static str, Option<f64>> {
        &self.details
    }

    /// Look up a single figure. Returns `None` if the key is absent or the figure unavailable.
    pub fn detail(&self, key: &str) -> Option<f64> {
        self.details.get(key).copied().flatten()
    }

    /// The evaluation instant.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Valid time of the sample the verdict came from, if the analyzer tracks it.
    pub fn source_time(&self) -> Option<NaiveDateTime> {
        self.source_time
    }
}

#[cfg(test)]
mod test {
    use super::RiskLevel::*;
    use super::*;
    use crate::test_data::at_hour;
    use strum::IntoEnumIterator;

    #[test]
    fn test_known_levels_are_totally_ordered() {
        assert!(Low < Medium);
        assert!(Medium < High);
        assert!(Low < High);
        assert_eq!(Medium.partial_cmp(&Medium), Some(Ordering::Equal));
    }

    #[test]
    fn test_unknown_is_outside_the_order() {
        for level in RiskLevel::iter().filter(|lvl| lvl.is_known()) {
            assert_eq!(Unknown.partial_cmp(&level), None);
            assert_eq!(level.partial_cmp(&Unknown), None);
            assert!(!(Unknown >= level));
            assert!(!(Unknown < level));
        }
        assert_eq!(Unknown.priority(), None);
    }

    #[test]
    fn test_builder_keeps_order_and_details() {
        let res = AnalysisResult::new(Hazard::Slaps, Medium, "Snøsmelting", "Smelting", at_hour(3))
            .with_factor("first")
            .with_factors(vec!["second", "third"])
            .with_detail("snow_change_6h", -2.5)
            .with_detail("dew_point", None::<f64>);

        assert_eq!(res.factors(), &["first", "second", "third"]);
        assert_eq!(res.detail("snow_change_6h"), Some(-2.5));
        assert!(res.details().contains_key("dew_point"));
        assert_eq!(res.detail("dew_point"), None);
        assert_eq!(res.detail("not_there"), None);
        assert_eq!(res.timestamp(), at_hour(3));
        assert_eq!(res.source_time(), None);
    }

    #[test]
    fn test_unknown_result_embeds_error() {
        let err = AnalysisError::MissingValue("air_temperature");
        let res = AnalysisResult::unknown(Hazard::FreshSnow, &err, at_hour(0));

        assert_eq!(res.risk_level(), Unknown);
        assert!(res.message().contains("air_temperature"));
    }

    #[test]
    fn test_serializes_for_audit_log() {
        let res = AnalysisResult::new(Hazard::Snowdrift, High, "Vindkast-kritisk", "KRITISK", at_hour(1))
            .with_detail("wind_gust", 21.9)
            .with_source_time(at_hour(0));

        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["risk_level"], "HIGH");
        assert_eq!(json["hazard"], "snowdrift");
        assert_eq!(json["details"]["wind_gust"], 21.9);
    }
}
