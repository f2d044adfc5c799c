//! Data type and methods for building and describing an analysis of all the hazards.
//!
//! Combining the verdicts into an overall status is left to the caller.
use crate::{
    analyzers::Analyzer,
    config::AnalyzerConfig,
    risk::{AnalysisResult, Hazard},
    sample::WeatherSample,
};
use chrono::NaiveDateTime;
use strum::IntoEnumIterator;

/// One verdict per hazard for a weather series at an evaluation instant.
#[derive(Debug, Clone)]
pub struct RoadAnalysis {
    // Series used to make the analysis
    series: Vec<WeatherSample>,
    now: NaiveDateTime,

    fresh_snow: Option<AnalysisResult>,
    slaps: Option<AnalysisResult>,
    slippery_road: Option<AnalysisResult>,
    snowdrift: Option<AnalysisResult>,
}

impl RoadAnalysis {
    /// Create a new `RoadAnalysis` with no verdicts.
    pub fn new(series: Vec<WeatherSample>, now: NaiveDateTime) -> Self {
        RoadAnalysis {
            series,
            now,
            fresh_snow: None,
            slaps: None,
            slippery_road: None,
            snowdrift: None,
        }
    }

    /// Set the verdict for the hazard the result is about, replacing any earlier one.
    pub fn with_result(self, result: AnalysisResult) -> Self {
        match result.hazard() {
            Hazard::FreshSnow => RoadAnalysis {
                fresh_snow: Some(result),
                ..self
            },
            Hazard::Slaps => RoadAnalysis {
                slaps: Some(result),
                ..self
            },
            Hazard::SlipperyRoad => RoadAnalysis {
                slippery_road: Some(result),
                ..self
            },
            Hazard::Snowdrift => RoadAnalysis {
                snowdrift: Some(result),
                ..self
            },
        }
    }

    /// Get the verdict for a hazard.
    pub fn get(&self, hazard: Hazard) -> Option<&AnalysisResult> {
        match hazard {
            Hazard::FreshSnow => self.fresh_snow.as_ref(),
            Hazard::Slaps => self.slaps.as_ref(),
            Hazard::SlipperyRoad => self.slippery_road.as_ref(),
            Hazard::Snowdrift => self.snowdrift.as_ref(),
        }
    }

    /// Iterate over the verdicts that are available, in hazard order.
    pub fn results(&self) -> impl Iterator<Item = &AnalysisResult> + '_ {
        Hazard::iter().filter_map(move |hazard| self.get(hazard))
    }

    /// Get a reference to the series.
    pub fn series(&self) -> &[WeatherSample] {
        &self.series
    }

    /// The evaluation instant.
    pub fn evaluation_time(&self) -> NaiveDateTime {
        self.now
    }

    /// Run the analyzer for every hazard that doesn't have a verdict yet.
    pub fn fill_in_missing_analysis(self, config: &AnalyzerConfig) -> Self {
        let missing: Vec<Analyzer> = Analyzer::all(config)
            .into_iter()
            .filter(|anal| self.get(anal.hazard()).is_none())
            .collect();

        missing.into_iter().fold(self, |acc, anal| {
            let res = anal.analyze(&acc.series, acc.now);
            acc.with_result(res)
        })
    }
}
