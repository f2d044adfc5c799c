use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use metfor::{Celsius, Cm, MetersPSec, Mm};
use optional::Optioned;
use winter_road_analysis::{Hazard, WeatherSample};

#[allow(unused_macros)] // False alarm
macro_rules! test_file {
    ($test_mod_name:ident, $fname:expr) => {
        mod $test_mod_name {
            use crate::utils;
            use winter_road_analysis::{Analyzer, AnalyzerConfig, Hazard};

            fn check(hazard: Hazard) {
                let (series, expected) = utils::load_test_file($fname);
                let now = utils::evaluation_time(&series);

                let (level, scenario) = match expected.get(&hazard) {
                    Some(exp) => exp,
                    // Nothing recorded for this hazard in the file
                    None => return,
                };

                let res = Analyzer::new(hazard, &AnalyzerConfig::default()).analyze(&series, now);

                assert_eq!(&res.risk_level().to_string(), level, "{}: {:#?}", $fname, res);
                assert_eq!(res.scenario(), scenario.as_str(), "{}: {:#?}", $fname, res);
                assert_eq!(res.timestamp(), now);
            }

            #[test]
            fn fresh_snow() {
                check(Hazard::FreshSnow);
            }

            #[test]
            fn slaps() {
                check(Hazard::Slaps);
            }

            #[test]
            fn slippery_road() {
                check(Hazard::SlipperyRoad);
            }

            #[test]
            fn snowdrift() {
                check(Hazard::Snowdrift);
            }
        }
    };
}

/// Risk level and scenario expected for each hazard.
pub type Expected = HashMap<Hazard, (String, String)>;

pub fn load_test_file(fname: &str) -> (Vec<WeatherSample>, Expected) {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);
    load_test_csv_series(&test_path)
}

/// The analyzers are run as of the newest sample in the file.
#[allow(dead_code)] // Not every test binary uses it.
pub fn evaluation_time(series: &[WeatherSample]) -> NaiveDateTime {
    series.last().expect("empty test file").valid_time
}

fn load_test_csv_series(location: &PathBuf) -> (Vec<WeatherSample>, Expected) {
    let mut f = File::open(location).expect(&format!("Error opening file: {:#?}", location));

    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", location));

    let lines: Vec<&str> = contents.lines().collect();
    let mut line_iter = lines.iter();

    //
    // Parse the observations, skipping the header
    //
    let mut series: Vec<WeatherSample> = Vec::with_capacity(lines.len());
    for line in line_iter.by_ref() {
        if line.starts_with("### Expected ###") {
            break;
        }

        let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
        if tokens.len() < 10 {
            continue;
        }

        let valid_time = match NaiveDateTime::from_str(tokens[0]) {
            Ok(vt) => vt,
            Err(_) => continue,
        };

        let sample = WeatherSample::new(valid_time)
            .with_air_temperature(parse(tokens[1]).map_t(Celsius))
            .with_surface_temperature(parse(tokens[2]).map_t(Celsius))
            .with_dew_point(parse(tokens[3]).map_t(Celsius))
            .with_relative_humidity(parse(tokens[4]))
            .with_wind_speed(parse(tokens[5]).map_t(MetersPSec))
            .with_wind_gust(parse(tokens[6]).map_t(MetersPSec))
            .with_wind_direction(parse(tokens[7]))
            .with_snow_depth(parse(tokens[8]).map_t(Cm))
            .with_precipitation(parse(tokens[9]).map_t(Mm));

        series.push(sample);
    }

    //
    // Expected verdicts, hazard,level,scenario
    //
    let mut expected = HashMap::new();
    for line in line_iter {
        let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
        if tokens.len() < 3 {
            continue;
        }

        let hazard = match tokens[0] {
            "fresh_snow" => Hazard::FreshSnow,
            "slaps" => Hazard::Slaps,
            "slippery_road" => Hazard::SlipperyRoad,
            "snowdrift" => Hazard::Snowdrift,
            other => panic!("unknown hazard in test file: {}", other),
        };

        expected.insert(hazard, (tokens[1].to_owned(), tokens[2].to_owned()));
    }

    (series, expected)
}

/// Empty fields are missing values.
fn parse(token: &str) -> Optioned<f64> {
    Optioned::from(f64::from_str(token).ok())
}
