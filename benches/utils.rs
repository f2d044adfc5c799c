use chrono::NaiveDateTime;
use metfor::{Celsius, Cm, MetersPSec, Mm};
use optional::Optioned;
use std::{fs::File, io::Read, path::PathBuf, str::FromStr};
use winter_road_analysis::WeatherSample;

/// Each series with the valid time of its newest sample.
pub fn load_all_test_files() -> [(Vec<WeatherSample>, NaiveDateTime); 6] {
    [
        load_test_file("snowdrift_critical_gust.csv"),
        load_test_file("rain_on_cold_snow.csv"),
        load_test_file("hidden_freeze_dry.csv"),
        load_test_file("wet_snowfall.csv"),
        load_test_file("heavy_slaps.csv"),
        load_test_file("calm_winter_day.csv"),
    ]
}

fn load_test_file(fname: &str) -> (Vec<WeatherSample>, NaiveDateTime) {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);

    let series = load_test_csv_series(&test_path);
    let now = series.last().expect("empty test file").valid_time;
    (series, now)
}

fn load_test_csv_series(location: &PathBuf) -> Vec<WeatherSample> {
    let mut f = File::open(location).expect(&format!("Error opening file: {:#?}", location));

    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", location));

    contents
        .lines()
        // Stop at the expected results
        .take_while(|line| !line.starts_with("###"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
            if tokens.len() < 10 {
                return None;
            }

            // The header doesn't parse as a time
            let valid_time = NaiveDateTime::from_str(tokens[0]).ok()?;

            Some(
                WeatherSample::new(valid_time)
                    .with_air_temperature(parse(tokens[1]).map_t(Celsius))
                    .with_surface_temperature(parse(tokens[2]).map_t(Celsius))
                    .with_dew_point(parse(tokens[3]).map_t(Celsius))
                    .with_relative_humidity(parse(tokens[4]))
                    .with_wind_speed(parse(tokens[5]).map_t(MetersPSec))
                    .with_wind_gust(parse(tokens[6]).map_t(MetersPSec))
                    .with_wind_direction(parse(tokens[7]))
                    .with_snow_depth(parse(tokens[8]).map_t(Cm))
                    .with_precipitation(parse(tokens[9]).map_t(Mm)),
            )
        })
        .collect()
}

fn parse(token: &str) -> Optioned<f64> {
    Optioned::from(f64::from_str(token).ok())
}
