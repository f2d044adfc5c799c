//! Run these benches with `cargo bench --bench analyzers -- --verbose`
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use winter_road_analysis::{Analyzer, AnalyzerConfig, Hazard, RoadAnalysis};

mod utils;

criterion_main!(analyzer_benches);

criterion_group!(
    analyzer_benches,
    fresh_snow_bench,
    slaps_bench,
    slippery_road_bench,
    snowdrift_bench,
    road_analysis_bench
);

fn bench_hazard(c: &mut Criterion, name: &str, hazard: Hazard) {
    let data = utils::load_all_test_files();
    let analyzer = Analyzer::new(hazard, &AnalyzerConfig::default());

    c.bench_function(name, |b| {
        b.iter(|| {
            for (series, now) in data.iter() {
                let _x = analyzer.analyze(black_box(series), *now);
            }
        });
    });
}

fn fresh_snow_bench(c: &mut Criterion) {
    bench_hazard(c, "fresh_snow", Hazard::FreshSnow);
}

fn slaps_bench(c: &mut Criterion) {
    bench_hazard(c, "slaps", Hazard::Slaps);
}

fn slippery_road_bench(c: &mut Criterion) {
    bench_hazard(c, "slippery_road", Hazard::SlipperyRoad);
}

fn snowdrift_bench(c: &mut Criterion) {
    bench_hazard(c, "snowdrift", Hazard::Snowdrift);
}

fn road_analysis_bench(c: &mut Criterion) {
    let data = utils::load_all_test_files();
    let config = AnalyzerConfig::default();

    c.bench_function("road_analysis", |b| {
        b.iter(|| {
            for (series, now) in data.iter() {
                let _x = RoadAnalysis::new(series.clone(), *now).fill_in_missing_analysis(&config);
            }
        });
    });
}
