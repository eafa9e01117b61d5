mod common;

use common::{at, series};
use stationqc_core::model::{Observation, TimeSeries};
use stationqc_core::summary::{quantile, round_to, summarize};
use stationqc_core::{Completeness, Statistic};

#[test]
fn statistics_skip_nulls_and_round() {
    let observations = vec![
        Observation::observed(at(0), vec![Some(1.0), None], 0),
        Observation::observed(at(1), vec![Some(2.0), None], 1),
        Observation::synthetic(at(2), 2),
        Observation::observed(at(3), vec![Some(4.0), Some(7.125)], 2),
    ];
    let input = TimeSeries::new(
        "station",
        "time",
        vec!["temp".to_string(), "rain".to_string()],
        observations,
    )
    .expect("series");

    let summary = summarize(&input, 2);

    let temp = summary.field("temp").expect("temp summary");
    assert_eq!(temp.count, 3);
    assert_eq!(temp.null_count, 1);
    assert_eq!(temp.mean, Some(2.33));
    assert_eq!(temp.std, Some(1.53));
    assert_eq!(temp.min, Some(1.0));
    assert_eq!(temp.p25, Some(1.5));
    assert_eq!(temp.median, Some(2.0));
    assert_eq!(temp.p75, Some(3.0));
    assert_eq!(temp.max, Some(4.0));

    let rain = summary.field("rain").expect("rain summary");
    assert_eq!(rain.count, 1);
    assert_eq!(rain.null_count, 3);
    assert_eq!(rain.mean, Some(7.13));
    assert_eq!(rain.std, None);
}

#[test]
fn all_null_field_has_counts_only() {
    let input = TimeSeries::new(
        "station",
        "time",
        vec!["temp".to_string()],
        vec![Observation::synthetic(at(0), 1), Observation::synthetic(at(1), 1)],
    )
    .expect("series");

    let summary = summarize(&input, 2);
    let temp = summary.field("temp").expect("temp summary");

    assert_eq!(temp.get(Statistic::Count), Some(0.0));
    assert_eq!(temp.get(Statistic::NullCount), Some(2.0));
    for stat in [Statistic::Mean, Statistic::Std, Statistic::Min, Statistic::Max] {
        assert_eq!(temp.get(stat), None, "{}", stat.label());
    }
}

#[test]
fn summary_of_empty_series_lists_fields() {
    let summary = summarize(&series(&[]), 2);

    assert_eq!(summary.fields.len(), 1);
    assert_eq!(summary.fields[0].count, 0);
    assert_eq!(summary.fields[0].null_count, 0);
}

#[test]
fn precision_controls_rounding() {
    let input = series(&[(0, 1.0), (1, 2.0), (2, 2.0)]);

    assert_eq!(summarize(&input, 0).fields[0].mean, Some(2.0));
    assert_eq!(summarize(&input, 4).fields[0].mean, Some(1.6667));
    assert_eq!(round_to(2.345_678, 3), 2.346);
}

#[test]
fn quantiles_interpolate_linearly() {
    let sorted = [10.0, 20.0, 30.0, 40.0];
    assert_eq!(quantile(&sorted, 0.25), Some(17.5));
    assert_eq!(quantile(&sorted, 0.5), Some(25.0));
    assert_eq!(quantile(&sorted, 1.0), Some(40.0));
    assert_eq!(quantile(&[], 0.5), None);
}

#[test]
fn statistic_labels_match_report_rows() {
    let labels: Vec<_> = Statistic::ALL.iter().map(|stat| stat.label()).collect();
    assert_eq!(
        labels,
        ["count", "null_count", "mean", "std", "min", "25%", "50%", "75%", "max"]
    );
}

#[test]
fn uptime_is_share_of_real_rows() {
    let filled = TimeSeries::new(
        "station",
        "time",
        vec!["temp".to_string()],
        vec![
            Observation::observed(at(0), vec![Some(1.0)], 0),
            Observation::synthetic(at(1), 1),
            Observation::synthetic(at(2), 1),
            Observation::observed(at(3), vec![Some(1.0)], 2),
        ],
    )
    .expect("series");

    let completeness = Completeness::new(5, 1, 0, 1, &filled);

    assert_eq!(completeness.output_rows, 4);
    assert_eq!(completeness.synthetic, 2);
    assert_eq!(completeness.uptime, Some(0.5));

    let empty = Completeness::new(0, 0, 0, 0, &series(&[]));
    assert_eq!(empty.uptime, None);
}
