mod common;

use common::{at, minutes_of, series, series_with_invalid, values_of};
use stationqc_core::dedup::deduplicate;
use stationqc_core::RemovalReason;

#[test]
fn duplicate_timestamp_is_moved_to_audit() {
    let input = series(&[(0, 1.0), (0, 2.0), (1, 3.0)]);

    let result = deduplicate(input);

    assert_eq!(minutes_of(&result.clean), [Some(0), Some(1)]);
    assert_eq!(result.duplicates.len(), 1);
    let record = &result.duplicates[0];
    assert_eq!(record.removal_reason, RemovalReason::DuplicateTimestamp);
    assert_eq!(record.observation.time(), Some(at(0)));
    assert_eq!(record.observation.source_row(), Some(1));
}

#[test]
fn first_seen_row_wins_regardless_of_position() {
    let input = series(&[(5, 50.0), (2, 20.0), (5, 51.0), (2, 21.0), (5, 52.0)]);

    let result = deduplicate(input);

    assert_eq!(minutes_of(&result.clean), [Some(5), Some(2)]);
    assert_eq!(values_of(&result.clean), [Some(50.0), Some(20.0)]);
    let dropped: Vec<_> = result
        .duplicates
        .iter()
        .map(|record| record.observation.values[0])
        .collect();
    assert_eq!(dropped, [Some(51.0), Some(21.0), Some(52.0)]);
}

#[test]
fn row_count_is_conserved() {
    let input = series(&[(0, 1.0), (1, 1.0), (1, 1.0), (3, 1.0), (0, 1.0), (3, 1.0)]);
    let input_len = input.len();

    let result = deduplicate(input);

    assert_eq!(result.clean.len() + result.duplicates.len(), input_len);
    assert_eq!(result.clean.len(), 3);
}

#[test]
fn invalid_timestamps_are_not_duplicates_of_each_other() {
    let input = series_with_invalid(&[(None, 1.0), (Some(0), 2.0), (None, 3.0)]);

    let result = deduplicate(input);

    assert!(result.duplicates.is_empty());
    assert_eq!(minutes_of(&result.clean), [None, Some(0), None]);
}

#[test]
fn empty_series_passes_through() {
    let result = deduplicate(series(&[]));

    assert!(result.clean.is_empty());
    assert!(result.duplicates.is_empty());
    assert_eq!(result.clean.fields(), ["temp"]);
}
