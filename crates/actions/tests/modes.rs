//! End-to-end tests for the filter-style modes: range, dedup, reorder and
//! type filter, plus the all_packet_type extractor.

mod common;

use common::{record, run_mode, try_run_mode};
use dmsift_actions::Mode;

#[test]
fn all_packet_type_lists_every_record_in_order() {
    let input = format!(
        "{}{}",
        "<dm_log_packet><pair key=\"type_id\">A</pair></dm_log_packet>",
        "<dm_log_packet><pair key=\"type_id\">B</pair></dm_log_packet>"
    );
    for workers in [1, 8] {
        let out = run_mode(
            Mode::Extract(vec!["all_packet_type".into()]),
            &input,
            workers,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2, "workers = {workers}");
        assert!(lines[0].contains('A'));
        assert!(lines[1].contains('B'));
    }
}

#[test]
fn dedup_keeps_monotonic_records() {
    let mut input = String::new();
    for i in 0..50 {
        input.push_str(&record("X", &format!("2020-01-01 00:00:{i:02}.000000")));
    }
    let out = run_mode(Mode::Dedup, &input, 4);
    assert_eq!(out.lines().count(), 50);
}

#[test]
fn dedup_drops_records_that_go_back_in_time() {
    let input = format!(
        "{}{}{}",
        record("A", "2020-01-01 00:00:01.000000"),
        record("B", "2020-01-01 00:00:03.000000"),
        record("C", "2020-01-01 00:00:02.000000"), // older than B: dropped
    );
    let out = run_mode(Mode::Dedup, &input, 4);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(">A<"));
    assert!(lines[1].contains(">B<"));
}

#[test]
fn dedup_keeps_equal_timestamps() {
    let input = format!(
        "{}{}",
        record("A", "2020-01-01 00:00:01.000000"),
        record("B", "2020-01-01 00:00:01.000000"),
    );
    let out = run_mode(Mode::Dedup, &input, 2);
    assert_eq!(out.lines().count(), 2);
}

#[test]
fn dedup_drops_unparseable_timestamps() {
    let input = record("A", "not a timestamp");
    let out = run_mode(Mode::Dedup, &input, 2);
    assert!(out.is_empty());
}

#[test]
fn dedup_output_is_deterministic_across_worker_counts() {
    let mut input = String::new();
    for i in 0..40 {
        // Every fourth record regresses.
        let sec = if i % 4 == 3 { 0 } else { i };
        input.push_str(&record(
            &format!("T{i}"),
            &format!("2020-01-01 00:01:{sec:02}.000000"),
        ));
    }
    let single = run_mode(Mode::Dedup, &input, 1);
    for workers in [2, 8] {
        assert_eq!(run_mode(Mode::Dedup, &input, workers), single);
    }
}

#[test]
fn range_mode_keeps_only_matching_records() {
    // "2020-09-13 04:26:40" converts to unix second 1600000000 exactly.
    let input = format!(
        "{}{}{}",
        record("IN", "2020-09-13 04:26:40.000000"),
        record("OUT", "2020-09-13 05:26:40.000000"),
        record("EDGE", "2020-09-13 04:27:39.000000"), // second 1600000059
    );
    let out = run_mode(
        Mode::Range(vec![(1_600_000_000, 1_600_000_059)]),
        &input,
        4,
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(">IN<"));
    assert!(lines[1].contains(">EDGE<"));
}

#[test]
fn range_mode_echoes_records_verbatim() {
    let rec = record("IN", "2020-09-13 04:26:40.000000");
    let out = run_mode(Mode::Range(vec![(1_600_000_000, 1_600_000_000)]), &rec, 1);
    assert_eq!(out, format!("{}\n", rec.trim_end()));
}

#[test]
fn reorder_swaps_records_within_the_window() {
    let input = format!(
        "{}{}",
        record("LATE", "2020-01-01 00:00:00.100000"),
        record("EARLY", "2020-01-01 00:00:00.000500"),
    );
    let out = run_mode(
        Mode::Reorder {
            tolerance_micros: 1_000_000,
        },
        &input,
        4,
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(">EARLY<"));
    assert!(lines[1].contains(">LATE<"));
}

#[test]
fn reorder_leaves_distant_records_in_arrival_order() {
    let input = format!(
        "{}{}",
        record("FIRST", "2020-01-01 00:00:00.000000"),
        record("SECOND", "2020-01-01 00:00:05.000000"),
    );
    let out = run_mode(
        Mode::Reorder {
            tolerance_micros: 1_000_000,
        },
        &input,
        4,
    );
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].contains(">FIRST<"));
    assert!(lines[1].contains(">SECOND<"));
}

#[test]
fn reorder_rejects_nonpositive_tolerance() {
    assert!(try_run_mode(
        Mode::Reorder { tolerance_micros: 0 },
        &record("A", "2020-01-01 00:00:00"),
        1
    )
    .is_err());
}

#[test]
fn type_filter_requires_a_full_match() {
    let input = format!(
        "{}{}",
        record("LTE_RRC_OTA_Packet", "2020-01-01 00:00:00"),
        record("LTE_MAC_Rach_Trigger", "2020-01-01 00:00:01"),
    );
    let out = run_mode(Mode::TypeFilter("LTE_RRC.*".into()), &input, 4);
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("LTE_RRC_OTA_Packet"));

    // A substring is not enough.
    let out = run_mode(Mode::TypeFilter("RRC".into()), &input, 4);
    assert!(out.is_empty());
}

#[test]
fn type_filter_rejects_invalid_regex() {
    assert!(try_run_mode(Mode::TypeFilter("(".into()), "", 1).is_err());
}

#[test]
fn unknown_extractors_are_skipped_not_fatal() {
    let input = record("A", "2020-01-01 00:00:00");
    let out = run_mode(Mode::Extract(vec!["no_such_extractor".into()]), &input, 2);
    assert!(out.is_empty());
}
