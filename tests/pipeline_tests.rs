//! End-to-end Pipeline Tests
//!
//! These tests drive the library API from alignment records through coverage
//! aggregation, label assignment and group statistics, checking the
//! behaviour callers rely on: exact N50 values, fatal unknown contigs,
//! non-fatal reconciliation, bounded labels and deterministic output.

use std::collections::HashSet;

use blobstats::coverage::aggregator::IngestWarning;
use blobstats::labels::policy::{parse_user_labels, rank_groups, LabelError};
use blobstats::parsing::sam::AlignmentRecord;
use blobstats::stats::n50::n50;
use blobstats::{
    Contig, ContigTable, CoverageAggregator, CoverageError, DisplayLabel, Group, LabelPolicy,
    Library, ReadTotals, SortOrder, Summary,
};

fn sam_line(contig: &str, cigar: &str) -> String {
    format!("read\t0\t{contig}\t1\t60\t{cigar}\t*\t0\t0\tACGT\tIIII")
}

fn assembly() -> ContigTable {
    vec![
        Contig::new("ctg1", 5000, 0.35).with_group(Group::parse("Arthropoda")),
        Contig::new("ctg2", 4000, 0.38).with_group(Group::parse("Arthropoda")),
        Contig::new("ctg3", 3000, 0.62).with_group(Group::parse("Proteobacteria")),
        Contig::new("ctg4", 2000, 0.45).with_group(Group::parse("Nematoda")),
        Contig::new("ctg5", 1000, 0.50).with_group(Group::parse("Chordata")),
        Contig::new("ctg6", 300, 0.41).with_visible(false),
    ]
    .into_iter()
    .collect()
}

fn ingest(contigs: &ContigTable, name: &str, lines: &[String], reported: Option<ReadTotals>) -> Library {
    let known = contigs.known_names();
    let result = CoverageAggregator::new(&known, name)
        .with_reported(reported)
        .ingest_lines(lines)
        .unwrap();
    Library::from_ingest(name, reported, result)
}

fn library_lines() -> Vec<String> {
    vec![
        sam_line("ctg1", "100M"),
        sam_line("ctg1", "50M10I40M"),
        sam_line("ctg3", "80M20S"),
        sam_line("ctg4", "30M"),
        "read\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII".to_string(),
    ]
}

/// N50 of the worked example and of an empty list
#[test]
fn test_n50_values() {
    assert_eq!(n50(&[100, 90, 80, 70, 60]), 80);
    assert_eq!(n50(&[]), 0);
}

/// Two 50-base records on one contig accumulate
#[test]
fn test_coverage_accumulation() {
    let known: HashSet<String> = ["ctg1".to_string()].into_iter().collect();
    let lines = vec![sam_line("ctg1", "50M"), sam_line("ctg1", "25M5D25M")];

    let result = CoverageAggregator::new(&known, "lib1.sam")
        .ingest_lines(&lines)
        .unwrap();

    assert_eq!(result.accumulator.base_coverage("ctg1"), 100);
    assert_eq!(result.accumulator.read_count("ctg1"), 2);
}

/// A record on a contig outside the assembly aborts ingestion with context
#[test]
fn test_unknown_contig_is_fatal() {
    let known: HashSet<String> = ["ctg1".to_string()].into_iter().collect();
    let lines = vec![sam_line("ctg1", "50M"), sam_line("ctgX", "50M")];

    let err = CoverageAggregator::new(&known, "lib1.sam")
        .ingest_lines(&lines)
        .unwrap_err();

    match &err {
        CoverageError::UnknownContig { contig, input } => {
            assert_eq!(contig, "ctgX");
            assert_eq!(input, "lib1.sam");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("ctgX"));
}

/// Reported 10 mapped reads against 9 parsed is a warning, not an error
#[test]
fn test_reconciliation_is_non_fatal() {
    let contigs = assembly();
    let lines: Vec<String> = (0..9).map(|_| sam_line("ctg2", "10M")).collect();

    let library = ingest(&contigs, "lib1", &lines, Some(ReadTotals::new(12, 10)));

    assert_eq!(
        library.warnings,
        vec![IngestWarning::MappedReadMismatch {
            reported: 10,
            parsed: 9
        }]
    );
    assert_eq!(library.coverage.base_coverage("ctg2"), 90);
    assert_eq!(library.coverage.read_count("ctg2"), 9);
}

/// Four ranked groups with a display limit of two collapse into [A, B, other]
#[test]
fn test_label_policy_bucketing_and_determinism() {
    let order: Vec<Group> = ["A", "B", "C", "D"].iter().map(|g| Group::parse(g)).collect();

    let first = LabelPolicy::new(2).assign(&order);
    let second = LabelPolicy::new(2).assign(&order);

    assert_eq!(
        first.display_order(),
        &[
            DisplayLabel::Raw("A".to_string()),
            DisplayLabel::Raw("B".to_string()),
            DisplayLabel::OTHER
        ]
    );
    for name in ["C", "D"] {
        assert!(first
            .labels_for(&Group::parse(name))
            .unwrap()
            .contains(&DisplayLabel::OTHER));
    }
    assert_eq!(first, second);
    for name in ["A", "B"] {
        let label = DisplayLabel::Raw(name.to_string());
        assert!(first.color(&label).is_some());
        assert_eq!(first.color(&label), second.color(&label));
    }
}

/// A library with no reads reports 0% mapped for every label
#[test]
fn test_zero_total_reads_percentage() {
    let contigs = assembly();
    let library = ingest(&contigs, "empty", &[], Some(ReadTotals::new(0, 0)));

    let summary = Summary::build(&contigs, vec![library], &LabelPolicy::new(7), SortOrder::Span).unwrap();

    for stats in summary.stats.values() {
        let lib = &stats.libraries["empty"];
        assert_eq!(lib.reads_mapped, 0);
        assert!(lib.reads_mapped_perc.abs() < f64::EPSILON);
    }
}

/// Running the whole pipeline twice gives byte-identical output
#[test]
fn test_pipeline_is_idempotent() {
    let run = || {
        let contigs = assembly();
        let library = ingest(&contigs, "lib1", &library_lines(), None);
        let policy = LabelPolicy::new(2).with_user_labels(parse_user_labels(&["Worms=Nematoda"]).unwrap());
        let summary = Summary::build(&contigs, vec![library], &policy, SortOrder::Span).unwrap();
        serde_json::to_string(&summary).unwrap()
    };

    assert_eq!(run(), run());
}

/// Per-label statistics over a realistic assembly
#[test]
fn test_group_statistics() {
    let contigs = assembly();
    let library = ingest(&contigs, "lib1", &library_lines(), None);
    let summary = Summary::build(&contigs, vec![library], &LabelPolicy::new(2), SortOrder::Span).unwrap();

    assert_eq!(
        summary.display_order,
        vec![
            DisplayLabel::Raw("Arthropoda".to_string()),
            DisplayLabel::Raw("Proteobacteria".to_string()),
            DisplayLabel::OTHER
        ]
    );

    let all = &summary.stats[&DisplayLabel::ALL];
    assert_eq!(all.count, 6);
    assert_eq!(all.span, 15_300);
    assert_eq!(all.count_visible, 5);
    assert_eq!(all.span_visible, 15_000);
    assert_eq!(all.n50, 4000);
    assert_eq!(all.libraries["lib1"].reads_mapped, 4);
    // five well-formed records, no reported totals
    assert!((all.libraries["lib1"].reads_mapped_perc - 0.8).abs() < 1e-12);

    let arthropoda = &summary.stats[&DisplayLabel::Raw("Arthropoda".to_string())];
    assert_eq!(arthropoda.count, 2);
    assert_eq!(arthropoda.libraries["lib1"].reads_mapped, 2);
    assert!((arthropoda.libraries["lib1"].cov_mean - 95.0).abs() < 1e-9);
    assert!((arthropoda.libraries["lib1"].cov_std - 95.0).abs() < 1e-9);

    let other = &summary.stats[&DisplayLabel::OTHER];
    assert_eq!(other.count, 3);
    assert_eq!(other.span, 3300);
    assert_eq!(other.count_visible, 2);
    assert!(other.groups.contains(&Group::NoHit));
}

/// Every label key in the JSON summary is unique
#[test]
fn test_label_names_never_collide() {
    let contigs = assembly();
    let library = ingest(&contigs, "lib1", &library_lines(), None);
    let clashing = LabelPolicy::new(2)
        .with_user_labels(parse_user_labels(&["Arthropoda=Arthropoda,Insecta"]).unwrap());
    let err = Summary::build(&contigs, vec![library.clone()], &clashing, SortOrder::Span).unwrap_err();
    assert!(matches!(err, LabelError::NameClash(ref n) if n == "Arthropoda"));

    let policy = LabelPolicy::new(2)
        .with_user_labels(parse_user_labels(&["Bugs=Arthropoda,Insecta"]).unwrap());
    let summary = Summary::build(&contigs, vec![library], &policy, SortOrder::Span).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    let keys = json["stats"].as_object().unwrap().len();
    assert_eq!(keys, summary.stats.len());
    assert_eq!(json["stats"]["Bugs"]["count"], 2);
    assert_eq!(json["stats"]["Arthropoda"]["count"], 2);
}

/// Ranking by count differs from ranking by span
#[test]
fn test_rank_by_count() {
    let contigs = assembly();
    let by_count = rank_groups(&contigs, SortOrder::Count);
    assert_eq!(by_count[0], Group::parse("Arthropoda"));
    // ties on one visible contig each are ordered by name; no-hit has none visible
    assert_eq!(
        &by_count[1..],
        &[
            Group::parse("Chordata"),
            Group::parse("Nematoda"),
            Group::parse("Proteobacteria"),
            Group::NoHit
        ]
    );
}

/// Memory grows with covered contigs, not with records
#[test]
fn test_large_stream_keeps_one_entry_per_contig() {
    let contigs = assembly();
    let known = contigs.known_names();
    let records = (0..200_000u64).map(|i| {
        let contig = if i % 2 == 0 { "ctg1" } else { "ctg2" };
        Ok(AlignmentRecord::new(contig, 100))
    });

    let result = CoverageAggregator::new(&known, "big").ingest(records).unwrap();

    assert_eq!(result.accumulator.len(), 2);
    assert_eq!(result.total_reads_parsed, 200_000);
    assert_eq!(result.accumulator.base_coverage("ctg1"), 100 * 100_000);
}
