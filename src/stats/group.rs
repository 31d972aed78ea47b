use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::core::contig::{Contig, ContigTable};
use crate::core::library::Library;
use crate::core::types::{DisplayLabel, Group};
use crate::labels::policy::LabelAssignment;
use crate::stats::n50::n50;
use crate::utils::count_to_f64;

/// Coverage statistics of one label in one library
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    /// Mean base coverage over contributing contigs
    pub cov_mean: f64,
    /// Population standard deviation of base coverage
    pub cov_std: f64,
    /// Reads placed on contributing contigs
    pub reads_mapped: u64,
    /// `reads_mapped` as a fraction of the library's total reads
    pub reads_mapped_perc: f64,
}

/// Aggregate statistics of one display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub label: DisplayLabel,
    pub count: u64,
    pub span: u64,
    pub count_visible: u64,
    pub span_visible: u64,
    pub gc_mean: f64,
    pub gc_std: f64,
    pub n50: u64,
    /// Per-library statistics keyed by library name
    pub libraries: BTreeMap<String, LibraryStats>,
    /// Raw groups that contributed at least one contig
    pub groups: BTreeSet<Group>,
}

impl GroupStats {
    /// Fraction of contributing contigs that are visible, 0 for an empty label
    #[must_use]
    pub fn count_visible_fraction(&self) -> f64 {
        fraction(self.count_visible, self.count)
    }

    /// Fraction of the span that is visible, 0 for an empty label
    #[must_use]
    pub fn span_visible_fraction(&self) -> f64 {
        fraction(self.span_visible, self.span)
    }
}

fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole)
    }
}

/// Arithmetic mean and population standard deviation; (0, 0) for no values
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Compute statistics for every label in an assignment.
///
/// Each contig contributes once to every distinct label any of its groups maps
/// to, and always to `all`. Groups the assignment does not know contribute to
/// `all` only. Labels without contigs still get an entry with zeroed
/// statistics.
#[must_use]
pub fn aggregate_groups(
    contigs: &ContigTable,
    assignment: &LabelAssignment,
    libraries: &[Library],
) -> BTreeMap<DisplayLabel, GroupStats> {
    let mut members: BTreeMap<DisplayLabel, Vec<&Contig>> = assignment
        .labels()
        .into_iter()
        .map(|label| (label, Vec::new()))
        .collect();
    let mut contributors: BTreeMap<DisplayLabel, BTreeSet<Group>> = BTreeMap::new();
    let mut unranked: HashSet<&Group> = HashSet::new();

    for contig in contigs {
        let mut labels = BTreeSet::from([DisplayLabel::ALL]);
        for group in contig.effective_groups() {
            contributors
                .entry(DisplayLabel::ALL)
                .or_default()
                .insert(group.clone());
            let Some(group_labels) = assignment.labels_for(group) else {
                if unranked.insert(group) {
                    warn!(group = %group, "Group has no display label; counted in 'all' only");
                }
                continue;
            };
            for label in group_labels {
                contributors
                    .entry(label.clone())
                    .or_default()
                    .insert(group.clone());
            }
            labels.extend(group_labels.iter().cloned());
        }
        for label in labels {
            members.entry(label).or_default().push(contig);
        }
    }

    members
        .into_iter()
        .map(|(label, contigs)| {
            let groups = contributors.remove(&label).unwrap_or_default();
            let stats = compute_stats(label.clone(), &contigs, groups, libraries);
            debug!(label = %label, count = stats.count, span = stats.span, "Aggregated label");
            (label, stats)
        })
        .collect()
}

fn compute_stats(
    label: DisplayLabel,
    contigs: &[&Contig],
    groups: BTreeSet<Group>,
    libraries: &[Library],
) -> GroupStats {
    let lengths: Vec<u64> = contigs.iter().map(|c| c.length).collect();
    let gcs: Vec<f64> = contigs.iter().map(|c| c.gc).collect();
    let (gc_mean, gc_std) = mean_std(&gcs);

    let visible = contigs.iter().filter(|c| c.visible);
    let (count_visible, span_visible) =
        visible.fold((0u64, 0u64), |(n, s), c| (n + 1, s.saturating_add(c.length)));

    let libraries = libraries
        .iter()
        .map(|library| (library.name.clone(), library_stats(contigs, library)))
        .collect();

    GroupStats {
        label,
        count: contigs.len() as u64,
        span: lengths.iter().fold(0u64, |acc, &l| acc.saturating_add(l)),
        count_visible,
        span_visible,
        gc_mean,
        gc_std,
        n50: n50(&lengths),
        libraries,
        groups,
    }
}

fn library_stats(contigs: &[&Contig], library: &Library) -> LibraryStats {
    let covs: Vec<f64> = contigs
        .iter()
        .map(|c| count_to_f64(library.coverage.base_coverage(&c.name)))
        .collect();
    let (cov_mean, cov_std) = mean_std(&covs);
    let reads_mapped = contigs
        .iter()
        .map(|c| library.coverage.read_count(&c.name))
        .fold(0u64, u64::saturating_add);

    LibraryStats {
        cov_mean,
        cov_std,
        reads_mapped,
        reads_mapped_perc: fraction(reads_mapped, library.total_reads()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::ReadTotals;
    use crate::coverage::aggregator::{CoverageAccumulator, IngestResult};
    use crate::labels::policy::LabelPolicy;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn table() -> ContigTable {
        vec![
            Contig::new("c1", 100, 0.4).with_group(Group::parse("A")),
            Contig::new("c2", 300, 0.6).with_group(Group::parse("A")),
            Contig::new("c3", 50, 0.5)
                .with_group(Group::parse("B"))
                .with_visible(false),
            Contig::new("c4", 20, 0.3),
        ]
        .into_iter()
        .collect()
    }

    fn library(name: &str, total: u64, coverage: &[(&str, u64, u64)]) -> Library {
        let mut accumulator = CoverageAccumulator::new();
        for &(contig, bases, reads) in coverage {
            for _ in 0..reads {
                accumulator.add(contig, bases / reads);
            }
        }
        let mapped = coverage.iter().map(|c| c.2).sum();
        Library::from_ingest(
            name,
            Some(ReadTotals::new(total, mapped)),
            IngestResult {
                accumulator,
                total_reads_parsed: total,
                mapped_reads_parsed: mapped,
                warnings: Vec::new(),
            },
        )
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx(mean, 5.0));
        assert!(approx(std, 2.0));
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_counts_spans_and_gc() {
        let contigs = table();
        let order = vec![Group::parse("A"), Group::parse("B"), Group::NoHit];
        let assignment = LabelPolicy::new(5).assign(&order);
        let stats = aggregate_groups(&contigs, &assignment, &[]);

        let all = &stats[&DisplayLabel::ALL];
        assert_eq!(all.count, 4);
        assert_eq!(all.span, 470);
        assert_eq!(all.count_visible, 3);
        assert_eq!(all.span_visible, 420);
        assert_eq!(all.n50, 300);

        let a = &stats[&DisplayLabel::Raw("A".to_string())];
        assert_eq!(a.count, 2);
        assert!(approx(a.gc_mean, 0.5));
        assert!(approx(a.gc_std, 0.1));
        assert_eq!(a.groups, BTreeSet::from([Group::parse("A")]));

        let b = &stats[&DisplayLabel::Raw("B".to_string())];
        assert_eq!(b.count_visible, 0);
        assert!(approx(b.span_visible_fraction(), 0.0));

        assert_eq!(stats[&DisplayLabel::NO_HIT].count, 1);
    }

    #[test]
    fn test_library_coverage_and_percentages() {
        let contigs = table();
        let order = vec![Group::parse("A"), Group::parse("B"), Group::NoHit];
        let assignment = LabelPolicy::new(5).assign(&order);
        let lib = library("lib1", 20, &[("c1", 100, 2), ("c2", 300, 3)]);
        let stats = aggregate_groups(&contigs, &assignment, &[lib]);

        let a = &stats[&DisplayLabel::Raw("A".to_string())].libraries["lib1"];
        assert!(approx(a.cov_mean, 200.0));
        assert!(approx(a.cov_std, 100.0));
        assert_eq!(a.reads_mapped, 5);
        assert!(approx(a.reads_mapped_perc, 0.25));

        // c3 has no coverage and counts as 0
        let b = &stats[&DisplayLabel::Raw("B".to_string())].libraries["lib1"];
        assert!(approx(b.cov_mean, 0.0));
        assert_eq!(b.reads_mapped, 0);
    }

    #[test]
    fn test_zero_total_reads_gives_zero_percentage() {
        let contigs = table();
        let assignment = LabelPolicy::new(5).assign(&[Group::parse("A")]);
        let mut lib = library("empty", 0, &[("c1", 10, 1)]);
        lib.reported = Some(ReadTotals::new(0, 0));
        lib.parsed = ReadTotals::new(0, 0);
        let stats = aggregate_groups(&contigs, &assignment, &[lib]);

        for group_stats in stats.values() {
            assert!(approx(group_stats.libraries["empty"].reads_mapped_perc, 0.0));
        }
    }

    #[test]
    fn test_other_and_user_labels_overlap() {
        let contigs = table();
        let order = vec![Group::parse("A"), Group::parse("B"), Group::NoHit];
        let labels = crate::labels::policy::parse_user_labels(&["Merged=A"]).unwrap();
        let assignment = LabelPolicy::new(1).with_user_labels(labels).assign(&order);
        let stats = aggregate_groups(&contigs, &assignment, &[]);

        let merged = &stats[&DisplayLabel::User("Merged".to_string())];
        assert_eq!(merged.count, 2);
        // raw label of a merged group is still aggregated
        assert_eq!(stats[&DisplayLabel::Raw("A".to_string())].count, 2);

        let other = &stats[&DisplayLabel::OTHER];
        assert_eq!(other.count, 2);
        assert_eq!(
            other.groups,
            BTreeSet::from([Group::parse("B"), Group::NoHit])
        );
        assert_eq!(stats[&DisplayLabel::ALL].count, 4);
    }

    #[test]
    fn test_multi_group_contig_counted_once_per_label() {
        let contigs: ContigTable = vec![Contig::new("c1", 100, 0.5)
            .with_group(Group::parse("B"))
            .with_group(Group::parse("C"))]
        .into_iter()
        .collect();
        let order = vec![Group::parse("A"), Group::parse("B"), Group::parse("C")];
        let assignment = LabelPolicy::new(1).assign(&order);
        let stats = aggregate_groups(&contigs, &assignment, &[]);

        assert_eq!(stats[&DisplayLabel::OTHER].count, 1);
        assert_eq!(stats[&DisplayLabel::ALL].count, 1);
        assert_eq!(stats[&DisplayLabel::Raw("A".to_string())].count, 0);
    }

    #[test]
    fn test_unranked_group_counts_in_all_only() {
        let contigs = table();
        let assignment = LabelPolicy::new(5).assign(&[Group::parse("A")]);
        let stats = aggregate_groups(&contigs, &assignment, &[]);

        assert_eq!(stats[&DisplayLabel::ALL].count, 4);
        assert!(!stats.contains_key(&DisplayLabel::Raw("B".to_string())));
        assert!(!stats.contains_key(&DisplayLabel::NO_HIT));
    }

    #[test]
    fn test_empty_label_has_zeroed_stats() {
        let contigs = ContigTable::new();
        let assignment = LabelPolicy::new(5).assign(&[Group::parse("A")]);
        let stats = aggregate_groups(&contigs, &assignment, &[]);

        let a = &stats[&DisplayLabel::Raw("A".to_string())];
        assert_eq!(a.count, 0);
        assert_eq!(a.n50, 0);
        assert!(approx(a.gc_mean, 0.0));
        assert!(approx(a.count_visible_fraction(), 0.0));
    }
}
