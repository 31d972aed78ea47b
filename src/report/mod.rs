//! Statistics report and per-contig coverage table writers.
//!
//! The statistics report has one table per library. Rows start with `all`,
//! then follow the display order; a merged user label or `other` is followed by
//! the raw groups that contributed to it.

use std::io::{self, Write};

use crate::core::contig::ContigTable;
use crate::core::library::Library;
use crate::core::types::{DisplayLabel, Group};
use crate::stats::group::{GroupStats, LibraryStats};
use crate::stats::summary::Summary;

/// One report row: a label and whether it is listed under a merged label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRow<'a> {
    pub label: &'a DisplayLabel,
    pub stats: &'a GroupStats,
    /// True for raw groups listed under the merged label they contribute to
    pub nested: bool,
}

/// Rows of the statistics report in output order
#[must_use]
pub fn report_rows(summary: &Summary) -> Vec<ReportRow<'_>> {
    let mut rows = Vec::new();

    if let Some((label, stats)) = summary.stats.get_key_value(&DisplayLabel::ALL) {
        rows.push(ReportRow {
            label,
            stats,
            nested: false,
        });
    }

    for displayed in &summary.display_order {
        let Some((label, stats)) = summary.stats.get_key_value(displayed) else {
            continue;
        };
        rows.push(ReportRow {
            label,
            stats,
            nested: false,
        });

        if !matches!(*displayed, DisplayLabel::User(_) | DisplayLabel::OTHER) {
            continue;
        }
        for group in summary.assignment.groups_in(displayed) {
            let own = Group::own_label(group);
            if let Some((label, stats)) = summary.stats.get_key_value(&own) {
                rows.push(ReportRow {
                    label,
                    stats,
                    nested: true,
                });
            }
        }
    }

    rows
}

/// Format an integer with `,` thousands separators
#[must_use]
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn color_of(summary: &Summary, label: &DisplayLabel) -> String {
    summary
        .colors
        .get(label)
        .map_or_else(|| "None".to_string(), ToString::to_string)
}

/// Write the human-readable statistics report
///
/// # Errors
///
/// Returns any error of the underlying writer.
pub fn write_stats_text<W: Write + ?Sized>(out: &mut W, title: &str, summary: &Summary) -> io::Result<()> {
    let rows = report_rows(summary);
    let library_names: Vec<Option<&str>> = if summary.libraries.is_empty() {
        vec![None]
    } else {
        let mut names: Vec<&str> = summary.libraries.iter().map(|l| l.name.as_str()).collect();
        names.sort_unstable();
        names.into_iter().map(Some).collect()
    };

    for (i, library) in library_names.into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        match library {
            Some(name) => writeln!(out, "# {title} - {name}")?,
            None => writeln!(out, "# {title}")?,
        }
        writeln!(
            out,
            "{:<16}\t{:>8}\t{:>10}\t{:>11}\t{:>14}\t{:>10}\t{:>10}\t{:<5}\t{:<8}\t{:<10}\t{:<10}\t{:<12}\t{:<12}",
            "group",
            "colour",
            "count",
            "visible (%)",
            "span",
            "visible (%)",
            "n50",
            "GC",
            "GC (std)",
            "cov_mean",
            "cov_std",
            "read map",
            "read map (%)"
        )?;

        for row in &rows {
            let stats = row.stats;
            let name = if row.nested {
                format!("  {}", row.label)
            } else {
                row.label.to_string()
            };
            let (cov_mean, cov_std, reads, reads_perc) =
                match library.and_then(|l| stats.libraries.get(l)) {
                    Some(lib) => library_columns(lib),
                    None => ("-".into(), "-".into(), "-".into(), "-".into()),
                };
            writeln!(
                out,
                "{:<16}\t{:>8}\t{:>10}\t{:>11}\t{:>14}\t{:>10}\t{:>10}\t{:<5.2}\t{:<8.2}\t{:<10}\t{:<10}\t{:<12}\t{:<12}",
                name,
                color_of(summary, row.label),
                thousands(stats.count),
                percent(stats.count_visible_fraction()),
                thousands(stats.span),
                percent(stats.span_visible_fraction()),
                thousands(stats.n50),
                stats.gc_mean,
                stats.gc_std,
                cov_mean,
                cov_std,
                reads,
                reads_perc
            )?;
        }
    }

    Ok(())
}

fn library_columns(lib: &LibraryStats) -> (String, String, String, String) {
    (
        format!("{:.1}", lib.cov_mean),
        format!("{:.1}", lib.cov_std),
        thousands(lib.reads_mapped),
        percent(lib.reads_mapped_perc),
    )
}

/// Write the statistics as one tab-separated table with a row per library and label
///
/// # Errors
///
/// Returns any error of the underlying writer.
pub fn write_stats_tsv<W: Write + ?Sized>(out: &mut W, summary: &Summary) -> io::Result<()> {
    writeln!(
        out,
        "library\tlabel\tcolour\tcount\tcount_visible\tspan\tspan_visible\tn50\tgc_mean\tgc_std\tcov_mean\tcov_std\treads_mapped\treads_mapped_perc"
    )?;

    let rows = report_rows(summary);
    let empty = LibraryStats::default();
    let libraries: Vec<&str> = if summary.libraries.is_empty() {
        vec![""]
    } else {
        summary.libraries.iter().map(|l| l.name.as_str()).collect()
    };

    for library in libraries {
        for row in &rows {
            let stats = row.stats;
            let lib = stats.libraries.get(library).unwrap_or(&empty);
            writeln!(
                out,
                "{library}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}\t{:.6}",
                row.label,
                color_of(summary, row.label),
                stats.count,
                stats.count_visible,
                stats.span,
                stats.span_visible,
                stats.n50,
                stats.gc_mean,
                stats.gc_std,
                lib.cov_mean,
                lib.cov_std,
                lib.reads_mapped,
                lib.reads_mapped_perc
            )?;
        }
    }

    Ok(())
}

/// Write the whole summary as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization or the underlying writer fails.
pub fn write_stats_json<W: Write + ?Sized>(out: &mut W, summary: &Summary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)
}

/// Write the per-contig coverage table of one library.
///
/// Every contig of the assembly gets a row, in assembly order; contigs without
/// coverage show zeros.
///
/// # Errors
///
/// Returns any error of the underlying writer.
pub fn write_coverage_table<W: Write + ?Sized>(
    out: &mut W,
    contigs: &ContigTable,
    library: &Library,
) -> io::Result<()> {
    writeln!(out, "## {}", library.name)?;
    writeln!(out, "## Total Reads = {}", library.total_reads())?;
    writeln!(out, "## Mapped Reads = {}", library.mapped_reads_reported())?;
    writeln!(
        out,
        "## Unmapped Reads = {}",
        library
            .total_reads()
            .saturating_sub(library.mapped_reads_reported())
    )?;
    writeln!(out, "## Parsed Mapped Reads = {}", library.parsed.mapped)?;
    for warning in &library.warnings {
        writeln!(out, "## Warning: {warning}")?;
    }
    writeln!(out, "# contig_id\tlength\tread_cov\tbase_cov\tdepth")?;

    for contig in contigs {
        let coverage = library.coverage.get(&contig.name).copied().unwrap_or_default();
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{:.3}",
            contig.name,
            contig.length,
            coverage.read_count,
            coverage.base_coverage,
            coverage.depth(contig.length)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;
    use crate::core::library::ReadTotals;
    use crate::core::types::SortOrder;
    use crate::coverage::aggregator::CoverageAggregator;
    use crate::labels::policy::{parse_user_labels, LabelPolicy};

    fn contigs() -> ContigTable {
        vec![
            Contig::new("c1", 4000, 0.5).with_group(Group::parse("A")),
            Contig::new("c2", 3000, 0.4).with_group(Group::parse("B")),
            Contig::new("c3", 2000, 0.3).with_group(Group::parse("C")),
            Contig::new("c4", 1000, 0.6).with_group(Group::parse("D")),
        ]
        .into_iter()
        .collect()
    }

    fn library(contigs: &ContigTable) -> Library {
        let known = contigs.known_names();
        let lines = [
            "r1\t0\tc1\t1\t60\t100M\t*\t0\t0\tA\tI",
            "r2\t0\tc3\t1\t60\t50M\t*\t0\t0\tA\tI",
            "r3\t4\t*\t0\t0\t*\t*\t0\t0\tA\tI",
        ];
        let result = CoverageAggregator::new(&known, "lib1.sam")
            .ingest_lines(lines)
            .unwrap();
        Library::from_ingest("lib1", Some(ReadTotals::new(4, 2)), result)
    }

    fn summary(policy: &LabelPolicy) -> Summary {
        let contigs = contigs();
        let lib = library(&contigs);
        Summary::build(&contigs, vec![lib], policy, SortOrder::Span).unwrap()
    }

    fn row_names(summary: &Summary) -> Vec<String> {
        report_rows(summary)
            .iter()
            .map(|r| r.label.to_string())
            .collect()
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_rows_list_other_members() {
        let summary = summary(&LabelPolicy::new(2));
        assert_eq!(row_names(&summary), vec!["all", "A", "B", "other", "C", "D"]);
        let nested: Vec<bool> = report_rows(&summary).iter().map(|r| r.nested).collect();
        assert_eq!(nested, vec![false, false, false, false, true, true]);
    }

    #[test]
    fn test_rows_list_user_label_members() {
        let labels = parse_user_labels(&["Merged=B,D"]).unwrap();
        let summary = summary(&LabelPolicy::new(3).with_user_labels(labels));
        assert_eq!(
            row_names(&summary),
            vec!["all", "A", "Merged", "B", "D", "C"]
        );
    }

    #[test]
    fn test_text_report() {
        let summary = summary(&LabelPolicy::new(2));
        let mut out = Vec::new();
        write_stats_text(&mut out, "assembly", &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# assembly - lib1");
        assert!(lines[1].starts_with("group"));
        assert!(lines[2].starts_with("all"));
        assert!(lines[2].contains("10,000"));
        // 2 of 4 reads placed
        assert!(lines[2].contains("50.0%"));
        assert!(text.contains("#66c2a5"));
        assert!(text.contains("  C"));
    }

    #[test]
    fn test_tsv_report() {
        let summary = summary(&LabelPolicy::new(2));
        let mut out = Vec::new();
        write_stats_tsv(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        let all: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(all[0], "lib1");
        assert_eq!(all[1], "all");
        assert_eq!(all[3], "4");
        assert_eq!(all[5], "10000");
        assert_eq!(all[12], "2");
        assert_eq!(text.lines().count(), 1 + 6);
    }

    #[test]
    fn test_json_report_is_stable() {
        let first = summary(&LabelPolicy::new(2));
        let second = summary(&LabelPolicy::new(2));
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_stats_json(&mut a, &first).unwrap();
        write_stats_json(&mut b, &second).unwrap();
        assert_eq!(a, b);

        let value: serde_json::Value = serde_json::from_slice(&a).unwrap();
        assert_eq!(value["stats"]["all"]["count"], 4);
        assert_eq!(value["display_order"][2], "other");
    }

    #[test]
    fn test_coverage_table() {
        let contigs = contigs();
        let lib = library(&contigs);
        let mut out = Vec::new();
        write_coverage_table(&mut out, &contigs, &lib).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("## Total Reads = 4"));
        assert!(text.contains("## Mapped Reads = 2"));
        assert!(text.contains("## Unmapped Reads = 2"));
        assert!(text.contains("c1\t4000\t1\t100\t0.025"));
        assert!(text.contains("c2\t3000\t0\t0\t0.000"));
    }
}
