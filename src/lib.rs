//! # blobstats
//!
//! A library for per-contig coverage extraction and per-group composition
//! statistics of genome assemblies.
//!
//! Sequencing libraries are aligned against an assembly; each contig carries a
//! length, a GC proportion and the annotation groups (for example taxa) it was
//! assigned to. `blobstats` folds the alignments into per-contig coverage and
//! summarises every group of contigs for comparative plots and reports.
//!
//! ## Features
//!
//! - **Streaming coverage**: SAM text or BAM records are folded into per-contig
//!   base and read coverage in memory proportional to the number of contigs
//! - **Consistency checks**: alignments to contigs outside the assembly are fatal;
//!   mapped-read counts are reconciled against reported totals
//! - **Group statistics**: count, span, N50, GC mean/std, coverage mean/std and
//!   mapped reads per display label and library
//! - **Label policy**: a deterministic, bounded legend with user-merged labels,
//!   exclusions, an `other` bucket and stable colours
//!
//! ## Example
//!
//! ```rust
//! use blobstats::{Contig, ContigTable, CoverageAggregator, Group, LabelPolicy, Library, Summary};
//! use blobstats::SortOrder;
//!
//! let contigs: ContigTable = vec![
//!     Contig::new("ctg1", 1000, 0.41).with_group(Group::parse("Arthropoda")),
//!     Contig::new("ctg2", 400, 0.55).with_group(Group::parse("Proteobacteria")),
//! ]
//! .into_iter()
//! .collect();
//!
//! let known = contigs.known_names();
//! let lines = [
//!     "r1\t0\tctg1\t1\t60\t100M\t*\t0\t0\tA\tI",
//!     "r2\t0\tctg2\t1\t60\t30M20S\t*\t0\t0\tA\tI",
//! ];
//! let result = CoverageAggregator::new(&known, "lib1.sam").ingest_lines(lines).unwrap();
//! let library = Library::from_ingest("lib1", None, result);
//!
//! let summary = Summary::build(&contigs, vec![library], &LabelPolicy::new(7), SortOrder::Span).unwrap();
//! let all = &summary.stats[&blobstats::DisplayLabel::ALL];
//! assert_eq!(all.count, 2);
//! assert_eq!(all.libraries["lib1"].reads_mapped, 2);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Contigs, libraries, groups and display labels
//! - [`parsing`]: Parsers for SAM, BAM, flagstat reports, contig tables and FASTA
//! - [`coverage`]: Streaming per-contig coverage aggregation
//! - [`labels`]: Group ranking, label policy and colour palette
//! - [`stats`]: N50, per-label statistics and the end-to-end pipeline
//! - [`report`]: Text, TSV and JSON report writers
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod coverage;
pub mod labels;
pub mod parsing;
pub mod report;
pub mod stats;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::contig::{Contig, ContigTable};
pub use core::library::{Library, ReadTotals};
pub use core::types::*;
pub use coverage::aggregator::{CoverageAccumulator, CoverageAggregator, CoverageError};
pub use labels::policy::{LabelAssignment, LabelPolicy};
pub use stats::group::GroupStats;
pub use stats::summary::{summarize, Summary, SummaryError};
