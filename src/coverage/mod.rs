//! Per-contig coverage extraction from alignment streams.
//!
//! - [`CoverageAggregator`](aggregator::CoverageAggregator): folds one library's
//!   alignment records into a [`CoverageAccumulator`](aggregator::CoverageAccumulator)
//! - [`ProgressObserver`](progress::ProgressObserver): optional progress hook
//!
//! ## Counting rules
//!
//! | Record | total parsed | mapped parsed | coverage |
//! |--------|--------------|---------------|----------|
//! | header / fewer than 11 fields | no | no | no |
//! | reference `*` | yes | no | no |
//! | known contig, 0 matched bases | yes | no | no |
//! | known contig, >0 matched bases | yes | yes | yes |
//! | unknown contig | fatal | | |
//!
//! Memory use grows with the number of covered contigs, never with the number
//! of records.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashSet;
//! use blobstats::coverage::aggregator::CoverageAggregator;
//!
//! let contigs: HashSet<String> = ["ctg1".to_string()].into_iter().collect();
//! let lines = ["r1\t0\tctg1\t1\t60\t50M\t*\t0\t0\tA\tI"];
//!
//! let result = CoverageAggregator::new(&contigs, "lib1.sam")
//!     .ingest_lines(lines)
//!     .unwrap();
//! assert_eq!(result.accumulator.base_coverage("ctg1"), 50);
//! ```

pub mod aggregator;
pub mod progress;
