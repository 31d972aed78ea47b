//! Per-label assembly statistics.
//!
//! - [`n50`](n50::n50): length-weighted median of contig lengths
//! - [`aggregate_groups`](group::aggregate_groups): counts, spans, GC and per-library
//!   coverage for every display label
//! - [`summarize`](summary::summarize): ingest libraries in parallel, then rank,
//!   label and aggregate
//!
//! Labels overlap: a contig counts towards `all`, its own group, and any merged
//! label or `other` bucket its group falls into.

pub mod group;
pub mod n50;
pub mod summary;
