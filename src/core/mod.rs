//! Core data types for assembly composition statistics.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Contig`](contig::Contig): An assembled sequence with length, GC, groups and visibility
//! - [`ContigTable`](contig::ContigTable): The known-contig universe, in input order
//! - [`Library`](library::Library): One alignment source with its finalized coverage
//! - [`Group`](types::Group), [`DisplayLabel`](types::DisplayLabel): Raw partition keys and
//!   the display buckets they collapse into
//!
//! ## Groups and labels
//!
//! A raw [`Group`](types::Group) is either a named taxon or the `no-hit` sentinel.
//! The label policy maps each group onto one or more display labels:
//!
//! | Label | Meaning |
//! |-------|---------|
//! | `Raw(name)` | the group shown under its own name |
//! | `User(name)` | a user label merging several groups |
//! | `other` | groups beyond the display limit, or excluded |
//! | `all` | every contig |

pub mod contig;
pub mod library;
pub mod types;
