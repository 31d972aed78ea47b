//! Collapsing raw groups into a bounded set of coloured display labels.
//!
//! - [`rank_groups`](policy::rank_groups): order groups by visible span or count
//! - [`LabelPolicy`](policy::LabelPolicy): apply exclusions, user labels and the
//!   display limit to a ranking
//! - [`palette`]: the categorical colour map and neutral sentinel colours
//!
//! ## Example
//!
//! ```rust
//! use blobstats::core::types::{DisplayLabel, Group};
//! use blobstats::labels::policy::LabelPolicy;
//!
//! let order: Vec<Group> = ["A", "B", "C"].iter().map(|g| Group::parse(g)).collect();
//! let assignment = LabelPolicy::new(2).assign(&order);
//!
//! assert_eq!(assignment.display_order().len(), 3);
//! assert_eq!(assignment.display_order()[2], DisplayLabel::OTHER);
//! ```

pub mod palette;
pub mod policy;
