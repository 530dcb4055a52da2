//! Tree-diff engine for the bit version control system
//!
//! This crate compares two ordered sources of path-addressed entries (a
//! committed tree, the staging area, or the live working directory) and
//! produces a sorted list of deltas describing how the first source would
//! have to change to become the second.
//!
//! ## Entry points
//!
//! The four diff operations live in [`artifacts::diff`]:
//!
//! - `tree_to_tree`
//! - `index_to_tree`
//! - `workdir_to_index`
//! - `workdir_to_tree`
//!
//! Each returns an owned [`artifacts::diff::diff_list::DiffList`].
//!
//! The [`artifacts::stash`] module composes the engine into a realistic
//! client: it snapshots the index, untracked files, and working tree into
//! synthetic commits recorded under a dedicated reference with a reflog.

pub mod areas;
pub mod artifacts;
