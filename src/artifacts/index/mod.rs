//! Index (staging area) data structures
//!
//! The index tracks the files staged for the next commit, together with the
//! stat metadata that enables fast change detection without reading file
//! content. The diff engine consumes index entries as one of its sources.

pub mod entry_mode;
pub mod index_entry;
