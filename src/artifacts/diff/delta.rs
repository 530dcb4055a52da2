//! Diff output records
//!
//! A delta describes how one path would have to change to turn the old
//! source into the new one: a status plus the two file sides. Renames are
//! never computed here, so both sides always carry the same path.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::rc::Rc;

/// Kind of change a delta records
///
/// The numeric order is part of the store's contract: deltas sort by
/// `(path, status)`, and a type-change split appends its DELETED before its
/// ADDED, so DELETED must order first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeltaStatus {
    /// Both sides identical (emitted only if requested)
    Unmodified = 0,
    /// Present in old, absent in new
    Deleted = 1,
    /// Absent in old, present in new
    Added = 2,
    /// Coincident, differing content or mode
    Modified = 3,
    /// Coincident, differing base file type
    Typechange = 4,
    /// Present only in workdir, matched by an ignore pattern
    Ignored = 5,
    /// Present only in workdir, not ignored
    Untracked = 6,
}

impl DeltaStatus {
    /// The status recorded when old and new sides are swapped
    pub fn reversed(self) -> Self {
        match self {
            DeltaStatus::Added => DeltaStatus::Deleted,
            DeltaStatus::Deleted => DeltaStatus::Added,
            other => other,
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            DeltaStatus::Unmodified => ' ',
            DeltaStatus::Added => 'A',
            DeltaStatus::Deleted => 'D',
            DeltaStatus::Modified => 'M',
            DeltaStatus::Typechange => 'T',
            DeltaStatus::Ignored => '!',
            DeltaStatus::Untracked => '?',
        }
    }
}

bitflags! {
    /// Per-side validity flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FileSideFlags: u8 {
        /// The recorded oid is the true content identity
        const VALID_OID = 0b1;
    }
}

/// One side of a delta
///
/// The path is interned in the owning list's pool; identical paths alias.
/// `mode` is None for a side that does not exist (the old side of an
/// addition, the new side of a deletion).
#[derive(Debug, Clone)]
pub struct FileSide {
    pub path: Rc<str>,
    pub mode: Option<EntryMode>,
    pub size: u64,
    pub oid: ObjectId,
    pub flags: FileSideFlags,
}

impl FileSide {
    /// A side that does not exist at this path
    pub fn absent(path: Rc<str>) -> Self {
        FileSide {
            path,
            mode: None,
            size: 0,
            oid: ObjectId::zero(),
            flags: FileSideFlags::empty(),
        }
    }

    pub fn has_valid_oid(&self) -> bool {
        self.flags.contains(FileSideFlags::VALID_OID)
    }
}

/// One record in the diff output
#[derive(Debug, Clone)]
pub struct Delta {
    pub status: DeltaStatus,
    pub old: FileSide,
    pub new: FileSide,
}

impl Delta {
    /// The path this delta is about; both sides agree
    pub fn path(&self) -> &str {
        &self.old.path
    }
}
