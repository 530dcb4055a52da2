//! Canonical diff entry model
//!
//! Every source (tree, index, working directory) delivers its content as a
//! stream of `DiffEntry` records: a `/`-separated path, a file mode, a
//! size, a content identity (zero until hashed), and optional stat
//! metadata. Directory entries from the working-directory walker carry a
//! trailing `/` so that sibling ordering matches the flat byte ordering of
//! tree and index paths.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntryFlags};
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// One path-addressed record delivered by an entry source
#[derive(Debug, Clone, new)]
pub struct DiffEntry {
    /// Path relative to the repository root, `/`-separated; directories
    /// end with `/`
    pub path: String,
    /// File mode
    pub mode: EntryMode,
    /// Content size in bytes (0 when unknown, e.g. tree entries)
    pub size: u64,
    /// Content identity; zero means "not yet hashed"
    pub oid: ObjectId,
    /// Stat metadata, when the source has it
    pub metadata: Option<EntryMetadata>,
    /// Extended index flags
    pub flags: IndexEntryFlags,
}

impl DiffEntry {
    pub fn is_directory(&self) -> bool {
        self.mode.is_tree()
    }

    /// Fused stat-tuple comparison for the "unchanged workdir entry" fast
    /// path
    ///
    /// The tuple is conditional on capability bits: ctime only counts when
    /// change times are trusted, the device id only when stable across
    /// mounts. Entries without metadata never compare equal.
    pub fn stat_matches(&self, other: &DiffEntry, trust_ctime: bool, use_dev: bool) -> bool {
        let (Some(a), Some(b)) = (&self.metadata, &other.metadata) else {
            return false;
        };

        self.size == other.size
            && (!trust_ctime || a.ctime == b.ctime)
            && a.mtime == b.mtime
            && (!use_dev || a.dev == b.dev)
            && a.ino == b.ino
            && a.uid == b.uid
            && a.gid == b.gid
    }
}
