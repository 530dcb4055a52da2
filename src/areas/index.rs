//! Index (staging area)
//!
//! The index tracks which files should be included in the next commit,
//! together with the stat metadata used for fast change detection. The diff
//! engine reads it as one of its entry sources; the stash composer rebuilds
//! it from trees and working-directory content when synthesizing commits.
//!
//! Entries are kept sorted by path under byte ordering, the same discipline
//! the tree and working-directory sources use, so the merge-join can walk
//! all three in lockstep.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry, IndexEntryFlags};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Staging area
///
/// An in-memory, path-sorted collection of tracked entries. Reading and
/// writing the on-disk index format is the responsibility of the index
/// reader; the engine only consumes this structure.
#[derive(Debug, Clone, Default)]
pub struct Index {
    /// Tracked files, keyed by path for byte-ordered traversal
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its path
    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        path.to_str().and_then(|key| self.entries.get(key))
    }

    /// Insert an entry, replacing any previous entry at the same path
    pub fn add(&mut self, entry: IndexEntry) -> anyhow::Result<()> {
        let key = entry
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", entry.name))?
            .to_string();

        self.entries.insert(key, entry);

        Ok(())
    }

    /// Stage a working-directory file
    ///
    /// Reads the file (or link target), stores the blob, and records an
    /// entry carrying the current stat metadata.
    pub fn add_from_workdir(
        &mut self,
        workspace: &Workspace,
        database: &Database,
        path: &Path,
    ) -> anyhow::Result<()> {
        let metadata = workspace.stat_file(path)?;
        let blob = workspace.parse_blob(path)?;
        let oid = blob.object_id()?;

        database.store(blob)?;

        self.add(IndexEntry::new(
            path.to_path_buf(),
            oid,
            metadata,
            IndexEntryFlags::empty(),
        ))
    }

    pub fn remove(&mut self, path: &Path) {
        if let Some(key) = path.to_str() {
            self.entries.remove(key);
        }
    }

    /// Replace the index content with the given tree
    ///
    /// Entries read from a tree carry no stat metadata beyond their mode;
    /// the next workdir comparison rehashes on demand.
    pub fn read_tree(&mut self, database: &Database, tree_oid: &ObjectId) -> anyhow::Result<()> {
        self.clear();

        for (path, entry) in database.load_flat_tree(Some(tree_oid))? {
            self.add(IndexEntry::new(
                PathBuf::from(path),
                entry.oid,
                EntryMetadata {
                    mode: entry.mode,
                    ..Default::default()
                },
                IndexEntryFlags::empty(),
            ))?;
        }

        Ok(())
    }

    /// Build and store the tree objects for the current index content
    ///
    /// # Returns
    ///
    /// The object ID of the root tree
    pub fn write_tree(&self, database: &Database) -> anyhow::Result<ObjectId> {
        let tree = Tree::build(self.entries())?;

        tree.traverse(&|subtree| database.store(subtree.clone()))?;

        tree.object_id()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}
