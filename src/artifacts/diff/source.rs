//! Entry sources
//!
//! The merge-join walks two cursors over sorted entry streams. Tree and
//! index sources are leaf iterators: their content is already expanded
//! into a flat listing. The working-directory source is hierarchical: it
//! delivers a directory entry first and descends into it only when asked,
//! so untracked subtrees can be skipped without ever reading them.
//!
//! `spool_and_sort` is the sort-discipline bridge: it materializes a
//! case-sensitive source and re-sorts it under the case-folded comparator
//! so both cursors agree on ordering before the merge-join starts.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_list::PathCmp;
use crate::artifacts::diff::entry::DiffEntry;
use crate::artifacts::diff::ignore::IgnoreRules;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntryFlags;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::{Path, PathBuf};

/// Which area a source draws its entries from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tree,
    Index,
    Workdir,
}

/// Cursor over a sorted stream of diff entries
///
/// Entries arrive in ascending path order under the source's own case
/// policy. The optional operations are no-ops on sources that do not
/// support them.
pub trait EntrySource {
    fn source_kind(&self) -> SourceKind;

    /// Whether this source delivers entries in case-folded order
    fn ignore_case(&self) -> bool;

    /// The entry at the cursor, or None at the end
    fn current(&self) -> Option<&DiffEntry>;

    /// Step to the next entry in sorted order
    fn advance(&mut self) -> anyhow::Result<()>;

    /// Descend into the current directory entry
    ///
    /// Equivalent to `advance` on sources whose listing is already flat.
    fn advance_into_directory(&mut self) -> anyhow::Result<()> {
        self.advance()
    }

    /// Absolute filesystem path of the current entry (workdir sources only)
    fn current_workdir_path(&self) -> Option<PathBuf> {
        None
    }

    /// Whether the current entry matches an ignore pattern (workdir
    /// sources only)
    fn current_is_ignored(&self) -> bool {
        false
    }
}

/// Flat listing of a stored tree
pub struct TreeSource {
    entries: Vec<DiffEntry>,
    pos: usize,
    icase: bool,
}

impl TreeSource {
    /// Inflate a tree into a flat source restricted to a literal prefix
    ///
    /// `None` stands for the empty tree. A commit id is accepted and
    /// resolved to its tree.
    pub fn for_tree_range(
        database: &Database,
        tree: Option<&ObjectId>,
        prefix: &str,
    ) -> anyhow::Result<Self> {
        let entries = database
            .load_flat_tree(tree)?
            .into_iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, entry)| {
                DiffEntry::new(
                    path,
                    entry.mode,
                    0,
                    entry.oid,
                    None,
                    IndexEntryFlags::empty(),
                )
            })
            .collect();

        Ok(TreeSource {
            entries,
            pos: 0,
            icase: false,
        })
    }

    /// Re-declare the source's case policy, re-sorting its entries
    pub fn with_ignore_case(mut self, icase: bool) -> Self {
        self.icase = icase;
        let cmp = PathCmp::new(icase);
        self.entries.sort_by(|a, b| cmp.compare_entries(a, b));
        self
    }
}

impl EntrySource for TreeSource {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Tree
    }

    fn ignore_case(&self) -> bool {
        self.icase
    }

    fn current(&self) -> Option<&DiffEntry> {
        self.entries.get(self.pos)
    }

    fn advance(&mut self) -> anyhow::Result<()> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(())
    }
}

/// Flat listing of the staging area
pub struct IndexSource {
    entries: Vec<DiffEntry>,
    pos: usize,
    icase: bool,
}

impl IndexSource {
    pub fn for_index_range(index: &Index, prefix: &str) -> anyhow::Result<Self> {
        let mut entries = Vec::new();

        for entry in index.entries() {
            let path = entry
                .name
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", entry.name))?;

            if !path.starts_with(prefix) {
                continue;
            }

            entries.push(DiffEntry::new(
                path.to_string(),
                entry.metadata.mode.clone(),
                entry.metadata.size,
                entry.oid.clone(),
                Some(entry.metadata.clone()),
                entry.flags,
            ));
        }

        Ok(IndexSource {
            entries,
            pos: 0,
            icase: false,
        })
    }

    pub fn with_ignore_case(mut self, icase: bool) -> Self {
        self.icase = icase;
        let cmp = PathCmp::new(icase);
        self.entries.sort_by(|a, b| cmp.compare_entries(a, b));
        self
    }
}

impl EntrySource for IndexSource {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Index
    }

    fn ignore_case(&self) -> bool {
        self.icase
    }

    fn current(&self) -> Option<&DiffEntry> {
        self.entries.get(self.pos)
    }

    fn advance(&mut self) -> anyhow::Result<()> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(())
    }
}

struct Frame {
    entries: Vec<DiffEntry>,
    pos: usize,
}

/// Lazy walker over the working directory
///
/// Keeps one frame per open directory. Directory entries carry a trailing
/// `/` so sibling ordering agrees with flat tree/index paths, are
/// delivered before their contents, and are only expanded on demand.
/// Entries carry stat metadata and a zero oid; `.git` is never delivered.
pub struct WorkdirSource<'r> {
    repo: &'r Repository,
    ignores: IgnoreRules,
    frames: Vec<Frame>,
    prefix: String,
    icase: bool,
}

impl<'r> WorkdirSource<'r> {
    pub fn for_workdir_range(repo: &'r Repository, prefix: &str) -> anyhow::Result<Self> {
        let ignores = IgnoreRules::load(repo.workspace())?;
        let icase = repo.workdir_ignore_case();

        let mut source = WorkdirSource {
            repo,
            ignores,
            frames: Vec::new(),
            prefix: prefix.to_string(),
            icase,
        };

        // start at the deepest directory named by the prefix
        let walk_root = match prefix.rfind('/') {
            Some(slash) => &prefix[..slash],
            None => "",
        };

        let walk_dir = (!walk_root.is_empty()).then(|| PathBuf::from(walk_root));
        let root_exists = walk_dir
            .as_deref()
            .map(|dir| source.repo.workspace().absolute_path(dir).is_dir())
            .unwrap_or(true);

        if root_exists {
            let frame = source.build_frame(walk_dir.as_deref())?;
            source.frames.push(frame);
            source.normalize();
        }

        Ok(source)
    }

    fn build_frame(&self, dir: Option<&Path>) -> anyhow::Result<Frame> {
        let mut entries = Vec::new();

        for rel_path in self.repo.workspace().list_dir(dir)? {
            let rel_str = rel_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Invalid path {:?}", rel_path))?;
            let metadata = self.repo.workspace().stat_file(&rel_path)?;

            let entry = if metadata.mode.is_tree() {
                if self.repo.submodules().contains(rel_str) {
                    let mut metadata = metadata;
                    metadata.mode = EntryMode::Gitlink;
                    DiffEntry::new(
                        rel_str.to_string(),
                        EntryMode::Gitlink,
                        0,
                        ObjectId::zero(),
                        Some(metadata),
                        IndexEntryFlags::empty(),
                    )
                } else {
                    DiffEntry::new(
                        format!("{}/", rel_str),
                        EntryMode::Directory,
                        0,
                        ObjectId::zero(),
                        Some(metadata),
                        IndexEntryFlags::empty(),
                    )
                }
            } else {
                DiffEntry::new(
                    rel_str.to_string(),
                    metadata.mode.clone(),
                    metadata.size,
                    ObjectId::zero(),
                    Some(metadata),
                    IndexEntryFlags::empty(),
                )
            };

            if self.in_range(&entry.path) {
                entries.push(entry);
            }
        }

        let cmp = PathCmp::new(self.icase);
        entries.sort_by(|a, b| cmp.compare_entries(a, b));

        Ok(Frame { entries, pos: 0 })
    }

    fn in_range(&self, path: &str) -> bool {
        // keep in-range entries plus the ancestor directories leading to
        // the range
        self.prefix.is_empty()
            || path.starts_with(&self.prefix)
            || self.prefix.starts_with(path)
    }

    fn normalize(&mut self) {
        while let Some(top) = self.frames.last() {
            if top.pos >= top.entries.len() {
                self.frames.pop();
            } else {
                break;
            }
        }
    }
}

impl EntrySource for WorkdirSource<'_> {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Workdir
    }

    fn ignore_case(&self) -> bool {
        self.icase
    }

    fn current(&self) -> Option<&DiffEntry> {
        self.frames
            .last()
            .and_then(|frame| frame.entries.get(frame.pos))
    }

    fn advance(&mut self) -> anyhow::Result<()> {
        if let Some(top) = self.frames.last_mut() {
            top.pos += 1;
        }
        self.normalize();
        Ok(())
    }

    fn advance_into_directory(&mut self) -> anyhow::Result<()> {
        let Some(current) = self.current().cloned() else {
            return Ok(());
        };

        if !current.is_directory() {
            return self.advance();
        }

        let dir = PathBuf::from(current.path.trim_end_matches('/'));
        let frame = self.build_frame(Some(&dir))?;

        // the directory entry itself is consumed by the descent
        if let Some(top) = self.frames.last_mut() {
            top.pos += 1;
        }
        self.frames.push(frame);
        self.normalize();

        Ok(())
    }

    fn current_workdir_path(&self) -> Option<PathBuf> {
        self.current().map(|entry| {
            self.repo
                .workspace()
                .absolute_path(Path::new(entry.path.trim_end_matches('/')))
        })
    }

    fn current_is_ignored(&self) -> bool {
        self.current()
            .map(|entry| self.ignores.is_ignored(&entry.path, entry.is_directory()))
            .unwrap_or(false)
    }
}

struct SpooledEntry {
    entry: DiffEntry,
    ignored: bool,
    workdir_path: Option<PathBuf>,
}

/// A source materialized into memory and re-sorted case-insensitively
pub struct SpooledSource {
    kind: SourceKind,
    entries: Vec<SpooledEntry>,
    pos: usize,
}

/// Drain a source and re-sort it under the given comparator
///
/// This is the only non-streaming step of a diff build; it runs entirely
/// before the merge-join starts. The spooled source keeps the original's
/// kind and per-entry ignore/workdir attributes.
///
/// Only flat sources can be spooled: draining never descends into
/// directories, so a hierarchical workdir source would be truncated to
/// its visible frontier. Asking for one is an error, not a silent cap.
pub fn spool_and_sort<'a>(
    mut source: Box<dyn EntrySource + 'a>,
    cmp: &PathCmp,
) -> anyhow::Result<SpooledSource> {
    let kind = source.source_kind();

    if kind == SourceKind::Workdir {
        anyhow::bail!("A workdir source cannot be spooled for case-folded ordering");
    }

    let mut entries = Vec::new();

    while let Some(entry) = source.current().cloned() {
        entries.push(SpooledEntry {
            ignored: source.current_is_ignored(),
            workdir_path: source.current_workdir_path(),
            entry,
        });
        source.advance()?;
    }

    entries.sort_by(|a, b| cmp.compare_entries(&a.entry, &b.entry));

    Ok(SpooledSource {
        kind,
        entries,
        pos: 0,
    })
}

impl EntrySource for SpooledSource {
    fn source_kind(&self) -> SourceKind {
        self.kind
    }

    fn ignore_case(&self) -> bool {
        true
    }

    fn current(&self) -> Option<&DiffEntry> {
        self.entries.get(self.pos).map(|spooled| &spooled.entry)
    }

    fn advance(&mut self) -> anyhow::Result<()> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(())
    }

    fn current_workdir_path(&self) -> Option<PathBuf> {
        self.entries
            .get(self.pos)
            .and_then(|spooled| spooled.workdir_path.clone())
    }

    fn current_is_ignored(&self) -> bool {
        self.entries
            .get(self.pos)
            .map(|spooled| spooled.ignored)
            .unwrap_or(false)
    }
}
