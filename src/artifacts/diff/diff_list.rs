//! Delta store and comparators
//!
//! A `DiffList` owns everything one diff build produces: the normalized
//! options, the resolved capability bits, the interning pool backing every
//! delta path, and the deltas themselves in `(path, status)` order under
//! the comparator chosen by the sort-discipline bridge.

use crate::areas::repository::Repository;
use crate::artifacts::diff::delta::{Delta, DeltaStatus, FileSide, FileSideFlags};
use crate::artifacts::diff::entry::DiffEntry;
use crate::artifacts::diff::error::{DiffError, DiffResult};
use crate::artifacts::diff::options::{DiffCaps, DiffFlags, DiffOptions};
use crate::artifacts::diff::pathspec::Pathspec;
use crate::artifacts::diff::source::{EntrySource, SourceKind};
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

const OLD_PREFIX_DEFAULT: &str = "a/";
const NEW_PREFIX_DEFAULT: &str = "b/";

/// Interning pool for delta paths and prefixes
///
/// Identical strings alias the same allocation, and the pool outlives
/// every delta it feeds, so deltas stay trivially movable.
#[derive(Debug, Default)]
pub struct PathPool {
    interned: HashMap<String, Rc<str>>,
}

impl PathPool {
    pub fn intern(&mut self, value: &str) -> Rc<str> {
        if let Some(existing) = self.interned.get(value) {
            return existing.clone();
        }

        let interned: Rc<str> = Rc::from(value);
        self.interned.insert(value.to_string(), interned.clone());
        interned
    }
}

/// Path comparator carrying the active case policy
///
/// The merge-join, the prefix checks, and the delta ordering all consult
/// the same comparator, so a single case policy governs the whole build.
#[derive(Debug, Clone, Copy)]
pub struct PathCmp {
    icase: bool,
}

impl PathCmp {
    pub fn new(icase: bool) -> Self {
        PathCmp { icase }
    }

    pub fn is_icase(&self) -> bool {
        self.icase
    }

    /// Byte ordering, optionally folding ASCII case
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.icase {
            a.bytes()
                .map(|byte| byte.to_ascii_lowercase())
                .cmp(b.bytes().map(|byte| byte.to_ascii_lowercase()))
        } else {
            a.as_bytes().cmp(b.as_bytes())
        }
    }

    pub fn starts_with(&self, path: &str, prefix: &str) -> bool {
        if self.icase {
            path.len() >= prefix.len() && path[..prefix.len()].eq_ignore_ascii_case(prefix)
        } else {
            path.starts_with(prefix)
        }
    }

    pub fn compare_entries(&self, a: &DiffEntry, b: &DiffEntry) -> Ordering {
        self.compare(&a.path, &b.path)
    }
}

/// The result of one diff build
///
/// Owned by the caller; clone-free sharing across consumers goes through
/// `Rc<DiffList>`. Options and capabilities are immutable once built.
pub struct DiffList {
    options: DiffOptions,
    caps: DiffCaps,
    old_prefix: Rc<str>,
    new_prefix: Rc<str>,
    pool: PathPool,
    deltas: Vec<Delta>,
    pathspec: Pathspec,
    cmp: PathCmp,
    old_src: SourceKind,
    new_src: SourceKind,
}

impl DiffList {
    /// Allocate an empty list with normalized options
    ///
    /// Capability bits come from the repository configuration, prefixes
    /// are defaulted, `/`-terminated, and swapped under REVERSE, and
    /// INCLUDE_TYPECHANGE_TREES turns on INCLUDE_TYPECHANGE. The
    /// comparator is chosen from the sources' case policies: one
    /// case-folded source makes the whole build case-folded.
    pub(crate) fn new(
        repo: &Repository,
        opts: &DiffOptions,
        old_src: &dyn EntrySource,
        new_src: &dyn EntrySource,
    ) -> DiffResult<Self> {
        let mut options = opts.clone();

        if options.flags.contains(DiffFlags::INCLUDE_TYPECHANGE_TREES) {
            options.flags |= DiffFlags::INCLUDE_TYPECHANGE;
        }

        let icase = old_src.ignore_case() || new_src.ignore_case();
        if icase {
            options.flags |= DiffFlags::DELTAS_ARE_ICASE;
        } else {
            options.flags.remove(DiffFlags::DELTAS_ARE_ICASE);
        }

        let caps = DiffCaps::from_config(repo.config(), options.flags);
        let pathspec = Pathspec::new(&options.pathspec);

        let mut pool = PathPool::default();
        let old_raw = terminated_prefix(options.old_prefix.as_deref(), OLD_PREFIX_DEFAULT);
        let new_raw = terminated_prefix(options.new_prefix.as_deref(), NEW_PREFIX_DEFAULT);
        let (old_raw, new_raw) = if options.flags.contains(DiffFlags::REVERSE) {
            (new_raw, old_raw)
        } else {
            (old_raw, new_raw)
        };
        let old_prefix = pool.intern(&old_raw);
        let new_prefix = pool.intern(&new_raw);

        Ok(DiffList {
            options,
            caps,
            old_prefix,
            new_prefix,
            pool,
            deltas: Vec::new(),
            pathspec,
            cmp: PathCmp::new(icase),
            old_src: old_src.source_kind(),
            new_src: new_src.source_kind(),
        })
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn capabilities(&self) -> DiffCaps {
        self.caps
    }

    /// Display prefix of the old side, `/`-terminated
    pub fn old_prefix(&self) -> &str {
        &self.old_prefix
    }

    /// Display prefix of the new side, `/`-terminated
    pub fn new_prefix(&self) -> &str {
        &self.new_prefix
    }

    pub fn sources(&self) -> (SourceKind, SourceKind) {
        (self.old_src, self.new_src)
    }

    pub(crate) fn cmp(&self) -> &PathCmp {
        &self.cmp
    }

    pub fn is_icase(&self) -> bool {
        self.cmp.is_icase()
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Walk the deltas in order, stopping when the callback returns false
    pub fn foreach(&self, mut callback: impl FnMut(&Delta) -> bool) -> DiffResult<()> {
        for delta in &self.deltas {
            if !callback(delta) {
                return Err(DiffError::UserAbort);
            }
        }

        Ok(())
    }

    /// Whether the store honors its `(path, status)` ordering contract
    pub fn is_sorted(&self) -> bool {
        self.deltas.windows(2).all(|pair| {
            match self.cmp.compare(&pair[0].old.path, &pair[1].old.path) {
                Ordering::Less => true,
                Ordering::Equal => pair[0].status <= pair[1].status,
                Ordering::Greater => false,
            }
        })
    }

    pub(crate) fn matches_pathspec(&self, path: &str) -> bool {
        self.pathspec.matches(
            path,
            self.options.flags.contains(DiffFlags::DISABLE_PATHSPEC_MATCH),
            self.options.flags.contains(DiffFlags::DELTAS_ARE_ICASE),
        )
    }

    /// Record a single-sided delta (DELETED, ADDED, IGNORED, UNTRACKED)
    ///
    /// REVERSE swaps ADDED and DELETED and, with them, which side the
    /// entry lands on.
    pub(crate) fn push_from_one(&mut self, status: DeltaStatus, entry: &DiffEntry) {
        debug_assert!(status != DeltaStatus::Modified);

        if self.options.should_skip(status) {
            return;
        }

        if !self.matches_pathspec(&entry.path) {
            return;
        }

        let status = if self.options.flags.contains(DiffFlags::REVERSE) {
            status.reversed()
        } else {
            status
        };

        let path = self.pool.intern(&entry.path);
        let mut old = FileSide::absent(path.clone());
        let mut new = FileSide::absent(path);

        let populated = if status == DeltaStatus::Deleted {
            &mut old
        } else {
            &mut new
        };
        populated.mode = Some(entry.mode.clone());
        populated.size = entry.size;
        populated.oid = entry.oid.clone();

        old.flags |= FileSideFlags::VALID_OID;
        if status == DeltaStatus::Deleted || !new.oid.is_zero() {
            new.flags |= FileSideFlags::VALID_OID;
        }

        self.deltas.push(Delta { status, old, new });
    }

    /// Record a two-sided delta (UNMODIFIED, MODIFIED, TYPECHANGE)
    ///
    /// A substitute new oid computed by the classifier lands on whichever
    /// side is "new" after the REVERSE swap.
    pub(crate) fn push_from_two(
        &mut self,
        status: DeltaStatus,
        old_entry: &DiffEntry,
        old_mode: EntryMode,
        new_entry: &DiffEntry,
        new_mode: EntryMode,
        new_oid: Option<&ObjectId>,
    ) {
        if self.options.should_skip(status) {
            return;
        }

        let reverse = self.options.flags.contains(DiffFlags::REVERSE);
        let (old_entry, old_mode, new_entry, new_mode) = if reverse {
            (new_entry, new_mode, old_entry, old_mode)
        } else {
            (old_entry, old_mode, new_entry, new_mode)
        };

        let path = self.pool.intern(&old_entry.path);
        let mut old = FileSide {
            path: path.clone(),
            mode: Some(old_mode),
            size: old_entry.size,
            oid: old_entry.oid.clone(),
            flags: FileSideFlags::VALID_OID,
        };
        let mut new = FileSide {
            path,
            mode: Some(new_mode),
            size: new_entry.size,
            oid: new_entry.oid.clone(),
            flags: FileSideFlags::empty(),
        };

        if let Some(substitute) = new_oid {
            if reverse {
                old.oid = substitute.clone();
            } else {
                new.oid = substitute.clone();
            }
        }

        if new_oid.is_some() || !new_entry.oid.is_zero() {
            new.flags |= FileSideFlags::VALID_OID;
        }

        self.deltas.push(Delta { status, old, new });
    }

    /// The most recently appended delta, iff its surviving-side oid
    /// matches the probed item
    ///
    /// Sound because appends happen in sorted path order and a subtree's
    /// root precedes its contents.
    pub(crate) fn last_for_item_mut(&mut self, item: &DiffEntry) -> Option<&mut Delta> {
        let delta = self.deltas.last_mut()?;

        let matched = match delta.status {
            DeltaStatus::Unmodified | DeltaStatus::Deleted => delta.old.oid == item.oid,
            DeltaStatus::Added => delta.new.oid == item.oid,
            DeltaStatus::Modified => delta.old.oid == item.oid || delta.new.oid == item.oid,
            _ => false,
        };

        matched.then_some(delta)
    }
}

fn terminated_prefix(prefix: Option<&str>, default: &str) -> String {
    let prefix = prefix.unwrap_or(default);

    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}
