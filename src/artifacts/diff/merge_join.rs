//! Merge-join driver and modification classifier
//!
//! The driver walks the old and new cursors in lockstep. At every step one
//! of three branches applies:
//!
//! - old path sorts first: the entry was deleted
//! - new path sorts first: the entry was added, untracked, or ignored, and
//!   directories may be descended into instead of emitted
//! - paths coincide: the modification classifier decides between
//!   UNMODIFIED, MODIFIED, and TYPECHANGE
//!
//! Ignored-vs-untracked precedence: container-directory ignore is checked
//! before per-file ignore, so files under an ignored directory are skipped
//! outright even when they match an ignore rule themselves. Core git
//! resolves this the other way around; the difference is deliberate.

use crate::areas::database::Database;
use crate::areas::repository::Repository;
use crate::artifacts::diff::delta::DeltaStatus;
use crate::artifacts::diff::diff_list::{DiffList, PathCmp};
use crate::artifacts::diff::entry::DiffEntry;
use crate::artifacts::diff::error::{DiffError, DiffResult};
use crate::artifacts::diff::options::{DiffCaps, DiffFlags, DiffOptions};
use crate::artifacts::diff::source::{spool_and_sort, EntrySource, SourceKind};
use crate::artifacts::filters::FilterDirection;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntryFlags;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::submodule::SubmoduleIgnore;
use std::cmp::Ordering;
use std::path::Path;

const DOT_GIT: &str = ".git";

/// Run the merge-join over two prepared sources
///
/// This is the single build routine behind the four public operations.
/// Every path through it either returns a fully-built list or an error
/// with all intermediate state dropped.
pub fn from_sources<'a>(
    repo: &Repository,
    mut old_src: Box<dyn EntrySource + 'a>,
    mut new_src: Box<dyn EntrySource + 'a>,
    opts: &DiffOptions,
) -> DiffResult<DiffList> {
    let mut diff = DiffList::new(repo, opts, old_src.as_ref(), new_src.as_ref())?;

    // If only one source is case-folded, spool the other into the same
    // order before any delta is produced.
    if diff.is_icase() {
        if !old_src.ignore_case() {
            old_src = Box::new(spool_and_sort(old_src, diff.cmp()).map_err(iterator_error)?);
        }
        if !new_src.ignore_case() {
            new_src = Box::new(spool_and_sort(new_src, diff.cmp()).map_err(iterator_error)?);
        }
    }

    let new_is_workdir = new_src.source_kind() == SourceKind::Workdir;
    let mut ignore_prefix: Option<String> = None;

    loop {
        let oitem = old_src.current().cloned();
        let nitem = new_src.current().cloned();

        let ordering = match (&oitem, &nitem) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(o), Some(n)) => diff.cmp().compare(&o.path, &n.path),
        };

        match ordering {
            // old item not matched in new: deleted
            Ordering::Less => {
                let o = oitem.as_ref().expect("old side present");

                diff.push_from_one(DeltaStatus::Deleted, o);

                // the entry may have become a tree
                if diff
                    .options()
                    .flags
                    .contains(DiffFlags::INCLUDE_TYPECHANGE_TREES)
                    && entry_is_prefixed(diff.cmp(), o, nitem.as_ref())
                    && let Some(last) = diff.last_for_item_mut(o)
                {
                    last.status = DeltaStatus::Typechange;
                    last.new.mode = Some(EntryMode::Directory);
                }

                old_src.advance().map_err(iterator_error)?;
            }

            // new item not matched in old: added, untracked, or ignored
            Ordering::Greater => {
                let n = nitem.as_ref().expect("new side present");
                let mut delta_type = DeltaStatus::Untracked;

                // contained in an ignored parent directory?
                if let Some(prefix) = &ignore_prefix
                    && diff.cmp().starts_with(&n.path, prefix)
                {
                    delta_type = DeltaStatus::Ignored;
                }

                if n.is_directory() {
                    // descend only when tracked items live inside, or the
                    // caller asked for untracked directory contents
                    let contains_tracked = entry_is_prefixed(diff.cmp(), n, oitem.as_ref());
                    let mut recurse_untracked = delta_type == DeltaStatus::Untracked
                        && diff
                            .options()
                            .flags
                            .contains(DiffFlags::RECURSE_UNTRACKED_DIRS);

                    // never advance into directories holding a .git entry
                    if !contains_tracked
                        && recurse_untracked
                        && let Some(full_path) = new_src.current_workdir_path()
                        && full_path.join(DOT_GIT).exists()
                    {
                        recurse_untracked = false;
                    }

                    if contains_tracked || recurse_untracked {
                        if delta_type == DeltaStatus::Untracked && new_src.current_is_ignored() {
                            ignore_prefix = Some(n.path.clone());
                        }

                        new_src.advance_into_directory().map_err(iterator_error)?;
                        continue;
                    }
                }

                if delta_type == DeltaStatus::Ignored {
                    // ignored parent directory, so skip completely
                    new_src.advance().map_err(iterator_error)?;
                    continue;
                } else if new_src.current_is_ignored() {
                    delta_type = DeltaStatus::Ignored;
                } else if new_src.source_kind() != SourceKind::Workdir {
                    delta_type = DeltaStatus::Added;
                }

                diff.push_from_one(delta_type, n);

                // the entry may have been a tree
                if delta_type != DeltaStatus::Ignored
                    && diff
                        .options()
                        .flags
                        .contains(DiffFlags::INCLUDE_TYPECHANGE_TREES)
                    && entry_is_prefixed(diff.cmp(), n, oitem.as_ref())
                    && let Some(o) = oitem.as_ref()
                    && let Some(last) = diff.last_for_item_mut(o)
                {
                    last.status = DeltaStatus::Typechange;
                    last.old.mode = Some(EntryMode::Directory);
                }

                new_src.advance().map_err(iterator_error)?;
            }

            // coincident paths: classify the modification
            Ordering::Equal => {
                let o = oitem.as_ref().expect("old side present");
                let n = nitem.as_ref().expect("new side present");

                maybe_modified(repo, &mut diff, o, n, new_is_workdir)?;

                old_src.advance().map_err(iterator_error)?;
                new_src.advance().map_err(iterator_error)?;
            }
        }
    }

    Ok(diff)
}

/// Whether `inner` sits inside the subtree rooted at `item`
///
/// True when `inner`'s path extends `item`'s path at a directory boundary:
/// `item` ends with `/`, or the next character of `inner` is `/` or the
/// paths are equal.
fn entry_is_prefixed(cmp: &PathCmp, item: &DiffEntry, inner: Option<&DiffEntry>) -> bool {
    let Some(inner) = inner else {
        return false;
    };

    if !cmp.starts_with(&inner.path, &item.path) {
        return false;
    }

    let item_len = item.path.len();
    item.path.ends_with('/')
        || inner.path.len() == item_len
        || inner.path.as_bytes().get(item_len) == Some(&b'/')
}

/// Classify a coincident pair
///
/// Applies, in order: the pathspec gate, platform-capability fallbacks,
/// index flags, the type-change test, content equality, the stat-tuple
/// fast path, submodule consultation, and hash-on-demand.
fn maybe_modified(
    repo: &Repository,
    diff: &mut DiffList,
    oitem: &DiffEntry,
    nitem: &DiffEntry,
    new_is_workdir: bool,
) -> DiffResult<()> {
    if !diff.matches_pathspec(&nitem.path) {
        return Ok(());
    }

    let caps = diff.capabilities();
    let flags = diff.options().flags;
    let omode = oitem.mode.clone();
    let mut nmode = nitem.mode.clone();

    // on platforms with no symlinks, preserve mode of existing symlinks
    if omode.is_symlink()
        && nmode.is_file()
        && new_is_workdir
        && !caps.contains(DiffCaps::HAS_SYMLINKS)
    {
        nmode = omode.clone();
    }

    // on platforms with no execmode, just preserve old mode
    if !caps.contains(DiffCaps::TRUST_MODE_BITS)
        && nmode.permissions_differ(&omode)
        && new_is_workdir
    {
        nmode = nmode.with_permissions_of(&omode);
    }

    let mut status = DeltaStatus::Modified;
    let mut use_noid: Option<ObjectId> = None;

    // support "assume unchanged" (poorly, b/c we still stat everything)
    if caps.contains(DiffCaps::ASSUME_UNCHANGED) {
        status = if oitem.flags.contains(IndexEntryFlags::INTENT_TO_ADD) {
            DeltaStatus::Modified
        } else {
            DeltaStatus::Unmodified
        };
    }
    // support "skip worktree" index bit
    else if oitem.flags.contains(IndexEntryFlags::SKIP_WORKTREE) {
        status = DeltaStatus::Unmodified;
    }
    // if basic type of file changed, then split into delete and add
    else if omode.kind() != nmode.kind() {
        if flags.contains(DiffFlags::INCLUDE_TYPECHANGE) {
            status = DeltaStatus::Typechange;
        } else {
            // keep the split pair in (path, status) order even under REVERSE
            if flags.contains(DiffFlags::REVERSE) {
                diff.push_from_one(DeltaStatus::Added, nitem);
                diff.push_from_one(DeltaStatus::Deleted, oitem);
            } else {
                diff.push_from_one(DeltaStatus::Deleted, oitem);
                diff.push_from_one(DeltaStatus::Added, nitem);
            }
            return Ok(());
        }
    }
    // if oids and modes match, then file is unmodified
    else if oitem.oid == nitem.oid && omode == nmode {
        status = DeltaStatus::Unmodified;
    }
    // unknown new oid from a workdir source: check circumstances that can
    // accelerate things or need special handling
    else if nitem.oid.is_zero() && new_is_workdir {
        let trust_ctime = caps.contains(DiffCaps::TRUST_CTIME);
        let use_dev = caps.contains(DiffCaps::USE_DEV);

        // TODO: compare against the index file mtime to avoid trusting
        // racy stat data for entries written in the same second

        // if the stat data looks exactly alike, then assume the same
        if omode == nmode && oitem.stat_matches(nitem, trust_ctime, use_dev) {
            status = DeltaStatus::Unmodified;
        } else if nmode.is_gitlink() {
            if flags.contains(DiffFlags::IGNORE_SUBMODULES) {
                status = DeltaStatus::Unmodified;
            } else {
                let submodule =
                    repo.submodules()
                        .lookup(&nitem.path)
                        .map_err(|error| DiffError::Submodule {
                            path: nitem.path.clone(),
                            message: error.to_string(),
                        })?;

                if submodule.ignore() == SubmoduleIgnore::All {
                    status = DeltaStatus::Unmodified;
                } else {
                    status = if submodule.status().is_unmodified() {
                        DeltaStatus::Unmodified
                    } else {
                        DeltaStatus::Modified
                    };

                    // grab the checked-out commit while we are here
                    if let Some(wd_oid) = submodule.workdir_oid() {
                        use_noid = Some(wd_oid.clone());
                    }
                }
            }
        }
    }

    // modified but the new oid is still unknown: calculate it now
    if status != DeltaStatus::Unmodified && nitem.oid.is_zero() {
        if use_noid.is_none() {
            use_noid = Some(oid_for_file(repo, &nitem.path, &nitem.mode, nitem.size)?);
        }
        if omode == nmode && use_noid.as_ref() == Some(&oitem.oid) {
            status = DeltaStatus::Unmodified;
        }
    }

    diff.push_from_two(status, oitem, omode, nitem, nmode, use_noid.as_ref());

    Ok(())
}

/// Compute the content identity of a working-directory entry
///
/// - gitlink: the submodule's checked-out commit; a failed lookup is a
///   tolerated transient state and yields the zero oid
/// - symlink: the link target hashed as a blob
/// - regular file: the to-ODB filter chain applied, then hashed as a blob
pub fn oid_for_file(
    repo: &Repository,
    path: &str,
    mode: &EntryMode,
    size: u64,
) -> DiffResult<ObjectId> {
    let rel_path = Path::new(path);

    if mode.is_gitlink() {
        return match repo.submodules().lookup(path) {
            Ok(submodule) => Ok(submodule.workdir_oid().cloned().unwrap_or_else(ObjectId::zero)),
            Err(_) => Ok(ObjectId::zero()),
        };
    }

    if mode.is_symlink() {
        let target = repo
            .workspace()
            .read_link(rel_path)
            .map_err(|error| io_error(path, error))?;

        return Database::hash_blob(target.as_bytes()).map_err(|error| io_error(path, error));
    }

    if usize::try_from(size).is_err() {
        return Err(DiffError::Overflow(path.to_string()));
    }

    let data = repo
        .workspace()
        .read_bytes(rel_path)
        .map_err(|error| io_error(path, error))?;

    let filters = repo.filters(rel_path, FilterDirection::ToOdb);
    let data = filters
        .apply(rel_path, data)
        .map_err(|error| DiffError::Filter {
            path: path.to_string(),
            message: error.to_string(),
        })?;

    Database::hash_blob(&data).map_err(|error| io_error(path, error))
}

fn iterator_error(error: anyhow::Error) -> DiffError {
    DiffError::Iterator(error.to_string())
}

fn io_error(path: &str, error: anyhow::Error) -> DiffError {
    DiffError::Io {
        path: path.to_string(),
        message: error.to_string(),
    }
}
