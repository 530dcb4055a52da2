//! Tree-diff engine
//!
//! Produces a sorted list of deltas describing how one entry source would
//! have to change to become another. Sources are drawn from committed
//! trees, the staging area, and the live working directory:
//!
//! - `delta`: The output records (status + two file sides)
//! - `diff_list`: The delta store, interning pool, and comparators
//! - `entry`: The canonical input record every source delivers
//! - `error`: Typed failure kinds
//! - `ignore`: Ignore rules consulted by the workdir walker
//! - `merge_join`: The lockstep driver and modification classifier
//! - `options`: User options and capability resolution
//! - `pathspec`: Glob filtering of emitted paths
//! - `source`: The cursor contract and its tree/index/workdir shapes
//!
//! The four operations below materialize the right pair of sources over
//! the pathspec's literal prefix and invoke the merge-join.

pub mod delta;
pub mod diff_list;
pub mod entry;
pub mod error;
pub mod ignore;
pub mod merge_join;
pub mod options;
pub mod pathspec;
pub mod source;

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_list::DiffList;
use crate::artifacts::diff::error::{DiffError, DiffResult};
use crate::artifacts::diff::options::DiffOptions;
use crate::artifacts::diff::pathspec::Pathspec;
use crate::artifacts::diff::source::{IndexSource, TreeSource, WorkdirSource};
use crate::artifacts::objects::object_id::ObjectId;

/// Diff one committed tree against another
///
/// `None` stands for the empty tree.
pub fn tree_to_tree(
    repo: &Repository,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
    opts: &DiffOptions,
) -> DiffResult<DiffList> {
    let prefix = Pathspec::new(&opts.pathspec).prefix().to_string();

    let old_src = TreeSource::for_tree_range(repo.database(), old_tree, &prefix)
        .map_err(iterator_error)?;
    let new_src = TreeSource::for_tree_range(repo.database(), new_tree, &prefix)
        .map_err(iterator_error)?;

    merge_join::from_sources(repo, Box::new(old_src), Box::new(new_src), opts)
}

/// Diff a committed tree against the staging area
///
/// A missing `index` falls back to the repository's current index.
pub fn index_to_tree(
    repo: &Repository,
    old_tree: Option<&ObjectId>,
    index: Option<&Index>,
    opts: &DiffOptions,
) -> DiffResult<DiffList> {
    let prefix = Pathspec::new(&opts.pathspec).prefix().to_string();

    let old_src = TreeSource::for_tree_range(repo.database(), old_tree, &prefix)
        .map_err(iterator_error)?;
    let new_src = index_source(repo, index, &prefix)?;

    merge_join::from_sources(repo, Box::new(old_src), Box::new(new_src), opts)
}

/// Diff the staging area against the working directory
///
/// A missing `index` falls back to the repository's current index.
pub fn workdir_to_index(
    repo: &Repository,
    index: Option<&Index>,
    opts: &DiffOptions,
) -> DiffResult<DiffList> {
    let prefix = Pathspec::new(&opts.pathspec).prefix().to_string();

    let old_src = index_source(repo, index, &prefix)?;
    let new_src = WorkdirSource::for_workdir_range(repo, &prefix).map_err(iterator_error)?;

    merge_join::from_sources(repo, Box::new(old_src), Box::new(new_src), opts)
}

/// Diff a committed tree against the working directory
pub fn workdir_to_tree(
    repo: &Repository,
    old_tree: Option<&ObjectId>,
    opts: &DiffOptions,
) -> DiffResult<DiffList> {
    let prefix = Pathspec::new(&opts.pathspec).prefix().to_string();

    let old_src = TreeSource::for_tree_range(repo.database(), old_tree, &prefix)
        .map_err(iterator_error)?;
    let new_src = WorkdirSource::for_workdir_range(repo, &prefix).map_err(iterator_error)?;

    merge_join::from_sources(repo, Box::new(old_src), Box::new(new_src), opts)
}

fn index_source(
    repo: &Repository,
    index: Option<&Index>,
    prefix: &str,
) -> DiffResult<IndexSource> {
    match index {
        Some(index) => IndexSource::for_index_range(index, prefix).map_err(iterator_error),
        None => {
            let index = repo
                .index()
                .map_err(|error| DiffError::InvalidRepo(error.to_string()))?;
            IndexSource::for_index_range(&index, prefix).map_err(iterator_error)
        }
    }
}

fn iterator_error(error: anyhow::Error) -> DiffError {
    DiffError::Iterator(error.to_string())
}
