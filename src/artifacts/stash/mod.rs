//! Stash composer
//!
//! Saves the dirty state of a repository as a triple of synthetic commits
//! held under `refs/stash` with one reflog entry per saved state:
//!
//! - the index commit ("index on ..."), parented on the base commit
//! - the untracked commit ("untracked files on ..."), parentless, present
//!   only when untracked or ignored files were requested
//! - the worktree commit, parented on all of the above, whose id is the
//!   stash id
//!
//! The composer is a pure client of the diff engine: every tree it builds
//! comes from replaying diff deltas onto an index. After a save the
//! staging area is rolled back to the base tree (unless the caller asked
//! to keep it); resetting the working directory itself is the checkout
//! engine's job, not ours.

use crate::areas::index::Index;
use crate::areas::refs::{ReflogEntry, STASH_REF_NAME};
use crate::areas::repository::Repository;
use crate::artifacts::diff;
use crate::artifacts::diff::delta::{Delta, DeltaStatus};
use crate::artifacts::diff::error::DiffError;
use crate::artifacts::diff::options::{DiffFlags, DiffOptions};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bitflags::bitflags;
use derive_new::new;
use std::path::Path;

bitflags! {
    /// What a stash save captures beyond tracked changes
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct StashFlags: u32 {
        /// Also capture untracked files
        const INCLUDE_UNTRACKED = 0b001;
        /// Also capture ignored files
        const INCLUDE_IGNORED = 0b010;
        /// Leave the staged state in the index after saving instead of
        /// rolling it back to the base tree
        const KEEP_INDEX = 0b100;
    }
}

/// Stash operations over one repository
#[derive(new)]
pub struct Stash<'r> {
    repository: &'r Repository,
}

impl<'r> Stash<'r> {
    /// Save the current dirty state
    ///
    /// Builds the index, untracked, and worktree commits, points
    /// `refs/stash` at the worktree commit, and records a reflog entry.
    /// Afterwards the staging area is rolled back to the base tree unless
    /// `KEEP_INDEX` is set; resetting the working directory itself is the
    /// checkout engine's job.
    ///
    /// # Returns
    ///
    /// The object ID of the worktree commit (the stash id)
    pub fn save(
        &self,
        stasher: &Author,
        message: Option<&str>,
        flags: StashFlags,
    ) -> anyhow::Result<ObjectId> {
        self.ensure_non_bare_repository()?;

        let base_oid = self
            .repository
            .refs()
            .read_head()?
            .context("Cannot stash changes - You do not have the initial commit yet.")?;
        let base_commit = self
            .repository
            .database()
            .parse_object_as_commit(&base_oid)?
            .context("HEAD does not point at a commit")?;

        let branch = self
            .repository
            .refs()
            .head_branch_name()?
            .unwrap_or_else(|| "(no branch)".to_string());
        let base_message = format!(
            "{}: {} {}",
            branch,
            base_oid.to_short_oid(),
            base_commit.short_message()
        );

        self.ensure_there_are_changes_to_stash(base_commit.tree_oid(), flags)?;

        let i_tree = self
            .repository
            .index()?
            .write_tree(self.repository.database())?;
        let i_commit_oid = self.commit_snapshot(
            stasher,
            vec![base_oid.clone()],
            i_tree.clone(),
            format!("index on {}\n", base_message),
        )?;

        let u_commit_oid = if flags
            .intersects(StashFlags::INCLUDE_UNTRACKED | StashFlags::INCLUDE_IGNORED)
        {
            Some(self.commit_untracked(stasher, &base_message, &i_tree, flags)?)
        } else {
            None
        };

        let w_message = match message {
            None => format!("WIP on {}", base_message),
            Some(message) => format!("On {}: {}", branch, message),
        };
        let w_commit_oid = self.commit_worktree(
            stasher,
            &w_message,
            &base_oid,
            base_commit.tree_oid(),
            &i_commit_oid,
            u_commit_oid.as_ref(),
        )?;

        self.update_reflog(stasher, &w_commit_oid, w_message.trim_end())?;

        if !flags.contains(StashFlags::KEEP_INDEX) {
            self.repository
                .index_mut()?
                .read_tree(self.repository.database(), base_commit.tree_oid())?;
        }

        Ok(w_commit_oid)
    }

    /// Iterate saved states, newest first
    ///
    /// The callback receives the position, the reflog message, and the
    /// stash commit id. Returning `false` stops the iteration with a
    /// user-abort error.
    pub fn foreach(
        &self,
        mut callback: impl FnMut(usize, &str, &ObjectId) -> bool,
    ) -> anyhow::Result<()> {
        let entries = self.repository.refs().read_reflog(STASH_REF_NAME)?;

        for (position, entry) in entries.iter().rev().enumerate() {
            if !callback(position, &entry.message, &entry.new_oid) {
                return Err(DiffError::UserAbort.into());
            }
        }

        Ok(())
    }

    /// Remove the saved state at `position` (0 = newest)
    ///
    /// Deletes the stash reference when the last entry goes; otherwise the
    /// reference is repointed at the newest remaining state.
    pub fn drop(&self, position: usize) -> anyhow::Result<()> {
        let mut entries = self.repository.refs().read_reflog(STASH_REF_NAME)?;

        if entries.is_empty() {
            anyhow::bail!("Reference {} not found", STASH_REF_NAME);
        }

        let max = entries.len();
        if position > max - 1 {
            anyhow::bail!("No stashed state at position {}", position);
        }

        entries.remove(max - position - 1);
        self.repository
            .refs()
            .write_reflog(STASH_REF_NAME, &entries)?;

        match entries.last() {
            None => self.repository.refs().delete_ref(STASH_REF_NAME)?,
            Some(newest) => self
                .repository
                .refs()
                .update_ref(STASH_REF_NAME, &newest.new_oid)?,
        }

        Ok(())
    }

    fn ensure_non_bare_repository(&self) -> anyhow::Result<()> {
        if self.repository.is_bare() {
            anyhow::bail!(
                "Cannot stash changes - Stash related operations require a working directory."
            );
        }

        Ok(())
    }

    fn ensure_there_are_changes_to_stash(
        &self,
        head_tree: &ObjectId,
        flags: StashFlags,
    ) -> anyhow::Result<()> {
        let staged = diff::index_to_tree(
            self.repository,
            Some(head_tree),
            None,
            &DiffOptions::default(),
        )?;
        let unstaged = diff::workdir_to_index(
            self.repository,
            None,
            &Self::workdir_diff_options(flags),
        )?;

        if staged.is_empty() && unstaged.is_empty() {
            anyhow::bail!("Cannot stash changes - There is nothing to stash.");
        }

        Ok(())
    }

    fn workdir_diff_options(flags: StashFlags) -> DiffOptions {
        let mut opts = DiffOptions::default();

        if flags.contains(StashFlags::INCLUDE_UNTRACKED) {
            opts.flags |= DiffFlags::INCLUDE_UNTRACKED | DiffFlags::RECURSE_UNTRACKED_DIRS;
        }
        if flags.contains(StashFlags::INCLUDE_IGNORED) {
            opts.flags |= DiffFlags::INCLUDE_IGNORED;
        }

        opts
    }

    /// Collect untracked (and optionally ignored) files into a parentless
    /// commit
    fn commit_untracked(
        &self,
        stasher: &Author,
        base_message: &str,
        i_tree: &ObjectId,
        flags: StashFlags,
    ) -> anyhow::Result<ObjectId> {
        let diff_list = diff::workdir_to_tree(
            self.repository,
            Some(i_tree),
            &Self::workdir_diff_options(flags),
        )?;

        let mut untracked_index = Index::new();

        for delta in diff_list.deltas() {
            let wanted = match delta.status {
                DeltaStatus::Untracked => flags.contains(StashFlags::INCLUDE_UNTRACKED),
                DeltaStatus::Ignored => flags.contains(StashFlags::INCLUDE_IGNORED),
                _ => false,
            };

            // directory deltas carry no content of their own
            if wanted && !delta.new.path.ends_with('/') {
                untracked_index.add_from_workdir(
                    self.repository.workspace(),
                    self.repository.database(),
                    Path::new(&*delta.new.path),
                )?;
            }
        }

        let u_tree = untracked_index.write_tree(self.repository.database())?;

        self.commit_snapshot(
            stasher,
            Vec::new(),
            u_tree,
            format!("untracked files on {}\n", base_message),
        )
    }

    /// Replay the staged and unstaged deltas onto the index state and
    /// commit the result
    fn commit_worktree(
        &self,
        stasher: &Author,
        message: &str,
        base_oid: &ObjectId,
        base_tree: &ObjectId,
        i_commit_oid: &ObjectId,
        u_commit_oid: Option<&ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let staged = diff::index_to_tree(
            self.repository,
            Some(base_tree),
            None,
            &DiffOptions::default(),
        )?;
        let unstaged =
            diff::workdir_to_index(self.repository, None, &DiffOptions::default())?;

        let mut w_index = self.repository.index()?.clone();
        self.apply_changes_to_index(&mut w_index, staged.deltas())?;
        self.apply_changes_to_index(&mut w_index, unstaged.deltas())?;

        let w_tree = w_index.write_tree(self.repository.database())?;

        let mut parents = vec![base_oid.clone(), i_commit_oid.clone()];
        if let Some(u_commit_oid) = u_commit_oid {
            parents.push(u_commit_oid.clone());
        }

        self.commit_snapshot(stasher, parents, w_tree, message.to_string())
    }

    fn apply_changes_to_index(&self, index: &mut Index, deltas: &[Delta]) -> anyhow::Result<()> {
        for delta in deltas {
            match delta.status {
                DeltaStatus::Added | DeltaStatus::Modified => index.add_from_workdir(
                    self.repository.workspace(),
                    self.repository.database(),
                    Path::new(&*delta.new.path),
                )?,
                DeltaStatus::Deleted => index.remove(Path::new(&*delta.new.path)),
                _ => {}
            }
        }

        Ok(())
    }

    fn commit_snapshot(
        &self,
        stasher: &Author,
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        message: String,
    ) -> anyhow::Result<ObjectId> {
        let commit = Commit::new(parents, tree_oid, stasher.clone(), message);
        let commit_oid = commit.object_id()?;

        self.repository.database().store(commit)?;

        Ok(commit_oid)
    }

    fn update_reflog(
        &self,
        stasher: &Author,
        w_commit_oid: &ObjectId,
        message: &str,
    ) -> anyhow::Result<()> {
        let old_oid = self
            .repository
            .refs()
            .read_ref(STASH_REF_NAME)?
            .unwrap_or_else(ObjectId::zero);

        self.repository
            .refs()
            .update_ref(STASH_REF_NAME, w_commit_oid)?;
        self.repository.refs().append_reflog(
            STASH_REF_NAME,
            &ReflogEntry::new(
                old_oid,
                w_commit_oid.clone(),
                stasher.clone(),
                message.to_string(),
            ),
        )?;

        Ok(())
    }
}
