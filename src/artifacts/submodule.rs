//! Submodule status inspection
//!
//! A gitlink entry pins another repository's commit inside a tree. When the
//! diff engine meets a gitlink whose working-directory identity is unknown,
//! it consults the submodule registry: the submodule's ignore policy and
//! status decide whether the entry counts as modified, and the submodule's
//! checked-out commit supplies the substitute identity for the delta.

use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use derive_new::new;
use std::collections::HashMap;

bitflags! {
    /// Change indicators reported for a submodule
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SubmoduleStatus: u32 {
        /// The checked-out commit differs from the one recorded in the index
        const WD_MODIFIED = 0b0001;
        /// The submodule's own index has staged changes
        const WD_INDEX_MODIFIED = 0b0010;
        /// The submodule's working tree has unstaged changes
        const WD_WT_MODIFIED = 0b0100;
        /// The submodule's working tree has untracked files
        const WD_UNTRACKED = 0b1000;
    }
}

impl SubmoduleStatus {
    pub fn is_unmodified(&self) -> bool {
        !self.intersects(
            SubmoduleStatus::WD_MODIFIED
                | SubmoduleStatus::WD_INDEX_MODIFIED
                | SubmoduleStatus::WD_WT_MODIFIED
                | SubmoduleStatus::WD_UNTRACKED,
        )
    }
}

/// How much of a submodule's state the diff should look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmoduleIgnore {
    /// Consider every kind of change
    #[default]
    None,
    /// Ignore untracked files inside the submodule
    Untracked,
    /// Ignore all working-tree changes, only compare commits
    Dirty,
    /// Never consider the submodule changed
    All,
}

/// One configured submodule
#[derive(Debug, Clone, new)]
pub struct Submodule {
    path: String,
    ignore: SubmoduleIgnore,
    status: SubmoduleStatus,
    workdir_oid: Option<ObjectId>,
}

impl Submodule {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ignore(&self) -> SubmoduleIgnore {
        self.ignore
    }

    pub fn status(&self) -> SubmoduleStatus {
        self.status
    }

    /// The commit currently checked out in the submodule's working tree
    pub fn workdir_oid(&self) -> Option<&ObjectId> {
        self.workdir_oid.as_ref()
    }
}

/// Registry of the repository's configured submodules
#[derive(Debug, Default)]
pub struct Submodules {
    entries: HashMap<String, Submodule>,
}

impl Submodules {
    pub fn register(&mut self, submodule: Submodule) {
        self.entries.insert(submodule.path.clone(), submodule);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Look up a submodule by its path
    ///
    /// Fails when the path has never been configured; callers decide
    /// whether that is fatal or a tolerable transient state.
    pub fn lookup(&self, path: &str) -> anyhow::Result<&Submodule> {
        self.entries
            .get(path)
            .ok_or_else(|| anyhow::anyhow!("Submodule '{}' has not been configured", path))
    }
}
