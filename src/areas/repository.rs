//! Repository abstraction and coordination
//!
//! This module provides the main `Repository` type that coordinates all
//! repository operations. It acts as a facade over the lower-level
//! components (config, database, index, workspace, refs, submodules) that
//! the diff engine and the stash composer consume.
//!
//! ## Architecture
//!
//! The repository maintains references to:
//! - Config: Boolean settings that become diff capability bits
//! - Database: Object storage (blobs, trees, commits)
//! - Index: Staging area for tracking changes
//! - Workspace: Working directory operations
//! - Refs: Reference and reflog management
//! - Submodules: Status registry for gitlink entries

use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::filters::{FilterDirection, FilterPipeline};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::submodule::Submodules;
use anyhow::Context;
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Git directory name
const GIT_DIR: &str = ".git";

/// Object database directory name
const DATABASE_DIR: &str = "objects";

/// Config file name
const CONFIG_FILE: &str = "config";

/// Repository
///
/// Coordinates access to the storage areas. This is the handle every diff
/// operation and the stash composer take.
pub struct Repository {
    /// Repository root path
    path: Box<Path>,
    /// Repository configuration
    config: Config,
    /// Staging area with interior mutability for callers that rebuild it
    index: RefCell<Index>,
    /// Object database
    database: Database,
    /// Working directory
    workspace: Workspace,
    /// Reference manager
    refs: Refs,
    /// Submodule status registry
    submodules: Submodules,
}

impl Repository {
    /// Open an existing repository
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("Invalid repository path {}", path.display()))?;

        if !path.join(GIT_DIR).exists() {
            anyhow::bail!("Not a repository: {}", path.display());
        }

        let config = Config::load(&path.join(GIT_DIR).join(CONFIG_FILE))?;
        let database = Database::new(path.join(GIT_DIR).join(DATABASE_DIR).into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(path.join(GIT_DIR).into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            config,
            index: RefCell::new(Index::new()),
            database,
            workspace,
            refs,
            submodules: Submodules::default(),
        })
    }

    /// Create the repository layout at `path`, then open it
    pub fn init(path: PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        let git_dir = path.join(GIT_DIR);
        std::fs::create_dir_all(git_dir.join(DATABASE_DIR))?;

        Refs::new(git_dir.into_boxed_path()).init()?;

        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn submodules(&self) -> &Submodules {
        &self.submodules
    }

    pub fn submodules_mut(&mut self) -> &mut Submodules {
        &mut self.submodules
    }

    /// Borrow the current index
    pub fn index(&self) -> anyhow::Result<Ref<'_, Index>> {
        self.index
            .try_borrow()
            .map_err(|_| anyhow::anyhow!("Index is already borrowed mutably"))
    }

    /// Borrow the current index mutably
    pub fn index_mut(&self) -> anyhow::Result<RefMut<'_, Index>> {
        self.index
            .try_borrow_mut()
            .map_err(|_| anyhow::anyhow!("Index is already borrowed"))
    }

    /// Load the filter chain for a path and direction
    pub fn filters(&self, path: &Path, direction: FilterDirection) -> FilterPipeline {
        FilterPipeline::load(&self.config, path, direction)
    }

    /// Whether the working directory compares paths case-insensitively
    pub fn workdir_ignore_case(&self) -> bool {
        self.config.get_bool("core.ignorecase", false)
    }

    /// Whether the repository has no working directory (`core.bare`)
    ///
    /// Operations that need a working tree, like the stash, refuse to run
    /// on bare repositories.
    pub fn is_bare(&self) -> bool {
        self.config.get_bool("core.bare", false)
    }

    /// The commit HEAD currently points at, if any
    pub fn head_commit(&self) -> anyhow::Result<Option<Commit>> {
        match self.refs.read_head()? {
            Some(oid) => self.database.parse_object_as_commit(&oid),
            None => Ok(None),
        }
    }
}
