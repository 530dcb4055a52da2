//! Diff options and capability resolution
//!
//! User-facing options select which delta kinds are emitted and how the
//! merge-join behaves; capability bits describe what the platform and
//! repository configuration allow the classifier to trust. Options are
//! normalized once at DiffList construction and immutable afterwards.

use crate::areas::config::Config;
use crate::artifacts::diff::delta::DeltaStatus;
use bitflags::bitflags;

bitflags! {
    /// Behavior flags for a diff build
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DiffFlags: u32 {
        /// Swap old/new at delta construction
        const REVERSE = 1 << 0;
        /// Emit UNMODIFIED deltas
        const INCLUDE_UNMODIFIED = 1 << 1;
        /// Emit IGNORED deltas
        const INCLUDE_IGNORED = 1 << 2;
        /// Emit UNTRACKED deltas
        const INCLUDE_UNTRACKED = 1 << 3;
        /// Emit TYPECHANGE instead of a split DELETED+ADDED pair
        const INCLUDE_TYPECHANGE = 1 << 4;
        /// Also emit TYPECHANGE when a file becomes a directory
        /// (implies INCLUDE_TYPECHANGE)
        const INCLUDE_TYPECHANGE_TREES = 1 << 5;
        /// Descend into untracked directories
        const RECURSE_UNTRACKED_DIRS = 1 << 6;
        /// Treat submodule changes as UNMODIFIED
        const IGNORE_SUBMODULES = 1 << 7;
        /// Do not trust the executable bit
        const IGNORE_FILEMODE = 1 << 8;
        /// Bypass glob matching, use literal prefix only
        const DISABLE_PATHSPEC_MATCH = 1 << 9;
        /// Deltas are stored sorted case-insensitively
        const DELTAS_ARE_ICASE = 1 << 10;
    }
}

bitflags! {
    /// What the platform and configuration allow the classifier to trust
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DiffCaps: u32 {
        /// The filesystem supports symbolic links
        const HAS_SYMLINKS = 1 << 0;
        /// Stat info is unreliable; entries are assumed unchanged
        const ASSUME_UNCHANGED = 1 << 1;
        /// The executable bit is meaningful
        const TRUST_MODE_BITS = 1 << 2;
        /// Change times are meaningful
        const TRUST_CTIME = 1 << 3;
        /// Device ids are stable enough to compare
        const USE_DEV = 1 << 4;
    }
}

impl DiffCaps {
    /// Derive capability bits from repository configuration
    ///
    /// `IGNORE_FILEMODE` clears mode-bit trust regardless of what the
    /// configuration says. USE_DEV is a compile-time switch in core git
    /// and is never derived from configuration.
    pub fn from_config(config: &Config, flags: DiffFlags) -> Self {
        let mut caps = DiffCaps::empty();

        if config.get_bool("core.symlinks", true) {
            caps |= DiffCaps::HAS_SYMLINKS;
        }
        if config.get_bool("core.ignorestat", false) {
            caps |= DiffCaps::ASSUME_UNCHANGED;
        }
        if config.get_bool("core.filemode", true) {
            caps |= DiffCaps::TRUST_MODE_BITS;
        }
        if config.get_bool("core.trustctime", true) {
            caps |= DiffCaps::TRUST_CTIME;
        }

        if flags.contains(DiffFlags::IGNORE_FILEMODE) {
            caps.remove(DiffCaps::TRUST_MODE_BITS);
        }

        caps
    }
}

/// Options for one diff build
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub flags: DiffFlags,
    /// Display prefix for the old side; defaults to `a/`
    pub old_prefix: Option<String>,
    /// Display prefix for the new side; defaults to `b/`
    pub new_prefix: Option<String>,
    /// Glob patterns restricting the diff
    pub pathspec: Vec<String>,
}

impl DiffOptions {
    pub fn with_flags(flags: DiffFlags) -> Self {
        DiffOptions {
            flags,
            ..Default::default()
        }
    }

    /// Whether a delta of this status is suppressed by the INCLUDE_* flags
    pub fn should_skip(&self, status: DeltaStatus) -> bool {
        match status {
            DeltaStatus::Unmodified => !self.flags.contains(DiffFlags::INCLUDE_UNMODIFIED),
            DeltaStatus::Ignored => !self.flags.contains(DiffFlags::INCLUDE_IGNORED),
            DeltaStatus::Untracked => !self.flags.contains(DiffFlags::INCLUDE_UNTRACKED),
            _ => false,
        }
    }
}
