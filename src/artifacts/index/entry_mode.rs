//! File modes for tree and index entries
//!
//! Five modes exist: regular file, executable file, symbolic link, gitlink
//! (a submodule commit pinned inside a tree), and directory. The diff
//! engine compares modes both exactly (content checks) and by base kind
//! (type-change detection), so both views live here.

#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    Gitlink,
    #[default]
    Directory,
}

/// Base file type of a mode, compared when deciding TYPECHANGE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
    Gitlink,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Gitlink => "160000",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Gitlink => 0o160000,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn from_octal_str(value: &str) -> anyhow::Result<Self> {
        let raw = u32::from_str_radix(value, 8)
            .map_err(|_| anyhow::anyhow!("Invalid octal entry mode: {}", value))?;
        Self::try_from(raw)
    }

    /// The base file type, ignoring permission bits
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryMode::File(_) => EntryKind::File,
            EntryMode::Symlink => EntryKind::Symlink,
            EntryMode::Gitlink => EntryKind::Gitlink,
            EntryMode::Directory => EntryKind::Directory,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, EntryMode::File(_))
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, EntryMode::Symlink)
    }

    pub fn is_gitlink(&self) -> bool {
        matches!(self, EntryMode::Gitlink)
    }

    /// Whether the low permission bits differ between two modes
    ///
    /// Only regular files carry meaningful permission bits; every other
    /// mode has a fixed bit pattern.
    pub fn permissions_differ(&self, other: &EntryMode) -> bool {
        (self.as_u32() & 0o777) != (other.as_u32() & 0o777)
    }

    /// Keep this mode's type but take the permission bits of `other`
    ///
    /// Used on platforms where the executable bit cannot be trusted: the
    /// working-directory mode inherits the staged permissions.
    pub fn with_permissions_of(&self, other: &EntryMode) -> EntryMode {
        match (self, other) {
            (EntryMode::File(_), EntryMode::File(perms)) => EntryMode::File(perms.clone()),
            _ => self.clone(),
        }
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o120000 => Ok(EntryMode::Symlink),
            0o160000 => Ok(EntryMode::Gitlink),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {:o}", mode)),
        }
    }
}

impl From<EntryMode> for u32 {
    fn from(mode: EntryMode) -> Self {
        mode.as_u32()
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "100644" => Ok(EntryMode::File(FileMode::Regular)),
            "100755" => Ok(EntryMode::File(FileMode::Executable)),
            "120000" => Ok(EntryMode::Symlink),
            "160000" => Ok(EntryMode::Gitlink),
            "40000" | "040000" => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {}", value)),
        }
    }
}
