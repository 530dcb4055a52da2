//! References and reflogs
//!
//! References are human-readable names pointing to commits, stored as text
//! files under `.git`. HEAD is a symbolic reference pointing at the current
//! branch (or directly at a commit when detached).
//!
//! The stash keeps its state under a dedicated reference (`refs/stash`)
//! whose reflog records one entry per stashed state, newest last in the
//! file and iterated newest first by consumers.
//!
//! ## File Format
//!
//! References contain either a 40-character SHA-1 hash or `ref: <path>` for
//! symbolic references. Reflog lines are
//! `<old-oid> <new-oid> <author>\t<message>`.

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Reference holding the stash states
pub const STASH_REF_NAME: &str = "refs/stash";

const REFS_HEADS_DIR: &str = "refs/heads/";
const SYMREF_PREFIX: &str = "ref: ";
const LOGS_DIR: &str = "logs";

/// One recorded transition of a reference
#[derive(Debug, Clone, new)]
pub struct ReflogEntry {
    pub old_oid: ObjectId,
    pub new_oid: ObjectId,
    pub author: Author,
    pub message: String,
}

impl ReflogEntry {
    fn format_line(&self) -> String {
        format!(
            "{} {} {}\t{}\n",
            self.old_oid, self.new_oid, self.author.display(), self.message
        )
    }

    fn parse_line(line: &str) -> anyhow::Result<Self> {
        let (head, message) = line
            .split_once('\t')
            .ok_or_else(|| anyhow::anyhow!("Malformed reflog line: {}", line))?;

        let mut parts = head.splitn(3, ' ');
        let old_oid = ObjectId::try_parse(
            parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("Malformed reflog line: {}", line))?
                .to_string(),
        )?;
        let new_oid = ObjectId::try_parse(
            parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("Malformed reflog line: {}", line))?
                .to_string(),
        )?;
        let author = Author::try_from(
            parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("Malformed reflog line: {}", line))?,
        )?;

        Ok(ReflogEntry::new(old_oid, new_oid, author, message.to_string()))
    }
}

/// Reference manager
///
/// Handles reading and writing references and reflogs.
/// Provides safe concurrent access through file locking.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

impl Refs {
    /// Create the initial reference layout: HEAD pointing at master
    pub fn init(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.path.join(REFS_HEADS_DIR))?;

        let head_path = self.head_path();
        if !head_path.exists() {
            std::fs::write(&head_path, format!("{}refs/heads/master\n", SYMREF_PREFIX))?;
        }

        Ok(())
    }

    /// Resolve HEAD to a commit id, if any commit exists yet
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.read_raw(HEAD_REF_NAME)? {
            None => Ok(None),
            Some(raw) => match raw.strip_prefix(SYMREF_PREFIX) {
                Some(target) => self.read_ref(target.trim()),
                None => Ok(Some(ObjectId::try_parse(raw.trim().to_string())?)),
            },
        }
    }

    /// The branch HEAD points at, or None when detached
    pub fn head_branch_name(&self) -> anyhow::Result<Option<String>> {
        match self.read_raw(HEAD_REF_NAME)? {
            Some(raw) => Ok(raw
                .strip_prefix(SYMREF_PREFIX)
                .map(|target| target.trim())
                .and_then(|target| target.strip_prefix(REFS_HEADS_DIR))
                .map(String::from)),
            None => Ok(None),
        }
    }

    /// Read a reference by its full name (e.g. `refs/stash`)
    pub fn read_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        match self.read_raw(name)? {
            Some(raw) => Ok(Some(ObjectId::try_parse(raw.trim().to_string())?)),
            None => Ok(None),
        }
    }

    /// Point a reference at a commit, creating it if needed
    pub fn update_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.update_ref_file(self.path.join(name), format!("{}\n", oid))
    }

    pub fn delete_ref(&self, name: &str) -> anyhow::Result<()> {
        let ref_path = self.path.join(name);

        if ref_path.exists() {
            std::fs::remove_file(&ref_path)
                .with_context(|| format!("Unable to delete ref {}", name))?;
        }

        Ok(())
    }

    /// Read a reflog, oldest entry first
    ///
    /// A missing reflog yields the empty list.
    pub fn read_reflog(&self, name: &str) -> anyhow::Result<Vec<ReflogEntry>> {
        let log_path = self.reflog_path(name);

        if !log_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&log_path)
            .with_context(|| format!("Unable to read reflog for {}", name))?;

        content
            .lines()
            .filter(|line| !line.is_empty())
            .map(ReflogEntry::parse_line)
            .collect()
    }

    /// Append one entry to a reflog
    pub fn append_reflog(&self, name: &str, entry: &ReflogEntry) -> anyhow::Result<()> {
        let log_path = self.reflog_path(name);

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Unable to open reflog for {}", name))?;
        let mut lock = file_guard::lock(&mut log_file, Lock::Exclusive, 0, 1)?;

        lock.write_all(entry.format_line().as_bytes())?;

        Ok(())
    }

    /// Rewrite a reflog wholesale; an empty list removes the file
    pub fn write_reflog(&self, name: &str, entries: &[ReflogEntry]) -> anyhow::Result<()> {
        let log_path = self.reflog_path(name);

        if entries.is_empty() {
            if log_path.exists() {
                std::fs::remove_file(&log_path)?;
            }
            return Ok(());
        }

        let content = entries
            .iter()
            .map(ReflogEntry::format_line)
            .collect::<String>();

        self.update_ref_file(log_path, content)
    }

    fn read_raw(&self, name: &str) -> anyhow::Result<Option<String>> {
        let ref_path = self.path.join(name);

        if !ref_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&ref_path)
            .with_context(|| format!("Unable to read ref {}", name))?;

        Ok(Some(content))
    }

    fn update_ref_file(&self, path: PathBuf, raw_ref: String) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Unable to open ref file {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        lock.write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    fn reflog_path(&self, name: &str) -> PathBuf {
        self.path.join(LOGS_DIR).join(name)
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }
}
