//! Tree object
//!
//! A tree records one directory level: names mapped to blob, symlink,
//! gitlink, or subtree references. The engine meets trees from both
//! directions. Decoding inflates stored trees into the flat listings the
//! diff sources walk; encoding assembles the hierarchy from staged index
//! entries when the stash composer snapshots a state.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`, each entry `<mode> <name>\0` followed
//! by the 20-byte raw id. Entries are canonically ordered with directory
//! names compared as if they ended in `/`, so `a.txt` sorts before the
//! subtree `a`.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::{EntryKind, EntryMode};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Raw (binary) size of an object id inside a tree entry
const OID_RAW_SIZE: usize = OBJECT_ID_LENGTH / 2;

/// One name inside a tree
///
/// Decoded trees hold only references (subtrees stay unexpanded as
/// directory-mode references); trees under construction hold their
/// subtrees inline so child ids can be computed before the parent's.
#[derive(Debug, Clone)]
enum Node {
    Reference(DatabaseEntry),
    Subtree(Tree),
}

impl Node {
    fn is_directory(&self) -> bool {
        match self {
            Node::Reference(entry) => entry.is_tree(),
            Node::Subtree(_) => true,
        }
    }

    fn mode(&self) -> EntryMode {
        match self {
            Node::Reference(entry) => entry.mode.clone(),
            Node::Subtree(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            Node::Reference(entry) => Ok(entry.oid.clone()),
            Node::Subtree(tree) => tree.object_id(),
        }
    }
}

/// Tree object for one directory level
#[derive(Debug, Clone, Default)]
pub struct Tree {
    entries: BTreeMap<String, Node>,
}

impl Tree {
    /// Assemble a tree hierarchy from staged index entries
    ///
    /// Every `/`-separated path component becomes a subtree level;
    /// conflicting uses of one name as both file and directory are
    /// rejected.
    pub fn build<'e>(entries: impl Iterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let path = entry
                .name
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", entry.name))?;

            root.insert(
                path,
                DatabaseEntry::new(entry.oid.clone(), entry.metadata.mode.clone()),
            )?;
        }

        Ok(root)
    }

    fn insert(&mut self, path: &str, entry: DatabaseEntry) -> anyhow::Result<()> {
        match path.split_once('/') {
            None => {
                if let Some(Node::Subtree(_)) = self.entries.get(path) {
                    anyhow::bail!("'{}' is used as both a file and a directory", path);
                }
                self.entries.insert(path.to_string(), Node::Reference(entry));
                Ok(())
            }
            Some((dir, rest)) => {
                let node = self
                    .entries
                    .entry(dir.to_string())
                    .or_insert_with(|| Node::Subtree(Tree::default()));

                match node {
                    Node::Subtree(subtree) => subtree.insert(rest, entry),
                    Node::Reference(_) => {
                        anyhow::bail!("'{}' is used as both a file and a directory", dir)
                    }
                }
            }
        }
    }

    /// Visit subtrees before their parent (children's ids must exist
    /// before the parent can be stored)
    pub fn traverse<F>(&self, func: &F) -> anyhow::Result<()>
    where
        F: Fn(&Tree) -> anyhow::Result<()>,
    {
        for node in self.entries.values() {
            if let Node::Subtree(subtree) = node {
                subtree.traverse(func)?;
            }
        }

        func(self)
    }

    /// The references of a decoded tree, in name order
    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries
            .into_iter()
            .filter_map(|(name, node)| match node {
                Node::Reference(entry) => Some((name, entry)),
                Node::Subtree(_) => None,
            })
    }

    /// Entries in canonical tree order: directory names compare as if
    /// they carried a trailing `/`
    fn canonical_order(&self) -> Vec<(&String, &Node)> {
        let mut ordered = self.entries.iter().collect::<Vec<_>>();

        ordered.sort_by_key(|(name, node)| {
            let mut key = (*name).clone().into_bytes();
            if node.is_directory() {
                key.push(b'/');
            }
            key
        });

        ordered
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, node) in self.canonical_order() {
            write!(content, "{:o} {}", node.mode().as_u32(), name)?;
            content.push(0);
            node.oid()?.write_h40_to(&mut content)?;
        }

        let mut tree_bytes = Vec::new();
        write!(
            tree_bytes,
            "{} {}\0",
            self.object_type().as_str(),
            content.len()
        )?;
        tree_bytes.extend_from_slice(&content);

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let bytes = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let mut entries = BTreeMap::new();
        let mut rest = bytes.as_slice();

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&byte| byte == b' ')
                .ok_or_else(|| anyhow::anyhow!("Truncated tree entry mode"))?;
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&rest[..space])?)?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&byte| byte == 0)
                .ok_or_else(|| anyhow::anyhow!("Truncated tree entry name"))?;
            let name = std::str::from_utf8(&rest[..nul])?.to_owned();
            rest = &rest[nul + 1..];

            if rest.len() < OID_RAW_SIZE {
                anyhow::bail!("Truncated tree entry id");
            }
            let mut oid_bytes = &rest[..OID_RAW_SIZE];
            let oid = ObjectId::read_h40_from(&mut oid_bytes)?;
            rest = &rest[OID_RAW_SIZE..];

            entries.insert(name, Node::Reference(DatabaseEntry::new(oid, mode)));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.canonical_order()
            .iter()
            .map(|(name, node)| {
                let kind = match node.mode().kind() {
                    EntryKind::Directory => "tree",
                    EntryKind::Gitlink => "commit",
                    _ => "blob",
                };

                format!(
                    "{} {} {}\t{}",
                    node.mode().as_str(),
                    kind,
                    node.oid().unwrap_or_default(),
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
