//! Object database
//!
//! The database stores all objects (blobs, trees, commits) using
//! content-addressable storage. Objects are identified by their SHA-1 hash
//! and stored in a directory structure based on the hash prefix.
//!
//! ## Storage Format
//!
//! Objects are stored as:
//! - Path: `.git/objects/ab/cdef123...` (first 2 chars as directory, rest as filename)
//! - Content: Compressed (zlib) format containing type, size, and data

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Object database
///
/// Manages storage and retrieval of content-addressable objects.
/// All objects are identified by their SHA-1 hash and stored in compressed format.
#[derive(Debug)]
pub struct Database {
    /// Path to the objects directory (typically `.git/objects`)
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Hash raw content as a blob without storing it
    ///
    /// Used by the diff engine to compute the identity of a
    /// working-directory file on demand.
    pub fn hash_blob(data: &[u8]) -> anyhow::Result<ObjectId> {
        let header = format!("blob {}\0", data.len());

        let mut hasher = Sha1::new();
        hasher.update(header.as_bytes());
        hasher.update(data);

        ObjectId::try_parse(format!("{:x}", hasher.finalize()))
    }

    /// Load raw object bytes from the database
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        self.read_object(object_path)
    }

    /// Store an object in the database
    ///
    /// The object is serialized, and its content is written to the appropriate
    /// path based on its SHA-1 hash. If the object already exists, this is a no-op.
    pub fn store(&self, object: impl Object) -> anyhow::Result<()> {
        let object_path = self.path.join(object.object_path()?);
        let object_content = object.serialize()?;

        // write the object to disk unless it already exists
        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .context(format!("Invalid object path {}", object_path.display()))?,
            )
            .context(format!(
                "Unable to create object directory {}",
                object_path.display()
            ))?;

            self.write_object(object_path, object_content)?;
        }

        Ok(())
    }

    /// Parse an object as a Tree, if it is one
    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Parse an object as a Commit, if it is one
    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Inflate a tree into a flat, path-keyed listing
    ///
    /// Recursively expands subtrees so that every blob and gitlink appears
    /// under its full path. A commit id is accepted and resolved to its
    /// tree first. `None` yields the empty listing.
    pub fn load_flat_tree(
        &self,
        object_id: Option<&ObjectId>,
    ) -> anyhow::Result<BTreeMap<String, DatabaseEntry>> {
        let mut flat = BTreeMap::new();

        if let Some(oid) = object_id {
            let tree = self.inflate_oid_to_tree(oid)?;
            self.flatten_tree(tree, "", &mut flat)?;
        }

        Ok(flat)
    }

    fn inflate_oid_to_tree(&self, oid: &ObjectId) -> anyhow::Result<Tree> {
        let (object_type, object_reader) = self.parse_object_as_bytes(oid)?;

        match object_type {
            ObjectType::Tree => Tree::deserialize(object_reader),
            ObjectType::Commit => {
                let commit = Commit::deserialize(object_reader)?;
                self.inflate_oid_to_tree(commit.tree_oid())
            }
            _ => Err(anyhow::anyhow!("Invalid tree object {}", oid)),
        }
    }

    fn flatten_tree(
        &self,
        tree: Tree,
        base: &str,
        flat: &mut BTreeMap<String, DatabaseEntry>,
    ) -> anyhow::Result<()> {
        for (name, entry) in tree.into_entries() {
            let path = if base.is_empty() {
                name
            } else {
                format!("{}/{}", base, name)
            };

            if entry.is_tree() {
                let subtree = self.inflate_oid_to_tree(&entry.oid)?;
                self.flatten_tree(subtree, &path, flat)?;
            } else {
                flat.insert(path, entry);
            }
        }

        Ok(())
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, Cursor<Bytes>)> {
        let object_content = self.load(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::from_header(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_path: PathBuf) -> anyhow::Result<Bytes> {
        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        let object_content = Self::decompress(object_content.into())?;

        Ok(object_content)
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn generate_temp_name() -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);

        format!("tmp_obj_{}_{}", std::process::id(), nanos)
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();

        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(Bytes::from(decompressed_content))
    }
}
