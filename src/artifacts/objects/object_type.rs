//! Object kinds
//!
//! Every stored object opens with a header declaring its kind and payload
//! size (`<kind> <size>\0`). The database reads the header to pick a
//! deserializer; writers embed it when serializing. Only the three kinds
//! the engine touches exist here: blobs (content), trees (directory
//! snapshots), and commits (the stash triple).

use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Consume an object header, returning the declared kind
    ///
    /// Leaves the reader positioned at the first payload byte. The size
    /// field is skipped; payload length is validated by the deserializer
    /// that follows.
    pub fn from_header(reader: &mut impl BufRead) -> anyhow::Result<ObjectType> {
        let mut kind = Vec::new();
        reader.read_until(b' ', &mut kind)?;
        if kind.pop() != Some(b' ') {
            anyhow::bail!("Truncated object header");
        }

        let mut size = Vec::new();
        reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            anyhow::bail!("Truncated object header");
        }

        match kind.as_slice() {
            b"blob" => Ok(ObjectType::Blob),
            b"tree" => Ok(ObjectType::Tree),
            b"commit" => Ok(ObjectType::Commit),
            other => anyhow::bail!(
                "Unknown object kind: {}",
                String::from_utf8_lossy(other)
            ),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
