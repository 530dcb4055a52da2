//! Blob object
//!
//! A blob is raw content addressed by its hash; the name and mode live in
//! the tree that references it. The engine creates blobs in two places:
//! staging a working-directory file stores one, and a symlink is stored
//! as a blob holding its link target. Reading blobs back is never needed
//! here, so only the serialization direction exists.

use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;

/// Blob object holding one file's content
#[derive(Debug, Clone, new)]
pub struct Blob {
    content: String,
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());

        let mut blob_bytes = Vec::with_capacity(header.len() + self.content.len());
        blob_bytes.extend_from_slice(header.as_bytes());
        blob_bytes.extend_from_slice(self.content.as_bytes());

        Ok(Bytes::from(blob_bytes))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        self.content.clone()
    }
}
