//! Content filter pipeline
//!
//! Before a working-directory file is hashed, its content runs through the
//! to-object-database filter chain, so the computed identity matches what a
//! commit of that file would record. The chain is loaded per path and
//! direction; with no applicable filters it degenerates to a passthrough.

use crate::areas::config::Config;
use std::path::Path;

/// Direction a filter chain runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDirection {
    /// Workdir content on its way into the object database
    ToOdb,
    /// Object content on its way into the working directory
    ToWorkdir,
}

/// A single content filter
pub trait Filter {
    fn apply(&self, path: &Path, data: Vec<u8>) -> anyhow::Result<Vec<u8>>;
}

/// Line-ending normalization (`core.autocrlf`)
///
/// To-ODB direction only: CRLF sequences collapse to LF so content hashes
/// are stable across platforms.
pub struct CrlfFilter;

impl Filter for CrlfFilter {
    fn apply(&self, _path: &Path, data: Vec<u8>) -> anyhow::Result<Vec<u8>> {
        let mut filtered = Vec::with_capacity(data.len());
        let mut bytes = data.iter().peekable();

        while let Some(&byte) = bytes.next() {
            if byte == b'\r' && bytes.peek() == Some(&&b'\n') {
                continue;
            }
            filtered.push(byte);
        }

        Ok(filtered)
    }
}

/// An ordered chain of filters for one path and direction
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Load the filters applicable to a path
    pub fn load(config: &Config, _path: &Path, direction: FilterDirection) -> Self {
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();

        if direction == FilterDirection::ToOdb && config.get_bool("core.autocrlf", false) {
            filters.push(Box::new(CrlfFilter));
        }

        FilterPipeline { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the content through every filter in order
    pub fn apply(&self, path: &Path, data: Vec<u8>) -> anyhow::Result<Vec<u8>> {
        let mut data = data;

        for filter in &self.filters {
            data = filter.apply(path, data)?;
        }

        Ok(data)
    }
}
