//! Repository configuration
//!
//! A minimal reader for the ini-style configuration file stored at
//! `.git/config`. The diff engine derives its capability bits from the
//! boolean keys `core.symlinks`, `core.ignorestat`, `core.filemode`, and
//! `core.trustctime`; a missing or unparsable value falls back to the
//! caller-supplied default.

use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

/// Repository configuration values, keyed as `section.name`
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load the configuration from a file
    ///
    /// A missing file yields an empty configuration; every lookup then
    /// resolves to its default.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;

        Ok(Self::parse(&content))
    }

    fn parse(content: &str) -> Self {
        let mut values = HashMap::new();
        let mut section = String::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_lowercase();
            } else if let Some((key, value)) = line.split_once('=') {
                let key = format!("{}.{}", section, key.trim().to_lowercase());
                values.insert(key, value.trim().to_string());
            }
        }

        Config { values }
    }

    /// Look up a boolean key, falling back to `default` when the key is
    /// missing or its value is not a recognized boolean
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key).map(|v| v.to_lowercase()) {
            Some(value) => match value.as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            None => default,
        }
    }

    /// Set a value programmatically, as `section.name`
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_lowercase(), value.to_string());
    }
}
