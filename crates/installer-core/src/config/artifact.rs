//! Configuration values and their INI rendering

use std::fmt;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// A resolved configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(text) => write!(f, "{}", text),
            ConfigValue::Bool(true) => write!(f, "True"),
            ConfigValue::Bool(false) => write!(f, "False"),
        }
    }
}

/// Values grouped by domain, in a fixed domain order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationValues {
    sections: Vec<(String, Vec<(String, ConfigValue)>)>,
}

impl ConfigurationValues {
    /// Empty set whose sections will render in the given order
    pub fn with_domains<'a>(domains: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            sections: domains
                .into_iter()
                .map(|d| (d.to_string(), Vec::new()))
                .collect(),
        }
    }

    pub fn insert(&mut self, domain: &str, key: &str, value: ConfigValue) {
        let index = match self.sections.iter().position(|(d, _)| d == domain) {
            Some(index) => index,
            None => {
                self.sections.push((domain.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };

        let section = &mut self.sections[index].1;
        match section.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => section.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, domain: &str, key: &str) -> Option<&ConfigValue> {
        self.sections
            .iter()
            .find(|(d, _)| d == domain)
            .and_then(|(_, entries)| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Domains holding at least one value
    pub fn domains(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(d, _)| d.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// INI text: one `[DOMAIN]` section per non-empty domain
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (domain, entries) in self.sections.iter().filter(|(_, e)| !e.is_empty()) {
            out.push_str(&format!("[{}]\n", domain));
            for (key, value) in entries {
                out.push_str(&format!("{} = {}\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

/// Staging files currently being written
///
/// A process that exits without unwinding (Ctrl+C) skips the temporary file
/// destructors, so the interrupt handler removes these through
/// [`discard_staging`].
#[derive(Debug, Default)]
pub struct StagingRegistry {
    pending: Mutex<Vec<PathBuf>>,
}

impl StagingRegistry {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, path: &Path) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(path.to_path_buf());
        }
    }

    fn release(&self, path: &Path) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|p| p != path);
        }
    }

    /// Remove every registered staging file, returning how many were removed
    pub fn discard(&self) -> usize {
        let Ok(mut pending) = self.pending.lock() else {
            return 0;
        };
        pending
            .drain(..)
            .filter(|path| fs::remove_file(path).is_ok())
            .count()
    }
}

static STAGING: StagingRegistry = StagingRegistry::new();

/// Remove staging files left by an interrupted [`write_atomic`]
pub fn discard_staging() -> usize {
    STAGING.discard()
}

/// Replace `path` with `contents` in one step
///
/// The text goes to a temporary file next to the destination, is flushed and
/// restricted to the owner, then renamed over the destination. On any failure
/// the destination is left as it was.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    write_atomic_with(&STAGING, path, contents)
}

fn write_atomic_with(registry: &StagingRegistry, path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let staging = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create staging file in {}", parent.display()))?;
    let staged = staging.path().to_path_buf();
    registry.register(&staged);
    let result = fill_and_persist(staging, path, contents);
    registry.release(&staged);
    result
}

fn fill_and_persist(mut staging: NamedTempFile, path: &Path, contents: &str) -> Result<()> {
    staging
        .write_all(contents.as_bytes())
        .context("Failed to write staging file")?;
    staging.as_file().sync_all().context("Failed to flush staging file")?;
    fs::set_permissions(staging.path(), fs::Permissions::from_mode(0o600))
        .context("Failed to restrict staging file permissions")?;

    staging
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
