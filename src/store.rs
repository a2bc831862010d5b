use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FilterError;

/// The host's key/value preference store.
///
/// Values are plain strings; the registry does its own encoding on top.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError>;

    /// Write several keys, all or nothing. On failure every key already
    /// written goes back to its previous value, or is removed if it had none.
    fn set_all(&mut self, pairs: &[(&str, &str)]) -> Result<(), FilterError> {
        let mut written: Vec<(&str, Option<String>)> = Vec::with_capacity(pairs.len());
        for &(key, value) in pairs {
            let previous = self.get(key);
            if let Err(e) = self.set(key, value) {
                for (key, previous) in written.into_iter().rev() {
                    // Best effort: the store just failed once already.
                    let _ = match previous {
                        Some(old) => self.set(key, &old),
                        None => self.remove(key),
                    };
                }
                return Err(e);
            }
            written.push((key, previous));
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), FilterError>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), FilterError> {
        self.values.remove(key);
        Ok(())
    }
}

/// A flat `key = "value"` TOML file, rewritten whole on every `set`.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlFileStore {
    /// Open the file at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FilterError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "opened preference file");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), FilterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = toml::to_string(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl PreferenceStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        self.set_all(&[(key, value)])
    }

    /// One file write for the whole batch; memory is restored if it fails.
    fn set_all(&mut self, pairs: &[(&str, &str)]) -> Result<(), FilterError> {
        let snapshot = self.values.clone();
        for &(key, value) in pairs {
            self.values.insert(key.to_string(), value.to_string());
        }
        self.flush().inspect_err(|_| self.values = snapshot)
    }

    fn remove(&mut self, key: &str) -> Result<(), FilterError> {
        let Some(previous) = self.values.remove(key) else {
            return Ok(());
        };
        self.flush().inspect_err(|_| {
            self.values.insert(key.to_string(), previous);
        })
    }
}
