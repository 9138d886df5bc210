//! File-backed preference store.
//!
//! Preferences are a flat JSON object of string values. The whole file is
//! read once on open and rewritten on every `set` through a temporary file
//! and a rename, so a crash mid-write never leaves a truncated file.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use deskchat_core::{PreferenceError, PreferenceStore};

/// [`PreferenceStore`] persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// - `PreferenceError::Unavailable` if the file exists but cannot be read
    /// - `PreferenceError::Corrupt` if it is not a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| PreferenceError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PreferenceError::Unavailable(format!("{}: {e}", path.display()))),
        };
        Ok(Self { path, values })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PreferenceError> {
        let unavailable = |e: io::Error| PreferenceError::Unavailable(format!("{}: {e}", self.path.display()));

        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| PreferenceError::Unavailable(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(unavailable)?;
        fs::rename(&tmp, &self.path).map_err(unavailable)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let previous = self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.values.insert(key.to_string(), old),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
