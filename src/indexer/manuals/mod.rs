
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::BuildError;

/// Manual files found on disk, keyed by canonical model name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualCatalog {
    manuals: BTreeMap<String, PathBuf>,
    collisions: Vec<ManualCollision>,
}

/// A manual whose model name is already taken by an earlier file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualCollision {
    pub name: String,
    pub path: PathBuf,
    pub kept: PathBuf,
}

impl fmt::Display for ManualCollision {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} maps to model '{}', already provided by {}",
            self.path.display(),
            self.name,
            self.kept.display()
        )
    }
}

impl ManualCatalog {
    /// Manual paths by model name, sorted by name
    #[inline]
    pub fn manuals(&self) -> &BTreeMap<String, PathBuf> {
        &self.manuals
    }

    #[inline]
    pub fn collisions(&self) -> &[ManualCollision] {
        &self.collisions
    }

    /// Keep only the manual for `model_name`, if present
    #[inline]
    pub fn select(&self, model_name: &str) -> Self {
        let name = model_name.trim().to_uppercase();
        Self {
            manuals: self
                .manuals
                .get_key_value(&name)
                .map(|(k, v)| (k.clone(), v.clone()))
                .into_iter()
                .collect(),
            collisions: self
                .collisions
                .iter()
                .filter(|c| c.name == name)
                .cloned()
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.manuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.manuals.is_empty()
    }

    /// Add a manual, recording a collision when its model name is already present
    fn add(&mut self, path: PathBuf) {
        let Some(name) = model_name_for(&path) else {
            return;
        };

        if let Some(kept) = self.manuals.get(&name) {
            self.collisions.push(ManualCollision {
                name,
                path,
                kept: kept.clone(),
            });
        } else {
            self.manuals.insert(name, path);
        }
    }
}

impl FromIterator<PathBuf> for ManualCatalog {
    /// Paths are considered in sorted order so the same files always produce the same catalog
    #[inline]
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut paths: Vec<PathBuf> = iter.into_iter().collect();
        paths.sort();

        let mut catalog = Self::default();
        for path in paths {
            catalog.add(path);
        }
        catalog
    }
}

/// Model name for a manual file: its stem, uppercased
#[inline]
pub fn model_name_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.trim();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_uppercase())
    }
}

fn is_manual_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Find the `.txt` manuals in `dir`
#[inline]
pub fn discover_manuals(dir: &Path) -> Result<ManualCatalog, BuildError> {
    if !dir.exists() {
        warn!("Manuals directory {} does not exist", dir.display());
        return Ok(ManualCatalog::default());
    }

    let entries = fs::read_dir(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let catalog: ManualCatalog = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_manual_file(path))
        .collect();

    debug!(
        "Found {} manuals in {} ({} name collisions)",
        catalog.len(),
        dir.display(),
        catalog.collisions().len()
    );
    Ok(catalog)
}
