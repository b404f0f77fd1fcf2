
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{IndexEntry, IndexError, ModelRegistry, VectorIndex};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DOCUMENTS_FILE: &str = "documents.json";
const FORMAT_VERSION: u32 = 1;

/// On-disk home of all named indexes: one directory per canonical model name
#[derive(Debug, Clone)]
pub struct IndexStore {
    base_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    name: String,
    embedding_model: String,
    dimension: usize,
    document_count: usize,
    created_at: DateTime<Utc>,
}

impl IndexStore {
    #[inline]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.base_dir.is_dir()
    }

    #[inline]
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Persist `index` under its name, replacing any existing index with that name.
    ///
    /// Files are written to a hidden temporary directory first and swapped into place, so a
    /// failed build never leaves a half-written index behind.
    #[inline]
    pub fn save(&self, index: &VectorIndex) -> Result<PathBuf, IndexError> {
        let name = index.name();
        validate_index_name(name)?;

        fs::create_dir_all(&self.base_dir).map_err(|source| IndexError::Io {
            path: self.base_dir.clone(),
            source,
        })?;

        let staging = self
            .base_dir
            .join(format!(".{}.tmp-{}", name, Uuid::new_v4().simple()));
        if let Err(e) = write_index_files(&staging, index) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let target = self.index_path(name);
        let replaced = if target.exists() {
            let retired = self
                .base_dir
                .join(format!(".{}.old-{}", name, Uuid::new_v4().simple()));
            fs::rename(&target, &retired).map_err(|source| IndexError::Io {
                path: target.clone(),
                source,
            })?;
            Some(retired)
        } else {
            None
        };

        fs::rename(&staging, &target).map_err(|source| IndexError::Io {
            path: target.clone(),
            source,
        })?;

        if let Some(retired) = replaced {
            info!("Replaced existing index for model {}", name);
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!(
                    "Failed to remove previous index copy {}: {}",
                    retired.display(),
                    e
                );
            }
        }

        info!(
            "Saved index {} ({} documents, {} dimensions) to {}",
            name,
            index.len(),
            index.dimension(),
            target.display()
        );
        Ok(target)
    }

    /// Load the persisted index named `name`
    #[inline]
    pub fn load(&self, name: &str) -> Result<VectorIndex, IndexError> {
        let path = self.index_path(name);
        if validate_index_name(name).is_err() || !path.is_dir() {
            return Err(IndexError::NotFound {
                name: name.to_string(),
                path,
            });
        }

        debug!("Loading index from {}", path.display());

        let manifest: Manifest = read_json(name, &path.join(MANIFEST_FILE))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(corrupt(
                name,
                format!("unsupported format version {}", manifest.format_version),
            ));
        }
        if manifest.name != name {
            debug!(
                "Index directory {} records name {}; using the directory name",
                name, manifest.name
            );
        }

        let entries: Vec<IndexEntry> = read_json(name, &path.join(DOCUMENTS_FILE))?;
        if entries.len() != manifest.document_count {
            return Err(corrupt(
                name,
                format!(
                    "manifest lists {} documents but {} were found",
                    manifest.document_count,
                    entries.len()
                ),
            ));
        }

        let index = VectorIndex::with_created_at(
            name,
            manifest.embedding_model,
            entries,
            manifest.created_at,
        )
        .map_err(|e| match e {
            IndexError::Invalid { reason, .. } => corrupt(name, reason),
            other => other,
        })?;

        if index.dimension() != manifest.dimension {
            return Err(corrupt(
                name,
                format!(
                    "manifest dimension {} does not match stored vectors ({})",
                    manifest.dimension,
                    index.dimension()
                ),
            ));
        }

        Ok(index)
    }

    /// Load every index under the base directory into a registry.
    ///
    /// Each visible subdirectory is one index keyed by its directory name. An index that fails
    /// to load is logged and left out. A missing base directory is created and yields an empty
    /// registry. Only a failure to list the base directory is returned as an error.
    #[inline]
    pub fn load_all(&self) -> Result<ModelRegistry, IndexError> {
        let mut registry = ModelRegistry::new();

        if !self.base_dir.exists() {
            warn!(
                "Index directory not found at {}; starting with no models",
                self.base_dir.display()
            );
            if let Err(e) = fs::create_dir_all(&self.base_dir) {
                warn!(
                    "Could not create index directory {}: {}",
                    self.base_dir.display(),
                    e
                );
            }
            return Ok(registry);
        }

        for name in self.index_directories()? {
            match self.load(&name) {
                Ok(index) => {
                    info!(
                        "Loaded index for model '{}' ({} documents)",
                        name,
                        index.len()
                    );
                    registry.insert(index);
                }
                Err(e) => {
                    error!("Error loading index '{}': {}", name, e);
                }
            }
        }

        info!("Models loaded in memory: {:?}", registry.names());
        Ok(registry)
    }

    /// Sorted names of every entry in the base directory; empty when it does not exist
    #[inline]
    pub fn listing(&self) -> Result<Vec<String>, IndexError> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = self
            .read_base_dir()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn index_directories(&self) -> Result<Vec<String>, IndexError> {
        let mut names = Vec::new();
        for entry in self.read_base_dir()? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry in {}: {}",
                        self.base_dir.display(),
                        e
                    );
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read_base_dir(&self) -> Result<fs::ReadDir, IndexError> {
        fs::read_dir(&self.base_dir).map_err(|source| IndexError::Io {
            path: self.base_dir.clone(),
            source,
        })
    }
}

fn validate_index_name(name: &str) -> Result<(), IndexError> {
    let valid = !name.trim().is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name != "..";
    if valid {
        Ok(())
    } else {
        Err(IndexError::Invalid {
            name: name.to_string(),
            reason: "index names must be non-empty, visible, single path components".to_string(),
        })
    }
}

fn write_index_files(dir: &Path, index: &VectorIndex) -> Result<(), IndexError> {
    fs::create_dir_all(dir).map_err(|source| IndexError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        name: index.name().to_string(),
        embedding_model: index.embedding_model().to_string(),
        dimension: index.dimension(),
        document_count: index.len(),
        created_at: index.created_at(),
    };

    write_json(index.name(), &dir.join(MANIFEST_FILE), &manifest)?;
    write_json(index.name(), &dir.join(DOCUMENTS_FILE), index.entries())
}

fn write_json<T: Serialize + ?Sized>(name: &str, path: &Path, value: &T) -> Result<(), IndexError> {
    let io_error = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer(&mut writer, value).map_err(|source| IndexError::Serialize {
        name: name.to_string(),
        source,
    })?;
    writer.flush().map_err(io_error)
}

fn read_json<T: for<'de> Deserialize<'de>>(name: &str, path: &Path) -> Result<T, IndexError> {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => corrupt(name, format!("missing {}", file_name)),
        _ => corrupt(name, format!("unreadable {}: {}", file_name, e)),
    })?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| corrupt(name, format!("malformed {}: {}", file_name, e)))
}

fn corrupt(name: &str, reason: String) -> IndexError {
    IndexError::Corrupt {
        name: name.to_string(),
        reason,
    }
}
