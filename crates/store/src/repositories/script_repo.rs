//! Repository for script bodies, execution results, and the metadata index.
//!
//! On-disk layout under the repository root:
//!
//! ```text
//! <root>/scripts/<name>.py      script body
//! <root>/results/<name>.txt     latest execution result
//! <root>/metadata.json          name -> ScriptMetadata, insertion order
//! ```
//!
//! The in-memory index is the single owner of the metadata. Every mutation
//! holds the index lock for its whole read-modify-write cycle, rewrites the
//! complete document (temp file + rename), and only then replaces the
//! in-memory copy.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bsm_core::error::CoreError;
use bsm_core::naming::validate_script_name;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::models::script::{MetadataIndex, ScriptMetadata, ScriptSummary};

const SCRIPTS_SUBDIR: &str = "scripts";
const RESULTS_SUBDIR: &str = "results";
const METADATA_FILE: &str = "metadata.json";
const SCRIPT_EXTENSION: &str = "py";
const RESULT_EXTENSION: &str = "txt";

/// File-backed script repository.
#[derive(Debug)]
pub struct ScriptRepo {
    root: PathBuf,
    scripts_dir: PathBuf,
    results_dir: PathBuf,
    metadata_path: PathBuf,
    index: Mutex<MetadataIndex>,
}

impl ScriptRepo {
    /// Open (or create) a repository rooted at `root`.
    ///
    /// A missing index starts empty. An unreadable or malformed index is
    /// reset to empty and the empty document is written back immediately;
    /// bodies it described become orphans, which are logged.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let scripts_dir = root.join(SCRIPTS_SUBDIR);
        let results_dir = root.join(RESULTS_SUBDIR);
        let metadata_path = root.join(METADATA_FILE);

        for dir in [&root, &scripts_dir, &results_dir] {
            fs::create_dir_all(dir).await.map_err(StoreError::io(dir))?;
        }

        let index = load_index(&metadata_path).await?;

        let repo = Self {
            root,
            scripts_dir,
            results_dir,
            metadata_path,
            index: Mutex::new(index),
        };

        let orphans = repo.orphaned_scripts().await?;
        if !orphans.is_empty() {
            tracing::warn!(
                count = orphans.len(),
                names = ?orphans,
                "Script bodies without metadata entries; they will not be listed",
            );
        }

        let scripts = repo.index.lock().await.len();
        tracing::info!(root = %repo.root.display(), scripts, "Script repository opened");
        Ok(repo)
    }

    /// All scripts in index order.
    pub async fn list(&self) -> Vec<ScriptSummary> {
        self.index
            .lock()
            .await
            .iter()
            .map(|(name, metadata)| ScriptSummary {
                name: name.clone(),
                metadata: metadata.clone(),
            })
            .collect()
    }

    /// Metadata of one script.
    pub async fn metadata(&self, name: &str) -> StoreResult<ScriptMetadata> {
        let name = validate_script_name(name)?;
        self.index
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::script_not_found(name).into())
    }

    /// Create a new script.
    pub async fn add(&self, name: &str, content: &str) -> StoreResult<()> {
        let name = validate_script_name(name)?;
        let script_path = self.script_path(name);

        let mut index = self.index.lock().await;
        if index.contains_key(name) || exists(&script_path).await? {
            return Err(CoreError::script_exists(name).into());
        }

        fs::write(&script_path, content)
            .await
            .map_err(StoreError::io(&script_path))?;

        let mut next = index.clone();
        next.insert(name.to_string(), ScriptMetadata::new(Utc::now()));
        if let Err(e) = self.persist(&next).await {
            // Keep body and index in agreement.
            remove_if_exists(&script_path).await.ok();
            return Err(e);
        }
        *index = next;

        tracing::info!(script = %name, "Script added");
        Ok(())
    }

    /// Replace the body of an existing script.
    pub async fn edit(&self, name: &str, content: &str) -> StoreResult<()> {
        let name = validate_script_name(name)?;
        let script_path = self.script_path(name);

        let mut index = self.index.lock().await;
        if !index.contains_key(name) {
            return Err(CoreError::script_not_found(name).into());
        }

        fs::write(&script_path, content)
            .await
            .map_err(StoreError::io(&script_path))?;

        let mut next = index.clone();
        if let Some(meta) = next.get_mut(name) {
            meta.last_modified = Utc::now();
        }
        self.persist(&next).await?;
        *index = next;

        tracing::info!(script = %name, "Script updated");
        Ok(())
    }

    /// Body of a script.
    pub async fn get(&self, name: &str) -> StoreResult<String> {
        let name = validate_script_name(name)?;
        let script_path = self.script_path(name);
        match fs::read_to_string(&script_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::script_not_found(name).into())
            }
            Err(e) => Err(StoreError::io(&script_path)(e)),
        }
    }

    /// Delete a script's body, result, and metadata entry.
    pub async fn remove(&self, name: &str) -> StoreResult<()> {
        let name = validate_script_name(name)?;

        let mut index = self.index.lock().await;
        if !index.contains_key(name) {
            return Err(CoreError::script_not_found(name).into());
        }

        remove_if_exists(&self.script_path(name)).await?;
        remove_if_exists(&self.result_path(name)).await?;

        let mut next = index.clone();
        next.shift_remove(name);
        self.persist(&next).await?;
        *index = next;

        tracing::info!(script = %name, "Script removed");
        Ok(())
    }

    /// Store `text` as the latest result of `name`.
    ///
    /// The result is written even if the script has no metadata entry
    /// (e.g. it was removed while executing). When an entry exists, its
    /// `last_executed` and `execution_count` are updated.
    pub async fn save_result(&self, name: &str, text: &str) -> StoreResult<()> {
        let name = validate_script_name(name)?;
        let result_path = self.result_path(name);

        let mut index = self.index.lock().await;

        fs::write(&result_path, text)
            .await
            .map_err(StoreError::io(&result_path))?;

        if !index.contains_key(name) {
            tracing::debug!(script = %name, "Result saved for script without metadata");
            return Ok(());
        }

        let mut next = index.clone();
        if let Some(meta) = next.get_mut(name) {
            meta.record_execution(Utc::now());
        }
        self.persist(&next).await?;
        *index = next;

        tracing::debug!(script = %name, bytes = text.len(), "Result saved");
        Ok(())
    }

    /// Latest result of `name`, or a placeholder when it never ran.
    pub async fn get_result(&self, name: &str) -> StoreResult<String> {
        let name = validate_script_name(name)?;
        let result_path = self.result_path(name);
        match fs::read_to_string(&result_path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(no_results_message(name)),
            Err(e) => Err(StoreError::io(&result_path)(e)),
        }
    }

    /// Names of script bodies on disk that have no metadata entry.
    pub async fn orphaned_scripts(&self) -> StoreResult<Vec<String>> {
        let index = self.index.lock().await;
        let mut orphans = Vec::new();

        let mut entries = fs::read_dir(&self.scripts_dir)
            .await
            .map_err(StoreError::io(&self.scripts_dir))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StoreError::io(&self.scripts_dir))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !index.contains_key(stem) {
                    orphans.push(stem.to_string());
                }
            }
        }

        orphans.sort();
        Ok(orphans)
    }

    fn script_path(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(format!("{name}.{SCRIPT_EXTENSION}"))
    }

    fn result_path(&self, name: &str) -> PathBuf {
        self.results_dir.join(format!("{name}.{RESULT_EXTENSION}"))
    }

    async fn persist(&self, index: &MetadataIndex) -> StoreResult<()> {
        write_index(&self.metadata_path, index).await
    }
}

/// Placeholder returned by [`ScriptRepo::get_result`] for scripts that never ran.
pub fn no_results_message(name: &str) -> String {
    format!("No execution results found for script '{name}'")
}

/// Load the index, resetting it when missing, unreadable, or malformed.
async fn load_index(path: &Path) -> StoreResult<MetadataIndex> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let index = MetadataIndex::new();
            write_index(path, &index).await?;
            return Ok(index);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Metadata index unreadable; resetting");
            return reset_index(path).await;
        }
    };

    match serde_json::from_str::<MetadataIndex>(&raw) {
        Ok(index) => Ok(index),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Metadata index malformed; resetting");
            reset_index(path).await
        }
    }
}

/// Replace the index with an empty one. A directory squatting on the index
/// path is renamed to `metadata.json.corrupt-<timestamp>`, never deleted.
async fn reset_index(path: &Path) -> StoreResult<MetadataIndex> {
    if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
        let aside = corrupt_path(path);
        fs::rename(path, &aside).await.map_err(StoreError::io(path))?;
        tracing::warn!(
            path = %path.display(),
            moved_to = %aside.display(),
            "Moved unreadable index aside",
        );
    }
    let index = MetadataIndex::new();
    write_index(path, &index).await?;
    Ok(index)
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
    PathBuf::from(name)
}

/// Write the whole index to a sibling temp file, sync it, and rename it
/// over `path`.
async fn write_index(path: &Path, index: &MetadataIndex) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(index)?;
    let tmp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(StoreError::io(&tmp_path))?;
    file.write_all(json.as_bytes())
        .await
        .map_err(StoreError::io(&tmp_path))?;
    file.sync_all().await.map_err(StoreError::io(&tmp_path))?;
    drop(file);

    fs::rename(&tmp_path, path)
        .await
        .map_err(StoreError::io(path))
}

async fn exists(path: &Path) -> StoreResult<bool> {
    fs::try_exists(path).await.map_err(StoreError::io(path))
}

async fn remove_if_exists(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path)(e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
