//! Per-execution scratch files.
//!
//! A [`ScratchSet`] names the body, envelope and output files of a single
//! execution. Names carry a fresh UUID after the script name, so concurrent
//! runs of the same script never share files. Dropping the set removes
//! whatever files exist; removal failures are logged only.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Scratch files for one execution attempt.
#[derive(Debug)]
pub struct ScratchSet {
    token: String,
    body_path: PathBuf,
    envelope_path: PathBuf,
    output_path: PathBuf,
}

impl ScratchSet {
    /// Reserve paths for a new execution of `script_name` under `dir`.
    ///
    /// Creates `dir` if needed. No files are written yet.
    pub fn allocate(dir: &Path, script_name: &str) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let token = format!("{script_name}-{}", Uuid::new_v4().simple());
        Ok(Self {
            body_path: dir.join(format!("{token}.body.py")),
            envelope_path: dir.join(format!("{token}.py")),
            output_path: dir.join(format!("{token}.out")),
            token,
        })
    }

    /// Unique token shared by all files of this set.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Path of the caller's script body.
    pub fn body_path(&self) -> &Path {
        &self.body_path
    }

    /// Path of the envelope program handed to the host.
    pub fn envelope_path(&self) -> &Path {
        &self.envelope_path
    }

    /// Path the envelope writes captured output to.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn paths(&self) -> [&Path; 3] {
        [&self.body_path, &self.envelope_path, &self.output_path]
    }
}

impl Drop for ScratchSet {
    fn drop(&mut self) {
        for path in self.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to clean up scratch file",
                    );
                }
            }
        }
    }
}
