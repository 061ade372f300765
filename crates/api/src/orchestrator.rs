//! Central script orchestrator service.
//!
//! Coordinates the script repository and the execution harness. Lookups
//! return [`AppResult`]; mutating operations and execution always answer
//! with a human-readable status line.

use std::path::Path;

use bsm_core::error::CoreError;
use bsm_core::examples::{ExampleScript, BUILTIN_EXAMPLES};
use bsm_core::scripting::harness::BlenderHarness;
use bsm_core::scripting::host::{HostExecutable, HostStatus};
use bsm_store::models::script::ScriptSummary;
use bsm_store::repositories::ScriptRepo;
use bsm_store::StoreError;

use crate::config::ManagerConfig;
use crate::error::AppResult;

/// Orchestrates script storage and execution in the host application.
///
/// `execute_script` manages the full lifecycle:
/// 1. Load the script body from the repository.
/// 2. Run it through the harness (envelope, timeout, capture, cleanup).
/// 3. Save the result text, which updates the execution metadata.
pub struct ScriptOrchestrator {
    repo: ScriptRepo,
    harness: BlenderHarness,
}

impl ScriptOrchestrator {
    pub fn new(repo: ScriptRepo, harness: BlenderHarness) -> Self {
        Self { repo, harness }
    }

    /// Open the repository and resolve the host named by `config`.
    pub async fn from_config(config: &ManagerConfig) -> AppResult<Self> {
        let repo = ScriptRepo::open(&config.scripts_dir).await?;
        let host = HostExecutable::resolve(config.blender_path.clone()).await;
        let harness = BlenderHarness::new(
            host,
            config.execution_timeout,
            config.scratch_dir.clone(),
        );
        Ok(Self::new(repo, harness))
    }

    pub fn repo(&self) -> &ScriptRepo {
        &self.repo
    }

    pub fn harness(&self) -> &BlenderHarness {
        &self.harness
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub async fn list_scripts(&self) -> Vec<ScriptSummary> {
        self.repo.list().await
    }

    /// The listing as a pretty-printed JSON array.
    pub async fn list_scripts_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.list_scripts().await)?)
    }

    pub async fn get_script(&self, name: &str) -> AppResult<String> {
        Ok(self.repo.get(name).await?)
    }

    /// Latest result text, or a placeholder when the script never ran.
    pub async fn get_result(&self, name: &str) -> AppResult<String> {
        Ok(self.repo.get_result(name).await?)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn add_script(&self, name: &str, content: &str) -> String {
        match self.repo.add(name, content).await {
            Ok(()) => format!("Script '{name}' added successfully"),
            Err(e) => {
                tracing::warn!(script = %name, error = %e, "Failed to add script");
                format!("Error adding script: {e}")
            }
        }
    }

    pub async fn edit_script(&self, name: &str, content: &str) -> String {
        match self.repo.edit(name, content).await {
            Ok(()) => format!("Script '{name}' updated successfully"),
            Err(e) => {
                tracing::warn!(script = %name, error = %e, "Failed to update script");
                format!("Error updating script: {e}")
            }
        }
    }

    pub async fn remove_script(&self, name: &str) -> String {
        match self.repo.remove(name).await {
            Ok(()) => format!("Script '{name}' removed successfully"),
            Err(e) => {
                tracing::warn!(script = %name, error = %e, "Failed to remove script");
                format!("Error removing script: {e}")
            }
        }
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Run a stored script, optionally against an existing blend file.
    ///
    /// Every harness outcome (including timeouts and host failures) is saved
    /// as the result and reported as a successful run; the saved text tells
    /// what happened. If the script cannot be loaded, the error text is saved
    /// in its place unless the name itself is invalid.
    pub async fn execute_script(&self, name: &str, blend_file: Option<&Path>) -> String {
        tracing::info!(script = %name, "Executing script");
        if let Some(file) = blend_file {
            tracing::info!(script = %name, blend_file = %file.display(), "Using blend file");
        }

        let content = match self.repo.get(name).await {
            Ok(content) => content,
            Err(e) => return self.record_failure(name, &e).await,
        };

        let report = self.harness.execute_report(name, &content, blend_file).await;
        tracing::info!(script = %name, outcome = ?report.outcome, "Script execution finished");

        if let Err(e) = self.repo.save_result(name, &report.text).await {
            tracing::error!(script = %name, error = %e, "Failed to save execution result");
            return format!("Error executing script: {e}");
        }

        format!("Script '{name}' executed successfully. Use 'result://{name}' to see the output.")
    }

    async fn record_failure(&self, name: &str, error: &StoreError) -> String {
        let text = format!("Error executing script: {error}");
        tracing::warn!(script = %name, error = %error, "Script could not be executed");

        if !matches!(error, StoreError::Core(CoreError::Validation(_))) {
            if let Err(e) = self.repo.save_result(name, &text).await {
                tracing::error!(script = %name, error = %e, "Failed to save execution error");
            }
        }
        text
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Add every built-in example that is not stored yet.
    ///
    /// Returns each example with its status line.
    pub async fn install_examples(&self) -> Vec<(&'static ExampleScript, String)> {
        let mut installed = Vec::with_capacity(BUILTIN_EXAMPLES.len());
        for example in BUILTIN_EXAMPLES {
            let line = match self.repo.metadata(example.name).await {
                Ok(_) => format!("Script '{}' already installed", example.name),
                Err(_) => self.add_script(example.name, example.content).await,
            };
            installed.push((example, line));
        }
        installed
    }

    /// Check that the resolved host answers `--version`.
    pub async fn host_status(&self) -> HostStatus {
        self.harness.host().verify_installation().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
