//! End-to-end tests of the facade with a stubbed host application.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;
use bsm_api::config::ManagerConfig;
use bsm_api::orchestrator::ScriptOrchestrator;
use bsm_core::error::CoreError;
use bsm_core::scripting::harness::NO_OUTPUT_MESSAGE;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn stub_host(&self, body: &str) -> PathBuf {
        let path = self.path("fake-blender");
        std::fs::write(&path, format!("#!/bin/bash\n{body}")).expect("write stub");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");
        path
    }

    fn config(&self, host: PathBuf, timeout: Duration) -> ManagerConfig {
        ManagerConfig {
            scripts_dir: self.path("repo"),
            blender_path: Some(host),
            execution_timeout: timeout,
            scratch_dir: self.path("scratch"),
        }
    }

    async fn orchestrator(&self, host_body: &str) -> ScriptOrchestrator {
        let host = self.stub_host(host_body);
        ScriptOrchestrator::from_config(&self.config(host, Duration::from_secs(10)))
            .await
            .expect("orchestrator")
    }
}

fn executed_message(name: &str) -> String {
    format!("Script '{name}' executed successfully. Use 'result://{name}' to see the output.")
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_run_saves_captured_output() {
    let fx = Fixture::new();
    let orch = fx
        .orchestrator("printf 'hi\\n\\n' > \"$BSM_OUTPUT_PATH\"\n")
        .await;
    orch.add_script("t1", "print('hi')").await;

    let status = orch.execute_script("t1", None).await;

    assert_eq!(status, executed_message("t1"));
    assert_eq!(orch.get_result("t1").await.unwrap(), "hi\n\n");
    let meta = orch.repo().metadata("t1").await.unwrap();
    assert_eq!(meta.execution_count, 1);
    assert!(meta.last_executed.is_some());
}

#[tokio::test]
async fn host_failure_is_saved_with_diagnostics() {
    let fx = Fixture::new();
    let orch = fx
        .orchestrator("echo -n boom\necho -n trace >&2\nexit 1\n")
        .await;
    orch.add_script("t1", "pass").await;

    let status = orch.execute_script("t1", None).await;

    assert_eq!(status, executed_message("t1"));
    let result = orch.get_result("t1").await.unwrap();
    assert!(result.starts_with(NO_OUTPUT_MESSAGE));
    let tail = &result[result.find("Blender process output:").expect("section")..];
    assert!(tail.contains("boom"));
    assert!(tail.contains("trace"));
    assert_eq!(orch.repo().metadata("t1").await.unwrap().execution_count, 1);
}

#[tokio::test]
async fn timeout_is_saved_and_counted() {
    let fx = Fixture::new();
    let host = fx.stub_host("exec sleep 30\n");
    let orch = ScriptOrchestrator::from_config(&fx.config(host, Duration::from_secs(1)))
        .await
        .unwrap();
    orch.add_script("slow", "pass").await;

    let status = orch.execute_script("slow", None).await;

    assert_eq!(status, executed_message("slow"));
    assert_eq!(
        orch.get_result("slow").await.unwrap(),
        "Script execution timed out after 1 seconds"
    );
    assert_eq!(orch.repo().metadata("slow").await.unwrap().execution_count, 1);
}

#[tokio::test]
async fn missing_blend_file_never_launches_host() {
    let fx = Fixture::new();
    let marker = fx.path("launched");
    let orch = fx
        .orchestrator(&format!("touch '{}'\n", marker.display()))
        .await;
    orch.add_script("t1", "pass").await;
    let missing = fx.path("nowhere.blend");

    orch.execute_script("t1", Some(missing.as_path())).await;

    assert!(!marker.exists());
    assert_eq!(
        orch.get_result("t1").await.unwrap(),
        format!("Error: Blend file not found: {}", missing.display())
    );
}

#[tokio::test]
async fn executing_unknown_script_saves_error_text() {
    let fx = Fixture::new();
    let orch = fx.orchestrator("exit 0\n").await;

    let status = orch.execute_script("ghost", None).await;

    assert_eq!(status, "Error executing script: Script 'ghost' not found");
    assert_eq!(orch.get_result("ghost").await.unwrap(), status);
    assert!(orch.list_scripts().await.is_empty());
}

#[tokio::test]
async fn executing_invalid_name_saves_nothing() {
    let fx = Fixture::new();
    let orch = fx.orchestrator("exit 0\n").await;

    let status = orch.execute_script("../ghost", None).await;

    assert!(status.starts_with("Error executing script: Script name can only contain"));
    let results = std::fs::read_dir(fx.path("repo").join("results")).unwrap();
    assert_eq!(results.count(), 0);
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookups_of_missing_scripts() {
    let fx = Fixture::new();
    let orch = fx.orchestrator("exit 0\n").await;

    let err = orch.get_script("ghost").await.unwrap_err();
    assert_matches!(err.core(), Some(CoreError::NotFound { .. }));
    assert_eq!(
        orch.get_result("ghost").await.unwrap(),
        "No execution results found for script 'ghost'"
    );
}

#[tokio::test]
async fn listing_json_has_flat_entries_in_insertion_order() {
    let fx = Fixture::new();
    let orch = fx.orchestrator("exit 0\n").await;
    orch.add_script("second", "pass").await;
    orch.add_script("first", "pass").await;

    let json: serde_json::Value =
        serde_json::from_str(&orch.list_scripts_json().await.unwrap()).unwrap();

    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "second");
    assert_eq!(entries[1]["name"], "first");
    for entry in entries {
        assert!(entry["created"].is_string());
        assert!(entry["last_modified"].is_string());
        assert!(entry["last_executed"].is_null());
        assert_eq!(entry["execution_count"], 0);
    }
}

#[tokio::test]
async fn host_status_reports_stub_version() {
    let fx = Fixture::new();
    let orch = fx
        .orchestrator("if [ \"$1\" = --version ]; then echo 'Blender 4.1.0'; fi\n")
        .await;

    let status = orch.host_status().await;

    assert!(status.installed);
    assert_eq!(status.detail, "Blender 4.1.0");
}

#[tokio::test]
async fn host_status_reports_missing_host() {
    let fx = Fixture::new();
    let config = fx.config(fx.path("no-such-blender"), Duration::from_secs(5));
    let orch = ScriptOrchestrator::from_config(&config).await.unwrap();

    let status = orch.host_status().await;

    assert!(!status.installed);
    assert!(status.detail.contains("BLENDER_PATH"));
}

#[tokio::test]
async fn repository_persists_between_orchestrators() {
    let fx = Fixture::new();
    {
        let orch = fx.orchestrator("printf done > \"$BSM_OUTPUT_PATH\"\n").await;
        orch.add_script("keep", "pass").await;
        orch.execute_script("keep", None).await;
    }

    let orch = fx.orchestrator("exit 0\n").await;

    assert_eq!(orch.get_script("keep").await.unwrap(), "pass");
    assert_eq!(orch.get_result("keep").await.unwrap(), "done");
    assert_eq!(orch.repo().metadata("keep").await.unwrap().execution_count, 1);
}
