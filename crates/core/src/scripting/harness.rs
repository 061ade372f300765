//! Execution harness: runs a script body inside the headless host.
//!
//! Every failure mode is folded into the returned text so the caller always
//! has something to store and show:
//!
//! | Outcome                         | Text                                              |
//! |---------------------------------|---------------------------------------------------|
//! | external file missing           | `Error: Blend file not found: <path>`             |
//! | host exits 0                    | captured output (or [`NO_OUTPUT_MESSAGE`])        |
//! | host exits non-zero             | captured output + host stdout/stderr section      |
//! | timeout                         | `Script execution timed out after <duration>`     |
//! | spawn / scratch I/O failure     | `Error executing script: <error>`                 |

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use super::envelope;
use super::executor::{ScriptError, ScriptInput, ScriptOutput};
use super::host::HostExecutable;
use super::scratch::ScratchSet;
use super::subprocess;

/// Default wall-clock budget for one execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Name of the scratch directory under the OS temp dir.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "blender_mcp";

/// Substituted when the envelope never wrote its output file.
pub const NO_OUTPUT_MESSAGE: &str = "No output captured from script.";

/// Heading of the diagnostic section appended on non-zero host exit.
pub const HOST_OUTPUT_HEADING: &str = "Blender process output:";

/// How an execution attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Host exited with code zero.
    Completed,
    /// Host exited with a non-zero code.
    HostFailure { exit_code: i32 },
    /// Host exceeded the timeout and was killed.
    TimedOut,
    /// The caller's external file does not exist; nothing was launched.
    MissingInputFile,
    /// Scratch files could not be written or the host could not be run.
    LaunchFailed,
}

/// Outcome plus the text to store as the script's result.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub outcome: ExecutionOutcome,
    pub text: String,
}

/// Runs scripts inside the host process.
#[derive(Debug, Clone)]
pub struct BlenderHarness {
    host: HostExecutable,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl BlenderHarness {
    pub fn new(host: HostExecutable, timeout: Duration, scratch_dir: PathBuf) -> Self {
        Self {
            host,
            timeout,
            scratch_dir,
        }
    }

    /// The scratch directory used when none is configured.
    pub fn default_scratch_dir() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME)
    }

    pub fn host(&self) -> &HostExecutable {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Run `content` as script `name`, optionally loading `external_file`.
    ///
    /// Never fails; see [`Self::execute_report`] for the outcome.
    pub async fn execute(&self, name: &str, content: &str, external_file: Option<&Path>) -> String {
        self.execute_report(name, content, external_file).await.text
    }

    /// Like [`Self::execute`] but also reports how the attempt ended.
    pub async fn execute_report(
        &self,
        name: &str,
        content: &str,
        external_file: Option<&Path>,
    ) -> ExecutionReport {
        if let Some(file) = external_file {
            if !tokio::fs::try_exists(file).await.unwrap_or(false) {
                tracing::warn!(script = %name, file = %file.display(), "External file not found");
                return ExecutionReport {
                    outcome: ExecutionOutcome::MissingInputFile,
                    text: format!("Error: Blend file not found: {}", file.display()),
                };
            }
        }

        let scratch = match ScratchSet::allocate(&self.scratch_dir, name) {
            Ok(scratch) => scratch,
            Err(e) => return launch_failed(name, &e),
        };

        // `scratch` lives until the end of this function; its drop removes the files.
        self.run_in_scratch(name, content, external_file, &scratch)
            .await
    }

    async fn run_in_scratch(
        &self,
        name: &str,
        content: &str,
        external_file: Option<&Path>,
        scratch: &ScratchSet,
    ) -> ExecutionReport {
        if let Err(e) = tokio::fs::write(scratch.body_path(), content).await {
            return launch_failed(name, &e);
        }
        if let Err(e) = tokio::fs::write(scratch.envelope_path(), envelope::envelope_source()).await
        {
            return launch_failed(name, &e);
        }

        let mut cmd = self.build_command(scratch.envelope_path(), external_file);
        let input = envelope::envelope_env(name, scratch.body_path(), scratch.output_path())
            .into_iter()
            .fold(ScriptInput::with_timeout(self.timeout), |input, (key, value)| {
                input.env(key, value)
            });

        tracing::info!(
            script = %name,
            host = %self.host.path().display(),
            token = scratch.token(),
            "Launching host process",
        );

        match subprocess::run_command(&mut cmd, input).await {
            Ok(output) => {
                let captured = read_captured_output(scratch.output_path()).await;
                tracing::info!(
                    script = %name,
                    exit_code = output.exit_code,
                    duration_ms = output.duration_ms,
                    "Host process finished",
                );
                finished(captured, &output)
            }
            Err(ScriptError::Timeout { elapsed_ms }) => {
                tracing::warn!(script = %name, elapsed_ms, "Host process timed out");
                ExecutionReport {
                    outcome: ExecutionOutcome::TimedOut,
                    text: format!(
                        "Script execution timed out after {}",
                        describe_duration(self.timeout)
                    ),
                }
            }
            Err(ScriptError::IoError(e)) => launch_failed(name, &e),
        }
    }

    /// `<host> --background [--file <external_file>] --python <envelope>`
    fn build_command(&self, envelope_path: &Path, external_file: Option<&Path>) -> Command {
        let mut cmd = Command::new(self.host.path());
        cmd.arg("--background");
        if let Some(file) = external_file {
            cmd.arg("--file").arg(file);
        }
        cmd.arg("--python").arg(envelope_path);
        cmd
    }
}

fn finished(captured: String, output: &ScriptOutput) -> ExecutionReport {
    if output.success() {
        return ExecutionReport {
            outcome: ExecutionOutcome::Completed,
            text: captured,
        };
    }

    let mut text = captured;
    text.push_str("\n\n");
    text.push_str(HOST_OUTPUT_HEADING);
    text.push('\n');
    text.push_str(&format!("STDOUT: {}\n", output.stdout));
    text.push_str(&format!("STDERR: {}", output.stderr));

    ExecutionReport {
        outcome: ExecutionOutcome::HostFailure {
            exit_code: output.exit_code,
        },
        text,
    }
}

fn launch_failed(name: &str, err: &dyn std::fmt::Display) -> ExecutionReport {
    tracing::error!(script = %name, error = %err, "Script execution failed to launch");
    ExecutionReport {
        outcome: ExecutionOutcome::LaunchFailed,
        text: format!("Error executing script: {err}"),
    }
}

/// Contents of the envelope's output file, or [`NO_OUTPUT_MESSAGE`].
async fn read_captured_output(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => NO_OUTPUT_MESSAGE.to_string(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read captured output");
            NO_OUTPUT_MESSAGE.to_string()
        }
    }
}

/// `60 seconds`, or `250 milliseconds` for budgets that are not whole seconds.
fn describe_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 && duration.as_secs() > 0 {
        format!("{} seconds", duration.as_secs())
    } else {
        format!("{} milliseconds", duration.as_millis())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> ScriptOutput {
        ScriptOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            duration_ms: 5,
        }
    }

    #[test]
    fn zero_exit_returns_captured_output_unchanged() {
        let report = finished("hi\n\n".to_string(), &output(0, "host noise", "more noise"));
        assert_eq!(report.outcome, ExecutionOutcome::Completed);
        assert_eq!(report.text, "hi\n\n");
    }

    #[test]
    fn non_zero_exit_appends_host_streams() {
        let report = finished(NO_OUTPUT_MESSAGE.to_string(), &output(1, "boom", "trace"));
        assert_eq!(
            report.outcome,
            ExecutionOutcome::HostFailure { exit_code: 1 }
        );
        assert_eq!(
            report.text,
            "No output captured from script.\n\nBlender process output:\nSTDOUT: boom\nSTDERR: trace"
        );
    }

    #[test]
    fn describe_whole_seconds() {
        assert_eq!(describe_duration(Duration::from_secs(60)), "60 seconds");
        assert_eq!(describe_duration(Duration::from_secs(1)), "1 seconds");
    }

    #[test]
    fn describe_sub_second() {
        assert_eq!(
            describe_duration(Duration::from_millis(250)),
            "250 milliseconds"
        );
        assert_eq!(
            describe_duration(Duration::from_millis(1500)),
            "1500 milliseconds"
        );
    }

    #[test]
    fn command_layout_without_file() {
        let harness = BlenderHarness::new(
            HostExecutable::from_path("blender"),
            DEFAULT_TIMEOUT,
            PathBuf::from("/tmp/x"),
        );
        let cmd = harness.build_command(Path::new("/tmp/x/env.py"), None);
        let std_cmd = cmd.as_std();
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(std_cmd.get_program(), "blender");
        assert_eq!(args, ["--background", "--python", "/tmp/x/env.py"]);
    }

    #[test]
    fn command_layout_with_file() {
        let harness = BlenderHarness::new(
            HostExecutable::from_path("blender"),
            DEFAULT_TIMEOUT,
            PathBuf::from("/tmp/x"),
        );
        let cmd = harness.build_command(Path::new("/tmp/x/env.py"), Some(Path::new("scene.blend")));
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_str().unwrap())
            .collect();
        assert_eq!(
            args,
            ["--background", "--file", "scene.blend", "--python", "/tmp/x/env.py"]
        );
    }

    #[test]
    fn default_scratch_dir_is_under_temp() {
        let dir = BlenderHarness::default_scratch_dir();
        assert!(dir.starts_with(std::env::temp_dir()));
        assert!(dir.ends_with(DEFAULT_SCRATCH_DIR_NAME));
    }
}
