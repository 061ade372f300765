//! The capture envelope loaded by the host process.
//!
//! The envelope is a fixed Python program. It never contains caller text:
//! the script body and the output destination reach it through environment
//! variables, and the body is compiled from its own file.
//!
//! Output file layout: captured stdout, [`OUTPUT_SEPARATOR`], captured stderr.

/// Environment variable holding the path of the script body file.
pub const SCRIPT_PATH_ENV: &str = "BSM_SCRIPT_PATH";

/// Environment variable holding the path the captured output is written to.
pub const OUTPUT_PATH_ENV: &str = "BSM_OUTPUT_PATH";

/// Environment variable holding the script name, used as the code filename
/// in tracebacks.
pub const SCRIPT_NAME_ENV: &str = "BSM_SCRIPT_NAME";

/// Written between the captured stdout and stderr buffers.
pub const OUTPUT_SEPARATOR: &str = "\n\n";

const ENVELOPE_SOURCE: &str = r#"import io
import os
import sys
import traceback

_bsm_script_path = os.environ["BSM_SCRIPT_PATH"]
_bsm_output_path = os.environ["BSM_OUTPUT_PATH"]
_bsm_script_name = os.environ.get("BSM_SCRIPT_NAME", "<script>")

_bsm_old_stdout = sys.stdout
_bsm_old_stderr = sys.stderr
_bsm_stdout_buffer = io.StringIO()
_bsm_stderr_buffer = io.StringIO()
sys.stdout = _bsm_stdout_buffer
sys.stderr = _bsm_stderr_buffer

try:
    with open(_bsm_script_path, "r", encoding="utf-8") as _bsm_body:
        _bsm_source = _bsm_body.read()
    _bsm_code = compile(_bsm_source, _bsm_script_name, "exec")
    exec(_bsm_code, {"__name__": "__main__", "__file__": _bsm_script_path})
except Exception as e:
    print(f"Error executing script: {e}", file=sys.stderr)
    traceback.print_exc()
finally:
    sys.stdout = _bsm_old_stdout
    sys.stderr = _bsm_old_stderr
    with open(_bsm_output_path, "w", encoding="utf-8") as _bsm_output:
        _bsm_output.write(_bsm_stdout_buffer.getvalue())
        _bsm_output.write("\n\n")
        _bsm_output.write(_bsm_stderr_buffer.getvalue())
"#;

/// Source of the envelope program.
pub fn envelope_source() -> &'static str {
    ENVELOPE_SOURCE
}

/// Environment passed to the host so the envelope can find its inputs.
pub fn envelope_env(
    script_name: &str,
    body_path: &std::path::Path,
    output_path: &std::path::Path,
) -> Vec<(String, String)> {
    vec![
        (
            SCRIPT_PATH_ENV.to_string(),
            body_path.to_string_lossy().into_owned(),
        ),
        (
            OUTPUT_PATH_ENV.to_string(),
            output_path.to_string_lossy().into_owned(),
        ),
        (SCRIPT_NAME_ENV.to_string(), script_name.to_string()),
    ]
}
