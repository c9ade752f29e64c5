//! Python script execution tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{required_str, Tool, ToolError};
use crate::sandbox::WorkingRoot;

/// Wall-clock budget for one script run.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a Python script inside the working directory.
pub struct RunScript {
    timeout: Duration,
}

impl Default for RunScript {
    fn default() -> Self {
        Self {
            timeout: SCRIPT_TIMEOUT,
        }
    }
}

impl RunScript {
    /// Override the timeout (tests use sub-second budgets).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Tool for RunScript {
    fn name(&self) -> &str {
        "run_python_file"
    }

    fn description(&self) -> &str {
        "Execute a Python file relative to the working directory with python3 and return its stdout, stderr, and exit code. Runs are limited to 30 seconds."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Python file to run, relative to the working directory"
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional command-line arguments passed to the script"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: &Value, root: &WorkingRoot) -> Result<String, ToolError> {
        let file_path = required_str(args, "file_path")?;
        let resolved = root.resolve(file_path)?;

        if !tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
            return Err(ToolError::NotFound(resolved.display().to_string()));
        }
        if resolved.extension().and_then(|e| e.to_str()) != Some("py") {
            return Err(ToolError::WrongFileType(file_path.to_string()));
        }

        let extra_args = script_args(args)?;

        let mut command = Command::new("python3");
        command
            .arg(&resolved)
            .args(&extra_args)
            .current_dir(root.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must not leave the child alive.
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ToolError::Timeout(self.timeout))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut sections = Vec::new();
        if !stdout.trim().is_empty() {
            sections.push(format!("STDOUT:\n{}", stdout.trim()));
        }
        if !stderr.trim().is_empty() {
            sections.push(format!("STDERR:\n{}", stderr.trim()));
        }
        match output.status.code() {
            Some(0) => {}
            Some(code) => sections.push(format!("Process exited with code {code}")),
            None => sections.push("Process terminated by signal".to_string()),
        }
        if sections.is_empty() {
            return Ok("No output produced.".to_string());
        }
        Ok(sections.join("\n"))
    }
}

/// Extract the optional `args` array; every element must be a string.
fn script_args(args: &Value) -> Result<Vec<String>, ToolError> {
    let Some(values) = args.get("args").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| ToolError::ArgumentParse(format!("script args must be strings, got: {v}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn test_root() -> (tempfile::TempDir, WorkingRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = WorkingRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn runs_script_and_captures_stdout() {
        let (dir, root) = test_root();
        std::fs::write(dir.path().join("hello.py"), "print('hi there')").unwrap();

        let output = RunScript::default()
            .execute(&json!({ "file_path": "hello.py" }), &root)
            .await
            .unwrap();
        assert_eq!(output, "STDOUT:\nhi there");
    }

    #[tokio::test]
    async fn forwards_arguments_in_order() {
        let (dir, root) = test_root();
        std::fs::write(
            dir.path().join("echo.py"),
            "import sys\nprint(' '.join(sys.argv[1:]))",
        )
        .unwrap();

        let output = RunScript::default()
            .execute(
                &json!({ "file_path": "echo.py", "args": ["one", "two"] }),
                &root,
            )
            .await
            .unwrap();
        assert_eq!(output, "STDOUT:\none two");
    }

    #[tokio::test]
    async fn reports_stderr_and_exit_code() {
        let (dir, root) = test_root();
        std::fs::write(
            dir.path().join("fail.py"),
            "import sys\nsys.stderr.write('boom')\nsys.exit(3)",
        )
        .unwrap();

        let output = RunScript::default()
            .execute(&json!({ "file_path": "fail.py" }), &root)
            .await
            .unwrap();
        assert!(output.contains("STDERR:\nboom"));
        assert!(output.contains("Process exited with code 3"));
    }

    #[tokio::test]
    async fn silent_script_reports_no_output() {
        let (dir, root) = test_root();
        std::fs::write(dir.path().join("quiet.py"), "pass").unwrap();

        let output = RunScript::default()
            .execute(&json!({ "file_path": "quiet.py" }), &root)
            .await
            .unwrap();
        assert_eq!(output, "No output produced.");
    }

    #[tokio::test]
    async fn rejects_non_python_file() {
        let (dir, root) = test_root();
        std::fs::write(dir.path().join("script.sh"), "echo hi").unwrap();

        let err = RunScript::default()
            .execute(&json!({ "file_path": "script.sh" }), &root)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::WrongFileType(_)));
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let (_dir, root) = test_root();

        let err = RunScript::default()
            .execute(&json!({ "file_path": "ghost.py" }), &root)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_escape() {
        let (_dir, root) = test_root();

        let err = RunScript::default()
            .execute(&json!({ "file_path": "../outside.py" }), &root)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Confinement(_)));
    }

    #[tokio::test]
    async fn times_out_and_kills_oversleeping_script() {
        let (dir, root) = test_root();
        std::fs::write(dir.path().join("sleepy.py"), "import time\ntime.sleep(30)").unwrap();

        let budget = Duration::from_millis(500);
        let started = Instant::now();
        let err = RunScript::with_timeout(budget)
            .execute(&json!({ "file_path": "sleepy.py" }), &root)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Timeout(_)));
        // Bounded margin: well under the script's own sleep.
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
