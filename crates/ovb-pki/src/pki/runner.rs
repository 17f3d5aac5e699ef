//! External tool execution seam.

use crate::pki::types::*;
use async_trait::async_trait;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Runner trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Captured output of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` if terminated by a signal.
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Executes external commands. The production impl shells out; tests
/// substitute a scripted runner so the pipeline runs without the tools
/// installed.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, PkiError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  System runner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Runs commands on the host with captured stdout/stderr.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, PkiError> {
        let mut command = tokio::process::Command::new(&cmd.program);
        command.args(&cmd.args);
        for (k, v) in &cmd.env {
            command.env(k, v);
        }
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }

        log::debug!("running: {}", cmd.display_line());

        let output = command.output().await.map_err(|e| {
            PkiError::new(
                PkiErrorKind::ToolNotFound,
                format!("cannot spawn {}", cmd.program),
            )
            .with_detail(e.to_string())
        })?;

        Ok(ToolOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ToolOutput ───────────────────────────────────────────────

    #[test]
    fn output_success_on_zero() {
        let out = ToolOutput {
            status_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(out.success());
    }

    #[test]
    fn output_failure_on_nonzero_or_signal() {
        let failed = ToolOutput {
            status_code: Some(1),
            stdout: String::new(),
            stderr: "boom".into(),
        };
        assert!(!failed.success());
        let signalled = ToolOutput {
            status_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!signalled.success());
    }

    // ── SystemRunner ─────────────────────────────────────────────

    #[tokio::test]
    async fn system_runner_captures_stdout() {
        let runner = SystemRunner;
        let cmd = ToolCommand::new("echo").arg("hello");
        let out = runner.run(&cmd).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn system_runner_missing_binary_is_tool_not_found() {
        let runner = SystemRunner;
        let cmd = ToolCommand::new("definitely-not-a-real-binary-xyz");
        let err = runner.run(&cmd).await.unwrap_err();
        assert_eq!(err.kind, PkiErrorKind::ToolNotFound);
    }

    #[tokio::test]
    async fn system_runner_applies_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner;
        let cmd = ToolCommand::new("pwd").cwd(dir.path());
        let out = runner.run(&cmd).await.unwrap();
        assert!(out.stdout.trim().ends_with(
            dir.path().file_name().unwrap().to_str().unwrap()
        ));
    }
}
