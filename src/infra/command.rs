//! # External Command Execution / 外部命令执行
//!
//! Runs a child process and captures its stdout and stderr, read concurrently
//! and combined into one string.
//!
//! 运行子进程并捕获其 stdout 和 stderr，两者被并发读取并合并为一个字符串。

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::warn;

/// Renders a program and its arguments the way a shell would accept them.
/// Secrets must be redacted by the caller before this is logged.
pub fn display_command<'a>(program: &'a str, args: impl IntoIterator<Item = &'a str>) -> String {
    let words = std::iter::once(program).chain(args);
    shlex::try_join(words).unwrap_or_else(|_| program.to_string())
}

/// Spawns a command, captures its stdout and stderr.
///
/// # Returns
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
///
/// # Returns
/// - 进程的 `ExitStatus`（包装在 `io::Result` 中）。
/// - 合并的 stdout 和 stderr，为一个 `String`。
pub async fn spawn_and_capture(mut cmd: Command) -> (std::io::Result<ExitStatus>, String) {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("failed to capture child output")),
            String::new(),
        );
    };

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_output = Arc::clone(&output);
    let stdout_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stdout_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let stderr_output = Arc::clone(&output);
    let stderr_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stderr_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let status = child.wait().await;

    // Join the readers so no trailing output is lost.
    if let Err(e) = stdout_handle.await {
        warn!("Failed to join stdout task: {e}");
    }
    if let Err(e) = stderr_handle.await {
        warn!("Failed to join stderr task: {e}");
    }

    (status, output.lock().await.clone())
}
