// Helper functions shared by the provider, the muxer and the orchestrator

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use super::errors::DownloadError;
use super::traits::{CommandOutput, CommandRunner};

/// Run a command to completion, capturing stdout and stderr.
///
/// No timeout is applied; the call returns when the child exits.
pub async fn run_output(program: &Path, args: &[String]) -> Result<CommandOutput, DownloadError> {
    debug!("Running: {} {}", program.display(), args.join(" "));

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            DownloadError::ExecutionError(format!("Failed to start {}: {}", program.display(), e))
        })?;

    let capture_failed = |pipe: &str| {
        DownloadError::ExecutionError(format!(
            "Failed to capture {} from {}",
            pipe,
            program.display()
        ))
    };
    let stdout_pipe = child.stdout.take().ok_or_else(|| capture_failed("stdout"))?;
    let stderr_pipe = child.stderr.take().ok_or_else(|| capture_failed("stderr"))?;

    // Drain both pipes concurrently so a chatty child never blocks on a full buffer
    let stdout_task = tokio::spawn(read_lossy(stdout_pipe));
    let stderr_task = tokio::spawn(read_lossy(stderr_pipe));

    let status = child.wait().await.map_err(|e| {
        DownloadError::ExecutionError(format!("Failed to wait for {}: {}", program.display(), e))
    })?;

    let stdout = join_pipe(stdout_task, "stdout").await?;
    let stderr = join_pipe(stderr_task, "stderr").await?;

    Ok(CommandOutput {
        success: status.success(),
        code: status.code(),
        stdout,
        stderr,
    })
}

/// Read a pipe to EOF. Invalid UTF-8 is replaced instead of failing the read.
pub async fn read_lossy<R>(mut pipe: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Wait for a `read_lossy` task spawned on one of the child's pipes
pub async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<String>>,
    name: &str,
) -> Result<String, DownloadError> {
    task.await
        .map_err(|e| DownloadError::ExecutionError(format!("{} task failed: {}", name, e)))?
        .map_err(|e| DownloadError::ExecutionError(format!("Failed to read {}: {}", name, e)))
}

/// `CommandRunner` backed by real child processes
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, DownloadError> {
        run_output(program, args).await
    }
}

/// Dotted extension for a temp file, with a fallback when the provider gave none
pub fn dotted_extension(extension: &str, fallback: &str) -> String {
    let ext = extension.trim().trim_start_matches('.');
    if ext.is_empty() {
        format!(".{}", fallback)
    } else {
        format!(".{}", ext)
    }
}

/// `<dir>/<stem><suffix>` without going through `Path::with_extension`,
/// which would clobber dots inside the stem
pub fn output_path(dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}", stem, suffix))
}

/// Remove a file, ignoring any failure
pub async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!("Ignoring cleanup failure for {}: {}", path.display(), e);
    }
}

/// yt-dlp treats `-o` as a template; a literal `%` must be doubled
pub fn escape_output_template(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

/// Last few non-empty lines of a process log, for error messages
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
