use crate::error::{GitError, GitResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Hard ceiling on any single git invocation. Commands that outlive it are
/// killed and surfaced as [`GitError::Timeout`].
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

// Both markers must appear in stderr (any case) for a non-zero exit to be
// classified as a merge conflict instead of a plain command failure.
const MERGE_FAILED_MARKER: &str = "merge failed";
const FIX_CONFLICTS_MARKER: &str = "fix conflicts";

/// Result of executing a git command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Executes git commands within a working directory
#[derive(Debug, Clone)]
pub struct GitExecutor {
    git_bin: PathBuf,
    work_dir: PathBuf,
}

impl GitExecutor {
    /// Create an executor for `work_dir`, resolving the git binary from the
    /// `GIT_EXECUTABLE` environment variable or falling back to `git` on PATH.
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Self {
        let git_bin = std::env::var("GIT_EXECUTABLE").unwrap_or_else(|_| "git".to_string());
        Self::with_binary(work_dir, git_bin)
    }

    /// Create an executor with an explicit git binary path.
    pub fn with_binary<P: AsRef<Path>, B: Into<PathBuf>>(work_dir: P, git_bin: B) -> Self {
        Self {
            git_bin: git_bin.into(),
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    /// Run `git <args...>` and capture its output.
    ///
    /// With `check` set, a non-zero exit becomes an error: [`GitError::Conflict`]
    /// when stderr carries both conflict markers, otherwise
    /// [`GitError::CommandFailed`] with the full invocation and stderr. With
    /// `check` unset the [`CommandOutput`] is returned regardless of exit code,
    /// for probes that are expected to fail.
    pub async fn run(&self, args: &[&str], check: bool) -> GitResult<CommandOutput> {
        let output = tokio::time::timeout(
            COMMAND_TIMEOUT,
            Command::new(&self.git_bin)
                .args(args)
                .current_dir(&self.work_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GitError::Timeout {
            command: self.render_invocation(args),
            seconds: COMMAND_TIMEOUT.as_secs(),
        })?
        .map_err(|e| {
            GitError::CommandFailed(format!("Failed to execute {}: {}", self.git_bin.display(), e))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        if check && !success {
            return Err(self.classify_failure(args, &stderr));
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success,
        })
    }

    /// Run a command with `check` set and return its stdout.
    pub async fn run_checked(&self, args: &[&str]) -> GitResult<String> {
        Ok(self.run(args, true).await?.stdout)
    }

    /// Classify a non-zero exit into a conflict or a generic failure.
    fn classify_failure(&self, args: &[&str], stderr: &str) -> GitError {
        let lowered = stderr.to_lowercase();
        if lowered.contains(MERGE_FAILED_MARKER) && lowered.contains(FIX_CONFLICTS_MARKER) {
            GitError::Conflict(stderr.to_string())
        } else {
            GitError::CommandFailed(format!(
                "git command failed: {}\n{}",
                self.render_invocation(args),
                stderr
            ))
        }
    }

    fn render_invocation(&self, args: &[&str]) -> String {
        let mut parts = vec![self.git_bin.display().to_string()];
        parts.extend(args.iter().map(|a| a.to_string()));
        parts.join(" ")
    }

    /// Check that the configured git binary can be invoked at all.
    pub async fn git_available(&self) -> bool {
        matches!(self.run(&["--version"], false).await, Ok(out) if out.success)
    }

    /// Get the working directory
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Get the configured git binary path
    pub fn git_bin(&self) -> &Path {
        &self.git_bin
    }
}
