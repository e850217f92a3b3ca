use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::executor::GitExecutor;
use crate::git::parser::{self, CommitRecord};
use std::path::{Path, PathBuf};

/// Represents a git working tree and provides the query/mutation operations
/// the assistant is built on.
///
/// Operations are stateless: nothing is cached between calls because the
/// filesystem is the source of truth. Probes swallow failures into negative
/// results; mutating operations surface typed errors, with merge and pull
/// conflicts kept distinct so callers can branch into resolution flow.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    executor: GitExecutor,
}

impl Repository {
    /// Create a Repository for a known working tree path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let executor = GitExecutor::new(&path);

        Self { path, executor }
    }

    /// Create a Repository using the configured git executable.
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Self {
        let path = path.as_ref().to_path_buf();
        let executor = GitExecutor::with_binary(&path, config.git_executable.clone());

        Self { path, executor }
    }

    /// Walk up from `start_path` looking for a `.git` metadata directory.
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        Ok(Self::new(Self::find_root(start_path)?))
    }

    /// Like [`Repository::discover_from`], with the configured executable.
    pub fn discover_with_config<P: AsRef<Path>>(start_path: P, config: &Config) -> GitResult<Self> {
        Ok(Self::with_config(Self::find_root(start_path)?, config))
    }

    fn find_root<P: AsRef<Path>>(start_path: P) -> GitResult<PathBuf> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            if current.join(".git").exists() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the git executor for this repository
    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    // ===== Probes =====
    //
    // Probe semantics: any failure yields false/None, never an error.

    /// Whether the path is inside a git working tree right now.
    pub async fn is_work_tree(&self) -> bool {
        match self
            .executor
            .run(&["rev-parse", "--is-inside-work-tree"], true)
            .await
        {
            Ok(output) => output.stdout.trim() == "true",
            Err(_) => false,
        }
    }

    /// Name of the currently checked-out branch, `None` when unknown
    /// (not a repository, detached HEAD probe failure, ...).
    pub async fn current_branch(&self) -> Option<String> {
        match self
            .executor
            .run(&["rev-parse", "--abbrev-ref", "HEAD"], true)
            .await
        {
            Ok(output) => {
                let branch = output.stdout.trim();
                if branch.is_empty() {
                    None
                } else {
                    Some(branch.to_string())
                }
            }
            Err(_) => None,
        }
    }

    // ===== Listings =====
    //
    // Each returns an ordered list of trimmed, non-empty lines, and an empty
    // list when the path is not a working tree.

    /// Files with staged changes. `--cached` for wider git compatibility.
    pub async fn staged_files(&self) -> GitResult<Vec<String>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let out = self
            .executor
            .run_checked(&["diff", "--name-only", "--cached"])
            .await?;
        Ok(parser::parse_name_lines(&out))
    }

    /// Files modified in the working directory but not staged.
    pub async fn unstaged_files(&self) -> GitResult<Vec<String>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let out = self.executor.run_checked(&["ls-files", "--modified"]).await?;
        Ok(parser::parse_name_lines(&out))
    }

    /// Files currently in conflict. The unmerged filter can exit non-zero, so
    /// the command runs unchecked.
    pub async fn conflicted_files(&self) -> GitResult<Vec<String>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let out = self
            .executor
            .run(&["diff", "--name-only", "--diff-filter=U"], false)
            .await?;
        Ok(parser::parse_name_lines(&out.stdout))
    }

    /// Local branches, with the current-branch marker stripped.
    pub async fn list_branches(&self) -> GitResult<Vec<String>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let out = self.executor.run_checked(&["branch", "--list"]).await?;
        Ok(parser::parse_branch_list(&out))
    }

    // ===== Diff retrieval and the commit size guard =====

    /// Raw staged diff text; empty string when not a working tree.
    pub async fn diff_staged(&self) -> GitResult<String> {
        if !self.is_work_tree().await {
            return Ok(String::new());
        }
        self.executor.run_checked(&["diff", "--cached"]).await
    }

    /// UTF-8 byte length of the staged diff.
    pub async fn staged_diff_size(&self) -> GitResult<usize> {
        Ok(self.diff_staged().await?.len())
    }

    /// Plain commit of whatever is staged.
    pub async fn commit(&self, message: &str) -> GitResult<String> {
        self.executor.run_checked(&["commit", "-m", message]).await
    }

    /// Commit only if the staged diff is at most `max_bytes`.
    ///
    /// The limit is a circuit breaker independent of the command timeout: a
    /// multi-megabyte diff can stall both the commit and any model call fed
    /// from it. Exceeding it fails with [`GitError::DiffTooLarge`] carrying the
    /// measured size, without invoking git at all.
    pub async fn safe_commit(&self, message: &str, max_bytes: usize) -> GitResult<String> {
        let size = self.staged_diff_size().await?;
        if size > max_bytes {
            return Err(GitError::DiffTooLarge {
                size,
                limit: max_bytes,
            });
        }
        self.commit(message).await
    }

    // ===== History =====

    /// Recent commits, newest first. An empty repository has no log.
    pub async fn history(&self, limit: usize) -> GitResult<Vec<CommitRecord>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let format = format!("--pretty=format:{}", parser::LOG_FORMAT);
        let count = format!("-n{}", limit);
        match self.executor.run_checked(&["log", &format, &count]).await {
            Ok(out) => Ok(parser::parse_history(&out)),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Patch text for a single commit.
    pub async fn commit_diff(&self, commit_hash: &str) -> GitResult<String> {
        if !self.is_work_tree().await {
            return Ok(String::new());
        }
        self.executor
            .run_checked(&["show", "--patch", "--unified=10", commit_hash])
            .await
    }

    /// Commits on the configured upstream that are absent locally.
    ///
    /// Advisory: a missing upstream (or any other failure) yields an empty
    /// list so this can never block a caller. Assumes a recent fetch.
    pub async fn incoming_commits(&self) -> GitResult<Vec<CommitRecord>> {
        if !self.is_work_tree().await {
            return Ok(Vec::new());
        }
        let format = format!("--pretty=format:{}", parser::LOG_FORMAT);
        match self
            .executor
            .run(&["log", &format, "HEAD..@{u}"], false)
            .await
        {
            Ok(out) if out.success => Ok(parser::parse_history(&out.stdout)),
            _ => Ok(Vec::new()),
        }
    }

    /// Fetch updates from the default remote.
    pub async fn fetch(&self) -> GitResult<String> {
        self.executor.run_checked(&["fetch"]).await
    }

    // ===== Staging =====

    /// Stage a single file.
    pub async fn stage_file(&self, file_path: &str) -> GitResult<String> {
        self.executor.run_checked(&["add", file_path]).await
    }

    /// Stage every change in the working tree.
    pub async fn stage_all(&self) -> GitResult<String> {
        self.executor.run_checked(&["add", "--all"]).await
    }

    /// Unstage a single file.
    pub async fn unstage_file(&self, file_path: &str) -> GitResult<String> {
        self.executor
            .run_checked(&["reset", "HEAD", "--", file_path])
            .await
    }

    /// Unstage all staged changes.
    pub async fn unstage_all(&self) -> GitResult<String> {
        self.executor.run_checked(&["reset"]).await
    }

    // ===== Branches, merge, remote =====

    /// Switch to another branch.
    pub async fn checkout(&self, branch: &str) -> GitResult<String> {
        self.executor.run_checked(&["checkout", branch]).await
    }

    /// Create a new branch and switch to it.
    pub async fn create_branch(&self, branch: &str) -> GitResult<String> {
        self.executor.run_checked(&["checkout", "-b", branch]).await
    }

    /// Merge another branch into the current one. Conflicts surface as
    /// [`GitError::Conflict`].
    pub async fn merge(&self, branch: &str) -> GitResult<String> {
        self.executor.run_checked(&["merge", branch]).await
    }

    /// Push the current branch to its remote.
    pub async fn push(&self) -> GitResult<String> {
        self.executor.run_checked(&["push"]).await
    }

    /// Pull from the remote. Conflicts surface as [`GitError::Conflict`].
    pub async fn pull(&self) -> GitResult<String> {
        self.executor.run_checked(&["pull"]).await
    }

    // ===== Undo =====

    /// Undo the last commit, keeping its changes staged.
    pub async fn undo_last_commit(&self) -> GitResult<String> {
        self.executor
            .run_checked(&["reset", "--soft", "HEAD~1"])
            .await
    }

    /// Undo the last commit and discard its changes.
    pub async fn undo_last_commit_hard(&self) -> GitResult<String> {
        self.executor
            .run_checked(&["reset", "--hard", "HEAD~1"])
            .await
    }

    /// Abort an in-progress merge, returning to the pre-merge state.
    pub async fn abort_merge(&self) -> GitResult<String> {
        self.executor.run_checked(&["merge", "--abort"]).await
    }

    /// Abort an in-progress rebase.
    pub async fn abort_rebase(&self) -> GitResult<String> {
        self.executor.run_checked(&["rebase", "--abort"]).await
    }

    /// Discard all unstaged changes in the working tree.
    pub async fn discard_unstaged(&self) -> GitResult<String> {
        self.executor.run_checked(&["checkout", "."]).await
    }

    /// Discard unstaged changes for a single file.
    pub async fn discard_file_changes(&self, file_path: &str) -> GitResult<String> {
        self.executor
            .run_checked(&["checkout", "--", file_path])
            .await
    }

    /// Read a working-tree file as text (conflict-resolution input).
    pub async fn file_content(&self, file_path: &str) -> GitResult<String> {
        Ok(tokio::fs::read_to_string(self.path.join(file_path)).await?)
    }

    /// Query branch, change lists and recent history in one call.
    pub async fn snapshot(&self) -> GitResult<RepositorySnapshot> {
        Ok(RepositorySnapshot {
            branch: self.current_branch().await,
            staged: self.staged_files().await?,
            unstaged: self.unstaged_files().await?,
            conflicted: self.conflicted_files().await?,
            recent_commits: self.history(10).await?,
        })
    }
}

/// Point-in-time view of a repository, discarded after rendering
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub branch: Option<String>,
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub conflicted: Vec<String>,
    pub recent_commits: Vec<CommitRecord>,
}

impl RepositorySnapshot {
    /// No staged or unstaged changes and nothing in conflict.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.conflicted.is_empty()
    }
}
