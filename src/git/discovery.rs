use crate::git::repository::Repository;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

/// Wall-clock budget for a scoped scan.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

const GIT_DIR_NAME: &str = ".git";

/// Errors from repository discovery, kept distinct so callers can show an
/// actionable message per cause.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Search root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("Repository search timed out after {0} seconds")]
    Timeout(u64),

    #[error("Repository search failed: {0}")]
    Walk(String),
}

/// Search for git repositories under `root`, up to `max_depth` levels.
///
/// The metadata directory sits one level below each repository root, so the
/// walk descends one extra level. Candidates with hidden path segments below
/// the root are dropped unless `include_hidden` is set, and every hit is
/// re-validated with the work-tree probe: a directory entry can be stale or
/// unreadable by the time we look at it.
pub async fn find_repos(
    root: &Path,
    max_depth: usize,
    include_hidden: bool,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::InvalidRoot(root.to_path_buf()));
    }

    let walk_root = root.to_path_buf();
    let candidates =
        tokio::task::spawn_blocking(move || {
            collect_git_dirs(&walk_root, Some(max_depth + 1), SCAN_TIMEOUT)
        })
        .await
        .map_err(|e| DiscoveryError::Walk(e.to_string()))??;

    let mut repos = Vec::new();
    for candidate in candidates {
        if !include_hidden && has_hidden_segment(root, &candidate) {
            continue;
        }
        if Repository::new(&candidate).is_work_tree().await {
            repos.push(candidate);
        }
    }
    Ok(repos)
}

/// Search the entire home directory for git repositories.
///
/// No depth limit; only the caller-supplied wall-clock timeout bounds the
/// walk. Intended for a one-time, explicitly user-triggered full scan, so
/// candidates are returned without per-path re-validation.
pub async fn find_all_repos(timeout_secs: u64) -> Result<Vec<PathBuf>, DiscoveryError> {
    let home = std::env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| DiscoveryError::Walk("HOME environment variable not set".to_string()))?;
    if !home.is_dir() {
        return Err(DiscoveryError::InvalidRoot(home));
    }

    tokio::task::spawn_blocking(move || {
        collect_git_dirs(&home, None, Duration::from_secs(timeout_secs))
    })
    .await
    .map_err(|e| DiscoveryError::Walk(e.to_string()))?
}

/// Walk `root` collecting parents of `.git` directories.
///
/// Unreadable entries are skipped, `.git` directories themselves are not
/// descended into, and the deadline is checked per entry.
fn collect_git_dirs(
    root: &Path,
    max_depth: Option<usize>,
    budget: Duration,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let deadline = Instant::now() + budget;

    let mut walker = WalkDir::new(root);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut repos = Vec::new();
    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        if Instant::now() > deadline {
            return Err(DiscoveryError::Timeout(budget.as_secs()));
        }
        let Ok(entry) = entry else {
            continue;
        };
        if entry.file_type().is_dir() && entry.file_name() == GIT_DIR_NAME {
            if let Some(parent) = entry.path().parent() {
                repos.push(parent.to_path_buf());
            }
            it.skip_current_dir();
        }
    }
    Ok(repos)
}

/// Whether any path segment below `root` is hidden (other than `.git`
/// itself, which was already mapped away).
fn has_hidden_segment(root: &Path, candidate: &Path) -> bool {
    let Ok(relative) = candidate.strip_prefix(root) else {
        return false;
    };
    relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|segment| segment.starts_with('.'))
}
