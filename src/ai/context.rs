use crate::error::GitResult;
use crate::git::Repository;

const MAX_LISTED_FILES: usize = 50;

/// Build the compact repository snapshot included in AI prompts: current
/// branch, change lists and recent subjects. Kept short on purpose; a local
/// model does not need (and cannot hold) the whole tree.
pub async fn build_context(repo: &Repository) -> GitResult<String> {
    let snapshot = repo.snapshot().await?;
    let mut context = String::new();

    match &snapshot.branch {
        Some(branch) => context.push_str(&format!("Current branch: {branch}\n")),
        None => context.push_str("Detached HEAD state\n"),
    }

    push_file_section(&mut context, "Staged files", &snapshot.staged);
    push_file_section(&mut context, "Unstaged files", &snapshot.unstaged);
    push_file_section(&mut context, "Conflicted files", &snapshot.conflicted);

    if !snapshot.recent_commits.is_empty() {
        context.push_str("\nRecent commits:\n");
        for commit in &snapshot.recent_commits {
            context.push_str(&format!("  {} {}\n", commit.hash, commit.subject));
        }
    }

    Ok(context)
}

fn push_file_section(context: &mut String, title: &str, files: &[String]) {
    if files.is_empty() {
        return;
    }
    context.push_str(&format!("\n{title}:\n"));
    for file in files.iter().take(MAX_LISTED_FILES) {
        context.push_str(&format!("  {file}\n"));
    }
    if files.len() > MAX_LISTED_FILES {
        context.push_str(&format!("  ... and {} more\n", files.len() - MAX_LISTED_FILES));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    #[tokio::test]
    async fn context_lists_branch_and_changes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path();

        Command::new("git").args(["init"]).current_dir(path).output().unwrap();
        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(path)
            .output()
            .unwrap();
        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(path)
            .output()
            .unwrap();

        let repo = Repository::new(path);
        fs::write(path.join("pending.txt"), "pending\n").unwrap();
        repo.stage_file("pending.txt").await.unwrap();

        let context = build_context(&repo).await.unwrap();
        assert!(context.contains("Current branch:"));
        assert!(context.contains("Staged files:"));
        assert!(context.contains("pending.txt"));
        assert!(!context.contains("Unstaged files:"));
    }
}
