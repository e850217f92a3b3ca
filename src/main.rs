use gitpal::ai::{Assistant, OllamaClient, SuggestionResponse, context};
use gitpal::audit::AuditLogger;
use gitpal::config::Config;
use gitpal::error::{AppError, AppResult};
use gitpal::git::{Repository, discovery};
use gitpal::worker::Dispatcher;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load_or_default();
    let args: Vec<String> = env::args().skip(1).collect();

    match run(&config, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, args: &[String]) -> AppResult<()> {
    match args.first().map(String::as_str) {
        None | Some("status") => status(config).await,
        Some("history") => history(config, args.get(1)).await,
        Some("suggest") => suggest(config).await,
        Some("explain") => match args.get(1) {
            Some(hash) => explain(config, hash).await,
            None => {
                eprintln!("Usage: gitpal explain <commit-hash>");
                Ok(())
            }
        },
        Some("conflicts") => conflicts(config).await,
        Some("scan") => match args.get(1) {
            Some(root) => scan(config, root, args.get(2)).await,
            None => scan_home().await,
        },
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: gitpal [status | history [n] | suggest | explain <hash> | conflicts | scan [root [depth]]]"
    );
}

async fn open_repo(config: &Config) -> AppResult<Repository> {
    let cwd = env::current_dir()?;
    let repo = Repository::discover_with_config(&cwd, config)?;

    if !repo.executor().git_available().await {
        return Err(AppError::Git(gitpal::GitError::CommandFailed(format!(
            "git executable not found: {}",
            config.git_executable
        ))));
    }

    Ok(repo)
}

async fn status(config: &Config) -> AppResult<()> {
    let repo = open_repo(config).await?;
    let snapshot = repo.snapshot().await?;

    match &snapshot.branch {
        Some(branch) => println!("On branch {branch}"),
        None => println!("Detached HEAD"),
    }

    print_files("Staged", &snapshot.staged);
    print_files("Unstaged", &snapshot.unstaged);
    print_files("Conflicted", &snapshot.conflicted);
    if snapshot.is_clean() {
        println!("Working tree clean");
    }

    // Advisory; an unset upstream simply shows nothing
    let incoming = repo.incoming_commits().await?;
    if !incoming.is_empty() {
        println!("\nIncoming from upstream ({}):", incoming.len());
        for commit in &incoming {
            println!("  {} {} ({})", commit.hash, commit.subject, commit.date);
        }
    }

    Ok(())
}

fn print_files(label: &str, files: &[String]) {
    if files.is_empty() {
        return;
    }
    println!("{label}:");
    for file in files {
        println!("  {file}");
    }
}

async fn history(config: &Config, count: Option<&String>) -> AppResult<()> {
    let limit = count.and_then(|c| c.parse().ok()).unwrap_or(20);
    let repo = open_repo(config).await?;

    for commit in repo.history(limit).await? {
        println!(
            "{}  {:20}  {}  {}",
            commit.hash, commit.date, commit.author, commit.subject
        );
    }
    Ok(())
}

async fn suggest(config: &Config) -> AppResult<()> {
    let repo = open_repo(config).await?;
    let logger = AuditLogger::new()?;

    let size = repo.staged_diff_size().await?;
    if size == 0 {
        println!("Nothing staged; stage changes before asking for a commit message.");
        return Ok(());
    }
    // Same circuit breaker as the commit path: an oversized diff would stall
    // the local model.
    if size > config.max_diff_bytes as usize {
        println!(
            "Staged diff is {size} bytes (limit {}); not sending it to the model.",
            config.max_diff_bytes
        );
        return Ok(());
    }

    let diff = repo.diff_staged().await?;
    let repo_context = context::build_context(&repo).await?;
    let assistant = Assistant::new(Box::new(OllamaClient::new(config)));

    println!("Asking {} for suggestions...", config.ai_model);
    let mut dispatcher = Dispatcher::new();
    let handle = dispatcher.dispatch("suggest-commit-messages", move |_cancel| async move {
        let response = assistant
            .suggest_commit_messages(&diff, &repo_context, 3)
            .await?;
        Ok(response)
    })?;

    let result = handle.join().await;
    logger.log_ai_request(
        "suggest_commit_messages",
        size,
        if result.is_ok() { "ok" } else { "error" },
    )?;

    match result? {
        SuggestionResponse::Suggestions(suggestions) => {
            for (i, s) in suggestions.iter().enumerate() {
                if s.scope.is_empty() {
                    println!("{}. {}", i + 1, s.subject);
                } else {
                    println!("{}. {}({})", i + 1, s.scope, s.subject);
                }
                if !s.body.is_empty() {
                    println!("   {}", s.body);
                }
            }
        }
        SuggestionResponse::Malformed { error, raw } => {
            println!("The model reply did not parse ({error}); raw reply:\n{raw}");
        }
    }
    Ok(())
}

async fn explain(config: &Config, hash: &str) -> AppResult<()> {
    let repo = open_repo(config).await?;
    let logger = AuditLogger::new()?;

    let diff = repo.commit_diff(hash).await?;
    if diff.is_empty() {
        println!("No diff found for {hash}.");
        return Ok(());
    }

    let assistant = Assistant::new(Box::new(OllamaClient::new(config)));
    let hash_owned = hash.to_string();

    println!("Asking {} to explain {hash}...", config.ai_model);
    let mut dispatcher = Dispatcher::new();
    let diff_len = diff.len();
    let handle = dispatcher.dispatch("explain-diff", move |_cancel| async move {
        Ok(assistant
            .explain_diff(&diff, &format!("commit {hash_owned}"))
            .await?)
    })?;

    let result = handle.join().await;
    logger.log_ai_request(
        "explain_diff",
        diff_len,
        if result.is_ok() { "ok" } else { "error" },
    )?;

    println!("{}", result?);
    Ok(())
}

async fn conflicts(config: &Config) -> AppResult<()> {
    let repo = open_repo(config).await?;
    let logger = AuditLogger::new()?;

    let conflicted = repo.conflicted_files().await?;
    if conflicted.is_empty() {
        println!("No conflicted files.");
        return Ok(());
    }

    println!("Conflicted files:");
    for file in &conflicted {
        println!("  {file}");
    }

    // Analyze the first conflict; resolving is the user's move
    let file = conflicted[0].clone();
    let content = repo.file_content(&file).await?;
    let branch = repo
        .current_branch()
        .await
        .unwrap_or_else(|| "?".to_string());
    let assistant = Assistant::new(Box::new(OllamaClient::new(config)));

    println!("\nAsking {} about {file}...", config.ai_model);
    let mut dispatcher = Dispatcher::new();
    let content_len = content.len();
    let handle = dispatcher.dispatch("analyze-merge-conflict", move |_cancel| async move {
        Ok(assistant
            .analyze_merge_conflict(&content, &format!("file {file}, current branch {branch}"))
            .await?)
    })?;

    let result = handle.join().await;
    logger.log_ai_request(
        "analyze_merge_conflict",
        content_len,
        if result.is_ok() { "ok" } else { "error" },
    )?;

    println!("{}", result?);
    Ok(())
}

async fn scan(config: &Config, root: &str, depth: Option<&String>) -> AppResult<()> {
    let max_depth = depth.and_then(|d| d.parse().ok()).unwrap_or(3);
    let root_path = PathBuf::from(root);

    let repos = discovery::find_repos(&root_path, max_depth, false).await?;
    report_repos(config, &repos).await
}

async fn scan_home() -> AppResult<()> {
    println!("Scanning the home directory; this can take a while...");
    let repos = discovery::find_all_repos(60).await?;

    for repo in &repos {
        println!("{}", repo.display());
    }
    println!("{} repositories found", repos.len());
    Ok(())
}

async fn report_repos(config: &Config, repos: &[PathBuf]) -> AppResult<()> {
    for path in repos {
        let repo = Repository::with_config(path, config);
        let branch = repo
            .current_branch()
            .await
            .unwrap_or_else(|| "?".to_string());
        println!("{}  [{branch}]", path.display());
    }
    println!("{} repositories found", repos.len());
    Ok(())
}
