use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Appends a line per executed operation and AI request to a per-user log,
/// rotating once it grows past [`MAX_LOG_SIZE`].
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a logger writing to the default path.
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create a logger with a custom log path.
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Default log path: ~/.config/gitpal/history.log
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitpal")
            .join("history.log"))
    }

    /// Record a git operation and how it exited.
    pub fn log_operation(
        &self,
        description: &str,
        repo_path: &Path,
        outcome: &str,
    ) -> std::io::Result<()> {
        let entry = format!(
            "[{}] [{}] [{}] {}\n",
            Utc::now().to_rfc3339(),
            repo_path.display(),
            outcome,
            description
        );
        self.append(&entry)
    }

    /// Record an AI request: which feature asked, how large the prompt was
    /// and how the call ended. Prompt content itself is never logged.
    pub fn log_ai_request(
        &self,
        feature: &str,
        prompt_bytes: usize,
        outcome: &str,
    ) -> std::io::Result<()> {
        let entry = format!(
            "[{}] [ai:{}] [{} bytes] {}\n",
            Utc::now().to_rfc3339(),
            feature,
            prompt_bytes,
            outcome
        );
        self.append(&entry)
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(entry.as_bytes())?;
        file.flush()
    }

    /// Rotate the log once it exceeds [`MAX_LOG_SIZE`].
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        if fs::metadata(&self.log_path)?.len() > MAX_LOG_SIZE {
            // history.log -> history.log.1
            fs::rename(&self.log_path, self.log_path.with_extension("log.1"))?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
