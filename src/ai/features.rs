use crate::ai::client::{AiClient, AiError};
use crate::ai::command::{Interpretation, parse_interpretation};
use crate::git::parser::CommitRecord;
use serde::{Deserialize, Serialize};

/// One proposed commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSuggestion {
    #[serde(default)]
    pub scope: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Commit-suggestion replies either parse or they don't; a malformed reply is
/// data for the caller, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionResponse {
    Suggestions(Vec<CommitSuggestion>),
    Malformed { error: String, raw: String },
}

/// Prompt composition and reply parsing for the assistant features.
///
/// Owns no state beyond the client; rendering is entirely the caller's
/// problem.
pub struct Assistant {
    client: Box<dyn AiClient>,
}

impl Assistant {
    pub fn new(client: Box<dyn AiClient>) -> Self {
        Self { client }
    }

    /// Ask for `count` distinct commit messages for the staged diff.
    ///
    /// A reply that fails to parse as JSON comes back as
    /// [`SuggestionResponse::Malformed`] with the raw text; only transport
    /// failures are errors.
    pub async fn suggest_commit_messages(
        &self,
        diff: &str,
        context: &str,
        count: usize,
    ) -> Result<SuggestionResponse, AiError> {
        let prompt = format!(
            "You are a Git commit message expert. Based on this diff, suggest {count} distinct commit messages.\n\n\
             Context: {context}\n\n\
             Diff:\n```\n{diff}\n```\n\n\
             Respond with ONLY a JSON array of {count} objects, no explanations or markdown:\n\
             [\n  {{\n    \"scope\": \"feature or file name\",\n    \"subject\": \"summary of the work\",\n    \"body\": \"longer explanation if needed\"\n  }}\n]"
        );

        let reply = self.client.ask(&prompt).await?;
        Ok(Self::parse_suggestions(&reply))
    }

    pub(crate) fn parse_suggestions(reply: &str) -> SuggestionResponse {
        match serde_json::from_str::<Vec<CommitSuggestion>>(reply) {
            Ok(suggestions) => SuggestionResponse::Suggestions(suggestions),
            Err(list_err) => {
                // A bare object counts as a one-element list
                match serde_json::from_str::<CommitSuggestion>(reply) {
                    Ok(single) => SuggestionResponse::Suggestions(vec![single]),
                    Err(_) => SuggestionResponse::Malformed {
                        error: list_err.to_string(),
                        raw: reply.to_string(),
                    },
                }
            }
        }
    }

    /// Explain what a diff does in human-readable terms.
    pub async fn explain_diff(&self, diff: &str, context: &str) -> Result<String, AiError> {
        let prompt = format!(
            "You are a code change explainer. Explain what this diff does in clear terms:\n\
             1. Summary of the change\n\
             2. What was removed and why\n\
             3. What was added and why\n\
             4. Impact and potential concerns\n\n\
             Context: {context}\n\n\
             Diff:\n```\n{diff}\n```"
        );
        self.client.ask(&prompt).await
    }

    /// Review code and point out issues and improvements.
    pub async fn review_code(
        &self,
        code: &str,
        file_path: &str,
        focus: &str,
    ) -> Result<String, AiError> {
        let focus_line = if focus.is_empty() {
            String::new()
        } else {
            format!("Focus on {focus}.\n")
        };
        let prompt = format!(
            "You are an expert code reviewer. Review the following code and provide:\n\
             1. Potential issues (bugs, logic errors, edge cases)\n\
             2. Code quality suggestions\n\
             3. Specific improvements with examples\n\n\
             File: {file_path}\n{focus_line}\n\
             Code:\n```\n{code}\n```"
        );
        self.client.ask(&prompt).await
    }

    /// Analyze a merge conflict and suggest a resolution strategy.
    pub async fn analyze_merge_conflict(
        &self,
        conflict: &str,
        context: &str,
    ) -> Result<String, AiError> {
        let prompt = format!(
            "You are a Git merge conflict expert. Analyze the following merge conflict and provide:\n\
             1. What each side of the conflict is trying to do\n\
             2. Likely cause of the conflict\n\
             3. Recommended resolution strategy\n\
             4. Code example of the resolved version if applicable\n\n\
             Context: {context}\n\n\
             Conflict:\n```\n{conflict}\n```"
        );
        self.client.ask(&prompt).await
    }

    /// General Q&A about git and the current project.
    pub async fn answer_question(&self, question: &str, context: &str) -> Result<String, AiError> {
        let prompt = format!(
            "You are a helpful Git and development assistant. Answer the following question clearly and concisely.\n\n\
             Context: {context}\n\n\
             Question: {question}"
        );
        self.client.ask(&prompt).await
    }

    /// Summarize recent history at a project level.
    pub async fn summarize_history(&self, history: &[CommitRecord]) -> Result<String, AiError> {
        if history.is_empty() {
            return Ok("There is no commit history to analyze.".to_string());
        }

        let listing: String = history
            .iter()
            .map(|c| format!("- {} (by {}, {})\n", c.subject, c.author, c.date))
            .collect();

        let prompt = format!(
            "You are a project manager AI. Analyze the following recent commit history and summarize the project's progress:\n\
             1. What major features were added?\n\
             2. What important bugs were fixed?\n\
             3. What is the general development trend?\n\n\
             Recent commits:\n{listing}"
        );
        self.client.ask(&prompt).await
    }

    /// Map a natural-language request onto the closed command set, or fall
    /// back to a conversational answer.
    pub async fn interpret(&self, input: &str, context: &str) -> Result<Interpretation, AiError> {
        let prompt = format!(
            "You are a Git assistant that translates natural language into executable commands.\n\
             Available commands and their JSON format:\n\
             - {{ \"command\": \"stage\", \"files\": [\"file1\", \"all\"] }}\n\
             - {{ \"command\": \"commit\", \"message\": \"your commit message\" }}\n\
             - {{ \"command\": \"push\" }}\n\
             - {{ \"command\": \"pull\" }}\n\
             - {{ \"command\": \"checkout\", \"branch\": \"branch-name\" }}\n\
             - {{ \"command\": \"merge\", \"branch\": \"branch-to-merge\" }}\n\
             - {{ \"command\": \"reset\", \"mode\": \"soft|hard\" }} (default to soft unless the user says discard/hard)\n\
             - {{ \"command\": \"check_status\" }} (for questions like \"anything to do?\")\n\n\
             Rules:\n\
             1. One command at a time: for multi-step requests, emit only the FIRST action.\n\
             2. If an action targets another branch, the first action is a checkout of that branch.\n\
             3. Extract branch and file names exactly as written, including non-English characters.\n\n\
             If the request matches a command, respond ONLY with the JSON, no explanations or markdown.\n\
             Otherwise answer the question conversationally.\n\n\
             Context:\n{context}\n\n\
             User request: \"{input}\""
        );

        let reply = self.client.ask(&prompt).await?;
        Ok(parse_interpretation(&reply))
    }
}
