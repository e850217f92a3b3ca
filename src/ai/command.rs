use crate::ai::client::strip_code_fences;
use serde::Deserialize;

/// How a commit undo should treat the undone changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Keep the changes staged
    #[default]
    Soft,
    /// Discard the changes
    Hard,
}

/// The closed set of commands the model may map user input onto
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AiCommand {
    Stage { files: Vec<String> },
    Commit { message: String },
    Push,
    Pull,
    Checkout { branch: String },
    Merge { branch: String },
    Reset {
        #[serde(default)]
        mode: ResetMode,
    },
    CheckStatus,
}

/// Outcome of interpreting a natural-language request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The reply parsed as one of the known commands
    Command(AiCommand),
    /// Anything else is a conversational answer
    FreeForm(String),
}

/// JSON first: a reply that parses as a known command object is a command,
/// everything else is free-form text.
pub fn parse_interpretation(reply: &str) -> Interpretation {
    let candidate = strip_code_fences(reply);
    match serde_json::from_str::<AiCommand>(candidate) {
        Ok(command) => Interpretation::Command(command),
        Err(_) => Interpretation::FreeForm(reply.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_command() {
        let reply = r#"{ "command": "stage", "files": ["src/lib.rs", "all"] }"#;
        let parsed = parse_interpretation(reply);

        assert_eq!(
            parsed,
            Interpretation::Command(AiCommand::Stage {
                files: vec!["src/lib.rs".to_string(), "all".to_string()]
            })
        );
    }

    #[test]
    fn test_parse_commit_command() {
        let reply = r#"{"command": "commit", "message": "fix parser edge case"}"#;
        match parse_interpretation(reply) {
            Interpretation::Command(AiCommand::Commit { message }) => {
                assert_eq!(message, "fix parser edge case");
            }
            other => panic!("expected commit command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!(
            parse_interpretation(r#"{"command": "push"}"#),
            Interpretation::Command(AiCommand::Push)
        );
        assert_eq!(
            parse_interpretation(r#"{"command": "check_status"}"#),
            Interpretation::Command(AiCommand::CheckStatus)
        );
    }

    #[test]
    fn test_reset_mode_defaults_to_soft() {
        assert_eq!(
            parse_interpretation(r#"{"command": "reset"}"#),
            Interpretation::Command(AiCommand::Reset {
                mode: ResetMode::Soft
            })
        );
        assert_eq!(
            parse_interpretation(r#"{"command": "reset", "mode": "hard"}"#),
            Interpretation::Command(AiCommand::Reset {
                mode: ResetMode::Hard
            })
        );
    }

    #[test]
    fn test_fenced_json_is_still_a_command() {
        let reply = "```json\n{\"command\": \"checkout\", \"branch\": \"develop\"}\n```";
        match parse_interpretation(reply) {
            Interpretation::Command(AiCommand::Checkout { branch }) => {
                assert_eq!(branch, "develop");
            }
            other => panic!("expected checkout command, got {other:?}"),
        }
    }

    #[test]
    fn test_branch_names_taken_verbatim() {
        let reply = r#"{"command": "merge", "branch": "기능/추가"}"#;
        match parse_interpretation(reply) {
            Interpretation::Command(AiCommand::Merge { branch }) => {
                assert_eq!(branch, "기능/추가");
            }
            other => panic!("expected merge command, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_command_is_free_form() {
        let reply = r#"{"command": "teleport"}"#;
        assert!(matches!(
            parse_interpretation(reply),
            Interpretation::FreeForm(_)
        ));
    }

    #[test]
    fn test_plain_text_is_free_form() {
        let reply = "You have two unstaged files; stage them first, then commit.";
        assert_eq!(
            parse_interpretation(reply),
            Interpretation::FreeForm(reply.to_string())
        );
    }
}
