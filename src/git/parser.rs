/// Log format requested from git: hash, author, relative date, subject.
pub const LOG_FORMAT: &str = "%H|%an|%ar|%s";

/// Length commit hashes are truncated to for display.
pub const SHORT_HASH_LEN: usize = 7;

/// A single commit parsed from delimiter-joined log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

/// Split newline-delimited output into trimmed, non-empty lines.
pub fn parse_name_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `git branch --list` output, stripping the current-branch marker.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_prefix("* ").unwrap_or(line).to_string())
        .collect()
}

/// Parse log output in [`LOG_FORMAT`] into commit records.
///
/// Each line must split on `|` into exactly four fields; the subject keeps any
/// further delimiters. Lines that do not split cleanly are dropped rather than
/// failing the whole listing, since log output can contain uncommon encodings.
pub fn parse_history(output: &str) -> Vec<CommitRecord> {
    let mut records = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.splitn(4, '|').collect();
        if parts.len() != 4 {
            continue;
        }

        records.push(CommitRecord {
            hash: parts[0].chars().take(SHORT_HASH_LEN).collect(),
            author: parts[1].to_string(),
            date: parts[2].to_string(),
            subject: parts[3].to_string(),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_lines() {
        let output = "src/main.rs\n  padded.txt  \n\nREADME.md\n";
        let lines = parse_name_lines(output);

        assert_eq!(lines, vec!["src/main.rs", "padded.txt", "README.md"]);
    }

    #[test]
    fn test_parse_branch_list_strips_marker() {
        let output = "* main\n  feature-x\n  release/1.0\n";
        let branches = parse_branch_list(output);

        assert_eq!(branches, vec!["main", "feature-x", "release/1.0"]);
    }

    #[test]
    fn test_parse_history_single_line() {
        let output = "abc1234def5678|Alice|3 days ago|fix bug\n";
        let records = parse_history(output);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash, "abc1234");
        assert_eq!(records[0].author, "Alice");
        assert_eq!(records[0].date, "3 days ago");
        assert_eq!(records[0].subject, "fix bug");
    }

    #[test]
    fn test_parse_history_subject_keeps_extra_delimiters() {
        let output = "abc1234def|Bob|2 weeks ago|feat: add a|b toggle";
        let records = parse_history(output);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "feat: add a|b toggle");
    }

    #[test]
    fn test_parse_history_drops_malformed_lines() {
        let output = "abc1234def|Alice|3 days ago|fix bug\ngarbage line\nonly|two\n";
        let records = parse_history(output);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author, "Alice");
    }

    #[test]
    fn test_parse_history_length_bounded_by_input() {
        let output = "a|b|c|d\nbroken\ne|f|g|h\n";
        let records = parse_history(output);

        assert!(records.len() <= output.lines().count());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_history_short_hash_tolerated() {
        let output = "ab12|Carol|just now|initial import";
        let records = parse_history(output);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash, "ab12");
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_name_lines("").is_empty());
        assert!(parse_branch_list("").is_empty());
        assert!(parse_history("").is_empty());
    }
}
