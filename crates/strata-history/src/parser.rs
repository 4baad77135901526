//! Line-oriented parsers for `git diff`, `git blame --line-porcelain`, and
//! the custom `git log` format used by [`crate::source::GitSource`].

use chrono::DateTime;
use strata_core::{BlameEntry, ChangeStat, CommitRecord, StrataError};

/// Separates fields within one log record (ASCII unit separator).
pub(crate) const FIELD_SEP: char = '\u{1f}';
/// Terminates one log record (ASCII record separator).
pub(crate) const RECORD_SEP: char = '\u{1e}';
/// `git log --format` string producing records [`parse_log`] understands.
pub(crate) const LOG_FORMAT: &str = "%H%x1f%aI%x1f%an%x1f%s%x1f%b%x1e";

const HASH_LEN: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum DiffState {
    /// Between `diff --git` and the first `@@`: `---`/`+++` are file headers.
    Header,
    /// Inside a hunk: every `+`/`-` line is content.
    Hunk,
}

/// Count added and removed content lines in a unified diff.
///
/// File-header lines (`--- a/x`, `+++ b/x`) are excluded; counts accumulate
/// across every hunk and every file in the input.
///
/// # Examples
///
/// ```
/// use strata_history::parser::parse_diff;
///
/// let diff = "diff --git a/f.rs b/f.rs\n\
///             --- a/f.rs\n\
///             +++ b/f.rs\n\
///             @@ -1,2 +1,2 @@\n\
///             -old\n\
///             +new\n";
/// let stat = parse_diff(diff);
/// assert_eq!((stat.added, stat.removed), (1, 1));
/// assert_eq!(parse_diff("").added, 0);
/// ```
pub fn parse_diff(text: &str) -> ChangeStat {
    let mut stat = ChangeStat::default();
    let mut state = DiffState::Header;

    for line in text.lines() {
        if line.starts_with("diff --git ") {
            state = DiffState::Header;
            continue;
        }
        if line.starts_with("@@") {
            state = DiffState::Hunk;
            continue;
        }
        if state == DiffState::Header && (line.starts_with("+++") || line.starts_with("---")) {
            continue;
        }
        if line.starts_with('+') {
            stat.added += 1;
        } else if line.starts_with('-') {
            stat.removed += 1;
        }
    }

    stat
}

/// Parse `git blame --line-porcelain` output into attribution entries.
///
/// A new entry starts at every line beginning with a 40-hex commit id;
/// following `author ` and `summary ` lines fill it in. Entries appear in
/// stream order, one per header line. A block without a `summary` line still
/// yields an entry with `message: None`.
///
/// # Examples
///
/// ```
/// use strata_history::parser::parse_blame;
///
/// let porcelain = "\
/// abcdef1234567890abcdef1234567890abcdef12 1 1 1
/// author John Doe
/// summary Initial commit
/// \tfn main() {}
/// ";
/// let entries = parse_blame(porcelain);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].hash, "abcdef1234567890abcdef1234567890abcdef12");
/// assert_eq!(entries[0].short_hash(), "abcdef1");
/// assert_eq!(entries[0].author.as_deref(), Some("John Doe"));
/// ```
pub fn parse_blame(text: &str) -> Vec<BlameEntry> {
    let mut entries = Vec::new();
    let mut current: Option<BlameEntry> = None;

    for line in text.lines() {
        if is_commit_header(line) {
            entries.extend(current.take());
            current = Some(BlameEntry {
                hash: line[..HASH_LEN].to_string(),
                author: None,
                message: None,
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if let Some(author) = line.strip_prefix("author ") {
            entry.author = Some(author.to_string());
        } else if let Some(summary) = line.strip_prefix("summary ") {
            entry.message = Some(summary.to_string());
        }
    }

    entries.extend(current);
    entries
}

fn is_commit_header(line: &str) -> bool {
    line.len() >= HASH_LEN
        && line.as_bytes()[..HASH_LEN]
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Parse `git log` output produced with [`LOG_FORMAT`].
///
/// # Errors
///
/// Returns [`StrataError::Parse`] if a record has too few fields or an
/// unparseable date.
pub fn parse_log(text: &str) -> Result<Vec<CommitRecord>, StrataError> {
    let mut commits = Vec::new();

    for record in text.split(RECORD_SEP) {
        let record = record.trim_start_matches(|c: char| c == '\n' || c == '\r');
        if record.trim().is_empty() {
            continue;
        }

        let mut fields = record.splitn(5, FIELD_SEP);
        let (Some(hash), Some(date), Some(author), Some(message)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(StrataError::Parse(format!(
                "malformed log record: {}",
                record.lines().next().unwrap_or_default()
            )));
        };
        let body = fields.next().unwrap_or_default();

        let date = DateTime::parse_from_rfc3339(date.trim())
            .map_err(|e| StrataError::Parse(format!("invalid commit date '{date}': {e}")))?;

        commits.push(CommitRecord {
            hash: hash.trim().to_string(),
            date,
            author: author.to_string(),
            message: message.to_string(),
            body: body.trim_end().to_string(),
            changes: None,
        });
    }

    Ok(commits)
}

/// Split `git diff --name-only` output into paths.
pub fn parse_name_only(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_one_added_and_one_removed() {
        let diff = "\
diff --git a/file.js b/file.js
--- a/file.js
+++ b/file.js
@@ -1,3 +1,4 @@
+new line
 existing line
-removed line
 another line";
        let stat = parse_diff(diff);
        assert_eq!(stat, ChangeStat { added: 1, removed: 1 });
    }

    #[test]
    fn empty_diff_has_no_changes() {
        assert_eq!(parse_diff(""), ChangeStat::default());
    }

    #[test]
    fn header_only_diff_has_no_changes() {
        let diff = "\
diff --git a/old.rs b/new.rs
similarity index 100%
rename from old.rs
rename to new.rs
";
        assert_eq!(parse_diff(diff), ChangeStat::default());
    }

    #[test]
    fn counts_accumulate_across_hunks_and_files() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1,3 +1,4 @@
 fn foo() {
+    bar();
 }
@@ -10,3 +11,3 @@
-    old();
+    new();
+    newer();
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -1,2 +1,1 @@
-gone
-also gone
";
        assert_eq!(parse_diff(diff), ChangeStat { added: 3, removed: 3 });
    }

    #[test]
    fn content_lines_resembling_headers_count_inside_hunks() {
        // An added line whose content is "++counter" renders as "+++counter".
        let diff = "\
diff --git a/c.c b/c.c
--- a/c.c
+++ b/c.c
@@ -1 +1,2 @@
 int x;
+++counter;
";
        assert_eq!(parse_diff(diff), ChangeStat { added: 1, removed: 0 });
    }

    #[test]
    fn no_newline_marker_is_not_content() {
        let diff = "\
--- a/f.rs
+++ b/f.rs
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        assert_eq!(parse_diff(diff), ChangeStat { added: 1, removed: 1 });
    }

    #[test]
    fn blame_emits_one_entry_per_header_line() {
        let blame = "\
abcdef1234567890abcdef1234567890abcdef12 1 1 1
author John Doe
summary Initial commit
abcdef1234567890abcdef1234567890abcdef12 2 2 1
author Jane Smith
summary Fix bug";
        let entries = parse_blame(blame);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].author.as_deref(), Some("John Doe"));
        assert_eq!(entries[1].message.as_deref(), Some("Fix bug"));
    }

    #[test]
    fn blame_entry_without_summary_is_kept() {
        let blame = "\
1111111111111111111111111111111111111111 1 1 1
author Solo
\tcode
2222222222222222222222222222222222222222 2 2 1
author Duo
summary second
";
        let entries = parse_blame(blame);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hash, "1".repeat(40));
        assert!(entries[0].message.is_none());
        assert_eq!(entries[1].message.as_deref(), Some("second"));
    }

    #[test]
    fn blame_ignores_porcelain_noise() {
        let blame = "\
3333333333333333333333333333333333333333 5 5 1
author Real Name
author-mail <real@example.com>
author-time 1700000000
committer Someone Else
summary the summary
previous 4444444444444444444444444444444444444444 src/lib.rs
filename src/lib.rs
\tauthor fake in code
";
        let entries = parse_blame(blame);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author.as_deref(), Some("Real Name"));
        assert_eq!(entries[0].message.as_deref(), Some("the summary"));
    }

    #[test]
    fn uppercase_or_short_hex_is_not_a_header() {
        assert!(!is_commit_header("ABCDEF1234567890ABCDEF1234567890ABCDEF12 1 1"));
        assert!(!is_commit_header("abcdef12"));
        assert!(parse_blame("author orphan\nsummary none\n").is_empty());
    }

    #[test]
    fn parses_log_records_with_bodies() {
        let text = format!(
            "{h1}\u{1f}2024-03-01T10:00:00+02:00\u{1f}Alice\u{1f}fix: crash\u{1f}Longer\nexplanation\n\u{1e}\n\
             {h2}\u{1f}2024-02-01T09:00:00Z\u{1f}Bob\u{1f}initial\u{1f}\u{1e}\n",
            h1 = "a".repeat(40),
            h2 = "b".repeat(40),
        );
        let commits = parse_log(&text).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author, "Alice");
        assert_eq!(commits[0].message, "fix: crash");
        assert_eq!(commits[0].body, "Longer\nexplanation");
        assert_eq!(commits[0].month_key(), "2024-03");
        assert_eq!(commits[1].body, "");
        assert!(commits[1].changes.is_none());
    }

    #[test]
    fn empty_log_is_empty() {
        assert!(parse_log("").unwrap().is_empty());
        assert!(parse_log("\n").unwrap().is_empty());
    }

    #[test]
    fn bad_log_date_is_a_parse_error() {
        let text = "abc\u{1f}yesterday\u{1f}A\u{1f}m\u{1f}\u{1e}";
        assert!(matches!(parse_log(text), Err(StrataError::Parse(_))));
    }

    #[test]
    fn truncated_log_record_is_a_parse_error() {
        assert!(matches!(
            parse_log("abc\u{1f}2024-01-01T00:00:00Z\u{1e}"),
            Err(StrataError::Parse(_))
        ));
    }

    #[test]
    fn name_only_skips_blank_lines() {
        assert_eq!(
            parse_name_only("src/a.rs\n\nsrc/b.rs\n"),
            vec!["src/a.rs", "src/b.rs"]
        );
    }
}
