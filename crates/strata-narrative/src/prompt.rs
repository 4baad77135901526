use strata_core::{CommitRecord, FileTimePoint};

use crate::llm::ChatMessage;
use crate::NarrativeSections;

const SYSTEM_PROMPT: &str = "\
You are a code archaeologist. You explain why code exists and how it came \
to look the way it does, using only the version-control history you are \
given.

Rules:
- Reference specific commit dates and messages
- Do not invent history that is not in the commits shown
- Call out rushed fixes, TODOs, and hacks when the messages show them
- Be specific, not generic";

/// Commits from the file history included in the prompt.
const PROMPT_COMMITS: usize = 5;

/// Build the system message shared by every narrative request.
///
/// # Examples
///
/// ```
/// use strata_narrative::prompt::build_system_prompt;
///
/// assert!(build_system_prompt().content.contains("archaeologist"));
/// ```
pub fn build_system_prompt() -> ChatMessage {
    ChatMessage::system(SYSTEM_PROMPT)
}

fn format_commits(commits: &[CommitRecord]) -> String {
    commits
        .iter()
        .map(|c| {
            format!(
                "- {} ({}): {}",
                c.date.to_rfc3339(),
                c.short_hash(),
                c.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt asking why a file exists.
///
/// Includes creation and last-modification facts and the five newest
/// commits.
///
/// # Examples
///
/// ```
/// use strata_narrative::prompt::build_file_prompt;
///
/// let prompt = build_file_prompt("src/legacy.js", &[], None, None);
/// assert!(prompt.content.contains("File: src/legacy.js"));
/// assert!(prompt.content.contains("Created: Unknown"));
/// ```
pub fn build_file_prompt(
    path: &str,
    history: &[CommitRecord],
    created: Option<&FileTimePoint>,
    last_modified: Option<&FileTimePoint>,
) -> ChatMessage {
    let created_line = created.map_or_else(
        || "Unknown".to_string(),
        |c| format!("{} by {}", c.date.to_rfc3339(), c.author),
    );
    let modified_line = last_modified.map_or_else(
        || "Unknown".to_string(),
        |m| format!("{} ({} days ago)", m.date.to_rfc3339(), m.days_ago),
    );
    let recent = &history[..history.len().min(PROMPT_COMMITS)];

    ChatMessage::user(format!(
        "Explain why this file exists.\n\n\
         File: {path}\n\
         Created: {created_line}\n\
         Last Modified: {modified_line}\n\n\
         Recent Commit History:\n{}\n\n\
         Provide a concise analysis:\n\
         1. **Original Purpose**: Why was this file created?\n\
         2. **Evolution**: How has it changed over time?\n\
         3. **Current Status**: Is it actively maintained or legacy?\n\
         4. **Red Flags**: Any concerning patterns (rushed fixes, TODOs, hacks)?\n\n\
         Keep it under 150 words.",
        format_commits(recent)
    ))
}

/// Build the user prompt asking why a function exists.
pub fn build_function_prompt(name: &str, related: &[CommitRecord]) -> ChatMessage {
    ChatMessage::user(format!(
        "Analyze this function's history and explain why it exists.\n\n\
         Function: {name}\n\n\
         Commit History:\n{}\n\n\
         Based on the commit messages and timing, provide:\n\
         1. **Why it was created** (original purpose)\n\
         2. **Key changes** (major modifications and why)\n\
         3. **Current state** (is it still needed? any red flags?)\n\
         4. **Risk assessment** (safe to modify/delete?)\n\n\
         Keep the response under 200 words.",
        format_commits(related)
    ))
}

/// Text following `**marker**` up to the next bold marker.
///
/// An optional colon after the marker is skipped, and a dangling list
/// number left before the next marker (`"... text\n2."`) is dropped.
/// Returns an empty string when the marker is absent.
///
/// # Examples
///
/// ```
/// use strata_narrative::prompt::extract_section;
///
/// let text = "1. **Evolution**: grew a cache\n2. **Current Status**: stable";
/// assert_eq!(extract_section(text, "Evolution"), "grew a cache");
/// assert_eq!(extract_section(text, "Current Status"), "stable");
/// assert_eq!(extract_section(text, "Red Flags"), "");
/// ```
pub fn extract_section(text: &str, marker: &str) -> String {
    let needle = format!("**{marker}**");
    let Some(start) = text.find(&needle) else {
        return String::new();
    };
    let rest = &text[start + needle.len()..];
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    let body = match rest.find("**") {
        Some(end) => &rest[..end],
        None => rest,
    };
    trim_list_number(body.trim()).to_string()
}

fn trim_list_number(text: &str) -> &str {
    let Some((head, last)) = text.rsplit_once('\n') else {
        return text;
    };
    let last = last.trim();
    let is_number = last
        .strip_suffix('.')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    if is_number {
        head.trim_end()
    } else {
        text
    }
}

/// Split a file narrative response into its four sections.
pub fn parse_file_sections(response: &str) -> NarrativeSections {
    NarrativeSections {
        purpose: extract_section(response, "Original Purpose"),
        evolution: extract_section(response, "Evolution"),
        status: extract_section(response, "Current Status"),
        red_flags: extract_section(response, "Red Flags"),
    }
}
