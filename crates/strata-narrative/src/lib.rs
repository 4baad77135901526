//! Free-text narratives explaining why a file or function exists.
//!
//! A [`Narrator`] (normally [`llm::LlmClient`]) turns commit history into
//! prose. When none is configured, or it fails, [`fallback`] builds a
//! deterministic summary from the same facts so an analysis never fails on
//! account of its narrative.

pub mod fallback;
pub mod llm;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;
use strata_core::{CommitRecord, FileTimePoint, StrataError};
use tracing::warn;

use crate::llm::ChatMessage;

/// Produces narrative text from a chat-style prompt.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, messages: &[ChatMessage]) -> Result<String, StrataError>;
}

/// Who wrote a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    /// A [`Narrator`] response.
    Llm,
    /// The deterministic rule-based summary.
    Fallback,
}

/// The four parts of a file narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSections {
    pub purpose: String,
    pub evolution: String,
    pub status: String,
    pub red_flags: String,
}

/// Explanation of why a file exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNarrative {
    /// Full narrative text.
    pub summary: String,
    /// Sections extracted from a narrator response; absent for fallbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<NarrativeSections>,
    pub source: NarrativeSource,
}

/// Explanation of why a function exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionNarrative {
    pub summary: String,
    pub source: NarrativeSource,
}

/// Narrate a file's history, falling back to rule-based text.
///
/// # Examples
///
/// ```
/// use strata_narrative::{explain_file, NarrativeSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let narrative = explain_file(None, "src/old.rs", &[], None, None).await;
/// assert_eq!(narrative.source, NarrativeSource::Fallback);
/// assert!(narrative.sections.is_none());
/// # }
/// ```
pub async fn explain_file(
    narrator: Option<&dyn Narrator>,
    path: &str,
    history: &[CommitRecord],
    created: Option<&FileTimePoint>,
    last_modified: Option<&FileTimePoint>,
) -> FileNarrative {
    if let Some(narrator) = narrator {
        let messages = [
            prompt::build_system_prompt(),
            prompt::build_file_prompt(path, history, created, last_modified),
        ];
        match narrator.narrate(&messages).await {
            Ok(response) => {
                return FileNarrative {
                    sections: Some(prompt::parse_file_sections(&response)),
                    summary: response,
                    source: NarrativeSource::Llm,
                };
            }
            Err(e) => warn!(path, error = %e, "narrator failed, using fallback"),
        }
    }

    FileNarrative {
        summary: fallback::file_summary(history, created, last_modified).join("\n"),
        sections: None,
        source: NarrativeSource::Fallback,
    }
}

/// Narrate a function's history, falling back to rule-based text.
pub async fn explain_function(
    narrator: Option<&dyn Narrator>,
    name: &str,
    related: &[CommitRecord],
) -> FunctionNarrative {
    if let Some(narrator) = narrator {
        let messages = [
            prompt::build_system_prompt(),
            prompt::build_function_prompt(name, related),
        ];
        match narrator.narrate(&messages).await {
            Ok(summary) => {
                return FunctionNarrative {
                    summary,
                    source: NarrativeSource::Llm,
                };
            }
            Err(e) => warn!(function = name, error = %e, "narrator failed, using fallback"),
        }
    }

    FunctionNarrative {
        summary: fallback::function_summary(name, related),
        source: NarrativeSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused".into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Narrator for Scripted {
        async fn narrate(&self, messages: &[ChatMessage]) -> Result<String, StrataError> {
            self.seen
                .lock()
                .unwrap()
                .extend(messages.iter().map(|m| m.content.clone()));
            self.reply.clone().map_err(StrataError::Llm)
        }
    }

    #[tokio::test]
    async fn narrator_response_is_split_into_sections() {
        let narrator = Scripted::replying(
            "**Original Purpose**: shim\n**Evolution**: grew\n**Current Status**: idle\n**Red Flags**: none",
        );
        let narrative = explain_file(Some(&narrator), "a.rs", &[], None, None).await;
        assert_eq!(narrative.source, NarrativeSource::Llm);
        let sections = narrative.sections.unwrap();
        assert_eq!(sections.purpose, "shim");
        assert_eq!(sections.red_flags, "none");
        let seen = narrator.seen.lock().unwrap();
        assert!(seen[1].contains("File: a.rs"));
    }

    #[tokio::test]
    async fn narrator_failure_falls_back() {
        let narrator = Scripted::failing();
        let narrative = explain_file(Some(&narrator), "a.rs", &[], None, None).await;
        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(narrative.summary, "Inactive (no changes in 1+ year)");
    }

    #[tokio::test]
    async fn function_narrative_uses_response_verbatim() {
        let narrator = Scripted::replying("It validates input.");
        let narrative = explain_function(Some(&narrator), "validate", &[]).await;
        assert_eq!(narrative.summary, "It validates input.");
        assert_eq!(narrative.source, NarrativeSource::Llm);
    }

    #[tokio::test]
    async fn function_narrative_without_narrator() {
        let narrative = explain_function(None, "validate", &[]).await;
        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert!(narrative.summary.contains("no git history"));
    }

    #[test]
    fn fallback_narrative_omits_sections_in_json() {
        let narrative = FileNarrative {
            summary: "x".into(),
            sections: None,
            source: NarrativeSource::Fallback,
        };
        let json = serde_json::to_value(&narrative).unwrap();
        assert!(json.get("sections").is_none());
        assert_eq!(json["source"], "fallback");
    }
}
