use std::path::PathBuf;

/// Errors that can occur while mining and scoring history.
///
/// Library crates use this type directly; it implements
/// [`miette::Diagnostic`] so the binary can report it with `?`.
///
/// # Examples
///
/// ```
/// use strata_core::StrataError;
///
/// let err = StrataError::SourceUnavailable("not a git repository".into());
/// assert!(err.to_string().contains("not a git repository"));
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StrataError {
    /// The repository cannot be opened, or the path is not under version control.
    #[error("history unavailable: {0}")]
    #[diagnostic(
        code(strata::source_unavailable),
        help("run strata inside a git checkout and pass paths that git tracks")
    )]
    SourceUnavailable(String),

    /// A single version-control query failed.
    #[error("git query failed: {0}")]
    #[diagnostic(code(strata::query_failed))]
    QueryFailed(String),

    /// A requested file does not exist.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(strata::file_not_found))]
    FileNotFound(PathBuf),

    /// A requested function could not be located in its file.
    #[error("function \"{name}\" not found in {}", .path.display())]
    #[diagnostic(
        code(strata::function_not_found),
        help("pass --lines START-END to analyze an explicit range")
    )]
    FunctionNotFound {
        /// Function name that was searched for.
        name: String,
        /// File that was searched.
        path: PathBuf,
    },

    /// Version-control output could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Narrative (LLM) API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(strata::config), help("run `strata init` to write a default .strata.toml"))]
    Config(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StrataError {
    /// Whether this error must abort the enclosing analysis.
    ///
    /// Only [`StrataError::QueryFailed`] may be absorbed, and only at the
    /// optional-query sites that document a default.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StrataError::QueryFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StrataError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn query_failed_is_the_only_recoverable_error() {
        assert!(!StrataError::QueryFailed("diff".into()).is_fatal());
        assert!(StrataError::SourceUnavailable("x".into()).is_fatal());
        assert!(StrataError::FileNotFound(PathBuf::from("a.rs")).is_fatal());
        assert!(StrataError::Parse("bad".into()).is_fatal());
    }

    #[test]
    fn function_not_found_names_function_and_file() {
        let err = StrataError::FunctionNotFound {
            name: "handleLogin".into(),
            path: PathBuf::from("src/auth.js"),
        };
        assert_eq!(
            err.to_string(),
            "function \"handleLogin\" not found in src/auth.js"
        );
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = StrataError::FileNotFound(PathBuf::from("/tmp/missing.rs"));
        assert!(err.to_string().contains("/tmp/missing.rs"));
    }
}
