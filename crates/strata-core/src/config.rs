use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Top-level configuration loaded from `.strata.toml`.
///
/// Resolution order: CLI flags > local config file > defaults.
///
/// # Examples
///
/// ```
/// use strata_core::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.history.depth, 10);
/// assert_eq!(config.scoring.dead_code_threshold_days, 365);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// History query depths and keyword sets.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Scoring knobs exposed to users.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Dead-code directory scan settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Narrative provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Io`] if the file cannot be read, or
    /// [`StrataError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, StrataError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Toml`] if parsing fails, or
    /// [`StrataError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::StrataConfig;
    ///
    /// let toml = r#"
    /// [scoring]
    /// dead_code_threshold_days = 180
    /// "#;
    /// let config = StrataConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.scoring.dead_code_threshold_days, 180);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StrataError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StrataError> {
        if self.history.stat_concurrency == 0 {
            return Err(StrataError::Config(
                "history.stat_concurrency must be at least 1".into(),
            ));
        }
        if self.history.depth == 0 {
            return Err(StrataError::Config("history.depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// History query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Commits to fetch for a file analysis (default: 10).
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Commits scanned by keyword search and function analysis (default: 50).
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,
    /// Commits inspected when collecting co-changed files (default: 20).
    #[serde(default = "default_related_depth")]
    pub related_depth: usize,
    /// Co-changed files to report (default: 5).
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    /// Keywords flagging a commit as suspicious in file analysis.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Maximum per-commit diff queries in flight (default: 8).
    #[serde(default = "default_stat_concurrency")]
    pub stat_concurrency: usize,
}

fn default_depth() -> usize {
    10
}

fn default_search_depth() -> usize {
    50
}

fn default_related_depth() -> usize {
    20
}

fn default_related_limit() -> usize {
    5
}

fn default_keywords() -> Vec<String> {
    ["fix", "bug", "hotfix", "urgent", "hack", "todo", "temporary"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_stat_concurrency() -> usize {
    8
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            search_depth: default_search_depth(),
            related_depth: default_related_depth(),
            related_limit: default_related_limit(),
            keywords: default_keywords(),
            stat_concurrency: default_stat_concurrency(),
        }
    }
}

/// User-tunable scoring configuration.
///
/// Fixed policy values (band cutoffs, penalty sizes) live in
/// `strata_score::policy` and are not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Age in days after which an untouched file is considered dead (default: 365).
    #[serde(default = "default_threshold_days")]
    pub dead_code_threshold_days: u64,
    /// Entries reported in repository top-N lists (default: 10).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_threshold_days() -> u64 {
    365
}

fn default_top_n() -> usize {
    10
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dead_code_threshold_days: default_threshold_days(),
            top_n: default_top_n(),
        }
    }
}

/// Directory scan configuration for dead-code detection.
///
/// # Examples
///
/// ```
/// use strata_core::ScanConfig;
///
/// let scan = ScanConfig::default();
/// assert!(scan.skip_dirs.iter().any(|d| d == "node_modules"));
/// assert!(scan.extensions.iter().any(|e| e == "py"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Source file extensions to consider, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory names never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    [
        "js", "jsx", "ts", "tsx", "py", "java", "cpp", "c", "h", "cs", "go", "rb", "php", "swift",
        "rs",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_skip_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        "coverage",
        ".next",
        "__pycache__",
        "vendor",
        "target",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

/// Narrative (LLM) provider configuration.
///
/// # Examples
///
/// ```
/// use strata_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Set to `false` to always use the rule-based fallback narrative.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Provider name (e.g. `"openai"`, `"ollama"`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}
