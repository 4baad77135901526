use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use strata_core::{OutputFormat, StrataConfig, SystemClock};
use strata_dig::function::LineRange;
use strata_dig::Excavator;
use strata_history::source::GitSource;
use strata_narrative::llm::LlmClient;

const CONFIG_FILE: &str = ".strata.toml";

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Code archaeology: mine git history to explain why code looks the way it does",
    long_about = "Strata digs through a repository's git history to explain why a file or\n\
                   function exists, who shaped it, and whether it is still alive.\n\n\
                   Examples:\n  \
                     strata file src/app.js               Explain a file's history\n  \
                     strata function src/app.js parse     Explain a single function\n  \
                     strata dead-code src -r              Find files nobody has touched\n  \
                     strata repo --since 2024-01-01       Repository activity and health"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .strata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging for strata (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Explain why a file exists and how it has changed
    #[command(long_about = "Explain why a file exists and how it has changed.\n\n\
        Combines creation and last-change facts, recent commits with line stats,\n\
        files that change alongside it, bug-fix patterns, and a narrative.\n\n\
        Examples:\n  strata file src/app.js\n  strata file src/app.js --depth 25 --format json")]
    File {
        /// File path relative to the repository root
        path: String,

        /// Number of recent commits to examine (default from config: 10)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Explain a single function: who wrote it and how risky it is
    Function {
        /// File containing the function
        path: String,

        /// Function name
        name: String,

        /// Explicit line range, e.g. 10-50
        #[arg(long)]
        lines: Option<LineRange>,
    },
    /// Find source files untouched for longer than a threshold
    DeadCode {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Descend into subdirectories
        #[arg(long, short)]
        recursive: bool,

        /// Days without change after which a file is dead (default from config: 365)
        #[arg(long)]
        threshold: Option<u64>,
    },
    /// Summarize repository activity, hotspots, and health
    Repo {
        /// Only consider commits after this date (anything git accepts)
        #[arg(long)]
        since: Option<String>,

        /// Entries in the hotspot and contributor lists (default from config: 10)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write a default .strata.toml in the current directory
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# Strata Configuration

[history]
# Commits examined by `strata file` (overridden by --depth)
# depth = 10
# search_depth = 50
# related_depth = 20
# related_limit = 5
# Words that mark a commit as a fix or workaround
# keywords = ["fix", "bug", "hotfix", "urgent", "hack", "todo", "temporary"]
# Parallel per-commit git queries
# stat_concurrency = 8

[scoring]
# dead_code_threshold_days = 365
# top_n = 10

[scan]
# extensions = ["js", "jsx", "ts", "tsx", "py", "java", "cpp", "c", "h", "cs", "go", "rb", "php", "swift", "rs"]
# skip_dirs = ["node_modules", ".git", "dist", "build", "coverage", ".next", "__pycache__", "vendor", "target"]

[llm]
# Set to false to always use the rule-based narrative
# enabled = true
# provider = "openai"
# model = "gpt-4o"
# api_key = "sk-..."        # or set OPENAI_API_KEY
# base_url = "http://localhost:11434"
"#;

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if use_color {
        println!("\x1b[1mstrata\x1b[0m v{version}: code archaeology for git repositories\n");
    } else {
        println!("strata v{version}: code archaeology for git repositories\n");
    }
    println!("Quick start:");
    println!("  strata file <path>               Explain a file's history");
    println!("  strata function <path> <name>    Explain a single function");
    println!("  strata dead-code [dir] -r        Find files nobody has touched");
    println!("  strata repo                      Repository activity and health");
    println!("  strata init                      Create a .strata.toml config file");
    println!("\nRun 'strata --help' for all options.");
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,strata=debug,strata_core=debug,strata_history=debug,strata_score=debug,strata_narrative=debug,strata_dig=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<StrataConfig> {
    let mut config = match path {
        Some(path) => StrataConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                StrataConfig::from_file(default_path)?
            } else {
                StrataConfig::default()
            }
        }
    };
    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
    }
    Ok(config)
}

fn progress(use_color: bool, message: &str) {
    if use_color {
        eprintln!("\x1b[36m{message}\x1b[0m");
    } else {
        eprintln!("{message}");
    }
}

fn spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn emit<R>(format: OutputFormat, report: &R, markdown: impl FnOnce(&R) -> String) -> Result<()>
where
    R: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", markdown(report)),
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}

fn excavator(config: StrataConfig) -> Result<Excavator<GitSource>> {
    let root = Path::new(".");
    let source = GitSource::open(root)?;
    let narrator = LlmClient::from_config(&config.llm)?;
    let mut dig = Excavator::new(root, source, Arc::new(SystemClock), config);
    if let Some(client) = narrator {
        tracing::debug!(model = client.model(), "narrative provider configured");
        dig = dig.with_narrator(Box::new(client));
    }
    Ok(dig)
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    let command = match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
            return Ok(());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "strata", &mut std::io::stdout());
            return Ok(());
        }
        Some(command) => command,
    };

    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;

    match command {
        Command::File { path, depth } => {
            let dig = excavator(config)?;
            let depth = depth.unwrap_or(dig.config().history.depth);
            progress(use_color, &format!("Excavating history of {path}..."));
            let pb = spinner("Reading history");
            let report = dig.analyze_file(&path, depth).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            emit(format, &report?, |r| r.to_markdown())?;
        }
        Command::Function { path, name, lines } => {
            let dig = excavator(config)?;
            progress(use_color, &format!("Excavating function {name} in {path}..."));
            let pb = spinner("Reading blame and history");
            let report = dig.analyze_function(&path, &name, lines).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            emit(format, &report?, |r| r.to_markdown())?;
        }
        Command::DeadCode {
            dir,
            recursive,
            threshold,
        } => {
            let threshold = threshold.unwrap_or(config.scoring.dead_code_threshold_days);
            let dig = excavator(config)?;
            progress(
                use_color,
                &format!("Scanning {} for dead code...", dir.display()),
            );
            let pb = spinner("Checking last modifications");
            let report = dig.scan_dead_code(&dir, recursive, threshold).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            emit(format, &report?, |r| r.to_markdown())?;
        }
        Command::Repo { since, top } => {
            let top = top.unwrap_or(config.scoring.top_n);
            let dig = excavator(config)?;
            progress(use_color, "Excavating repository history...");
            let pb = spinner("Aggregating commits");
            let report = dig.analyze_repository(since.as_deref(), top).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            emit(format, &report?, |r| r.to_markdown())?;
        }
        Command::Init | Command::Completions { .. } => {}
    }

    Ok(())
}
