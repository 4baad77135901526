//! Text (`Display`) and Markdown renderings of the analysis reports.

use std::fmt::{self, Write as _};

use chrono::{DateTime, FixedOffset};
use strata_core::{CommitRecord, Insight, Priority, Recommendation, Severity};

use crate::deadcode::DeadCodeReport;
use crate::file::FileReport;
use crate::function::FunctionReport;
use crate::repo::RepoReport;

/// Rows shown in list sections.
const DEAD_ROWS: usize = 10;
const SUSPICIOUS_ROWS: usize = 5;
/// Widest bar drawn for contributor and timeline charts.
const BAR_WIDTH: usize = 30;

fn day(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn day_or_unknown(date: Option<&DateTime<FixedOffset>>) -> String {
    date.map_or_else(|| "Unknown".to_string(), day)
}

fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn commit_line(c: &CommitRecord) -> String {
    format!("{} ({}) {}", day(&c.date), c.short_hash(), clip(&c.message, 60))
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "HIGH",
        Severity::Medium => "MEDIUM",
        Severity::Info => "INFO",
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "HIGH",
        Priority::Medium => "MEDIUM",
        Priority::Low => "LOW",
    }
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    "#".repeat((count * BAR_WIDTH).div_ceil(max).max(1))
}

fn write_insights(f: &mut fmt::Formatter<'_>, insights: &[Insight]) -> fmt::Result {
    if insights.is_empty() {
        return Ok(());
    }
    writeln!(f, "Insights")?;
    for i in insights {
        writeln!(f, "  [{}] {}", severity_label(i.severity), i.message)?;
        if let Some(s) = &i.suggestion {
            writeln!(f, "    {s}")?;
        }
    }
    writeln!(f)
}

fn write_recommendations(f: &mut fmt::Formatter<'_>, recs: &[Recommendation]) -> fmt::Result {
    if recs.is_empty() {
        return Ok(());
    }
    writeln!(f, "Recommendations")?;
    for r in recs {
        writeln!(f, "  [{}] {}: {}", priority_label(r.priority), r.kind, r.message)?;
    }
    writeln!(f)
}

fn md_insights(out: &mut String, insights: &[Insight]) {
    if insights.is_empty() {
        return;
    }
    out.push_str("## Insights\n\n");
    for i in insights {
        let _ = writeln!(out, "- **{}** {}", i.severity, i.message);
    }
    out.push('\n');
}

fn md_recommendations(out: &mut String, recs: &[Recommendation]) {
    if recs.is_empty() {
        return;
    }
    out.push_str("## Recommendations\n\n");
    for r in recs {
        let _ = writeln!(out, "- **{}** `{}`: {}", r.priority, r.kind, r.message);
    }
    out.push('\n');
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File Analysis: {}", self.file)?;
        writeln!(f, "==============")?;
        let created = self.metadata.created.as_ref();
        let modified = self.metadata.last_modified.as_ref();
        writeln!(
            f,
            "Created: {} by {}",
            day_or_unknown(created.map(|c| &c.date)),
            created.map_or("Unknown", |c| c.author.as_str())
        )?;
        match modified {
            Some(m) => writeln!(f, "Last Modified: {} ({} days ago)", day(&m.date), m.days_ago)?,
            None => writeln!(f, "Last Modified: Unknown")?,
        }
        writeln!(
            f,
            "Commits: {} | Authors: {}\n",
            self.metadata.total_commits, self.metadata.unique_authors
        )?;

        writeln!(f, "Statistics")?;
        writeln!(f, "  Lines Added: {}", self.stats.totals.total_added)?;
        writeln!(f, "  Lines Removed: {}", self.stats.totals.total_removed)?;
        writeln!(f, "  Avg Change Size: {} lines", self.stats.totals.average_change_size)?;
        writeln!(
            f,
            "  Change Velocity: {} ({:.2} commits/month)\n",
            self.stats.velocity.band, self.stats.velocity.commits_per_month
        )?;

        writeln!(f, "Narrative")?;
        for line in self.narrative.summary.lines() {
            writeln!(f, "  {line}")?;
        }
        writeln!(f)?;

        if !self.code_smells.is_empty() {
            writeln!(f, "Code Smells")?;
            for smell in &self.code_smells {
                writeln!(
                    f,
                    "  [{}] {}: {}",
                    severity_label(smell.severity),
                    smell.kind,
                    smell.message
                )?;
            }
            writeln!(f)?;
        }

        write_recommendations(f, &self.recommendations)?;

        if !self.history.is_empty() {
            writeln!(f, "Recent Commits")?;
            for c in &self.history {
                let stat = c.changes.unwrap_or_default();
                writeln!(
                    f,
                    "  {} {} +{} -{}",
                    commit_line(c),
                    c.author,
                    stat.added,
                    stat.removed
                )?;
            }
            writeln!(f)?;
        }

        if !self.related_files.is_empty() {
            writeln!(f, "Frequently Changed Together")?;
            for r in &self.related_files {
                writeln!(f, "  {} ({} commits)", r.file, r.commits)?;
            }
        }
        Ok(())
    }
}

impl FileReport {
    /// Render the file report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# File Analysis: `{}`\n", self.file);
        if let Some(c) = &self.metadata.created {
            let _ = writeln!(out, "- **Created:** {} by {}", day(&c.date), c.author);
        }
        if let Some(m) = &self.metadata.last_modified {
            let _ = writeln!(
                out,
                "- **Last modified:** {} ({} days ago)",
                day(&m.date),
                m.days_ago
            );
        }
        let _ = writeln!(
            out,
            "- **Commits:** {} | **Authors:** {}",
            self.metadata.total_commits, self.metadata.unique_authors
        );
        let _ = writeln!(
            out,
            "- **Lines:** +{} / -{} | **Velocity:** {} ({:.2}/month)\n",
            self.stats.totals.total_added,
            self.stats.totals.total_removed,
            self.stats.velocity.band,
            self.stats.velocity.commits_per_month
        );

        out.push_str("## Narrative\n\n");
        match &self.narrative.sections {
            Some(s) => {
                let _ = writeln!(out, "**Original Purpose:** {}\n", s.purpose);
                let _ = writeln!(out, "**Evolution:** {}\n", s.evolution);
                let _ = writeln!(out, "**Current Status:** {}\n", s.status);
                let _ = writeln!(out, "**Red Flags:** {}\n", s.red_flags);
            }
            None => {
                for line in self.narrative.summary.lines() {
                    let _ = writeln!(out, "- {line}");
                }
                out.push('\n');
            }
        }

        md_insights(&mut out, &self.code_smells);
        md_recommendations(&mut out, &self.recommendations);

        if !self.history.is_empty() {
            out.push_str("## Recent Commits\n\n| Date | Commit | Author | Message |\n|---|---|---|---|\n");
            for c in &self.history {
                let _ = writeln!(
                    out,
                    "| {} | `{}` | {} | {} |",
                    day(&c.date),
                    c.short_hash(),
                    c.author,
                    clip(&c.message, 60).replace('|', "\\|")
                );
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for FunctionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Function Analysis: {}", self.function.name)?;
        writeln!(f, "==================")?;
        writeln!(
            f,
            "Location: {} lines {} ({} lines)\n",
            self.file, self.function.line_range, self.function.line_count
        )?;

        writeln!(f, "Metrics")?;
        writeln!(
            f,
            "  Complexity: {} ({})",
            self.metrics.complexity.level, self.metrics.complexity.score
        )?;
        writeln!(f, "  Contributors: {}", self.metrics.contributors)?;
        writeln!(f, "  Stability: {}", self.metrics.stability)?;
        writeln!(
            f,
            "  Last Modified: {}\n",
            day_or_unknown(self.metrics.last_modified.as_ref())
        )?;

        writeln!(f, "Narrative")?;
        for line in self.narrative.summary.lines() {
            writeln!(f, "  {line}")?;
        }
        writeln!(f)?;

        write_recommendations(f, &self.recommendations)?;

        if !self.blame.is_empty() {
            writeln!(f, "Blame")?;
            for b in &self.blame {
                writeln!(
                    f,
                    "  {} {}: {}",
                    b.short_hash(),
                    b.author.as_deref().unwrap_or("unknown"),
                    b.message.as_deref().unwrap_or("")
                )?;
            }
            writeln!(f)?;
        }

        if !self.related_commits.is_empty() {
            writeln!(f, "Related Commits")?;
            for c in &self.related_commits {
                writeln!(f, "  {}", commit_line(c))?;
            }
        }
        Ok(())
    }
}

impl FunctionReport {
    /// Render the function report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Function Analysis: `{}`\n", self.function.name);
        let _ = writeln!(
            out,
            "- **Location:** `{}` lines {} ({} lines)",
            self.file, self.function.line_range, self.function.line_count
        );
        let _ = writeln!(
            out,
            "- **Complexity:** {} ({})",
            self.metrics.complexity.level, self.metrics.complexity.score
        );
        let _ = writeln!(out, "- **Contributors:** {}", self.metrics.contributors);
        let _ = writeln!(out, "- **Stability:** {}\n", self.metrics.stability);
        let _ = writeln!(out, "## Narrative\n\n{}\n", self.narrative.summary);
        md_recommendations(&mut out, &self.recommendations);
        if !self.related_commits.is_empty() {
            out.push_str("## Related Commits\n\n");
            for c in &self.related_commits {
                let _ = writeln!(out, "- {}", commit_line(c));
            }
            out.push('\n');
        }
        let _ = writeln!(out, "```\n{}\n```", self.function.code);
        out
    }
}

impl fmt::Display for DeadCodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dead Code Scan: {}", self.directory)?;
        writeln!(f, "===============")?;
        writeln!(
            f,
            "Files: {} | Dead: {} | Suspicious: {} | Active: {} (threshold: {} days)\n",
            self.total_files,
            self.dead_code.len(),
            self.suspicious.len(),
            self.active.len(),
            self.threshold_days
        )?;

        write_insights(f, &self.insights)?;

        if !self.dead_code.is_empty() {
            writeln!(f, "Dead Code Files")?;
            for p in self.dead_code.iter().take(DEAD_ROWS) {
                writeln!(
                    f,
                    "  {} {} days ({}, {}) {}",
                    p.path,
                    p.days_ago,
                    day(&p.date),
                    p.author,
                    clip(&p.message, 40)
                )?;
            }
            writeln!(f)?;
        }

        if !self.suspicious.is_empty() {
            writeln!(f, "Suspicious Files")?;
            for p in self.suspicious.iter().take(SUSPICIOUS_ROWS) {
                writeln!(f, "  {} ({} days ago)", p.path, p.days_ago)?;
            }
        }
        Ok(())
    }
}

impl DeadCodeReport {
    /// Render the scan as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Dead Code Scan: `{}`\n", self.directory);
        let _ = writeln!(
            out,
            "**Files:** {} | **Dead:** {} | **Suspicious:** {} | **Active:** {}\n",
            self.total_files,
            self.dead_code.len(),
            self.suspicious.len(),
            self.active.len()
        );
        md_insights(&mut out, &self.insights);
        if !self.dead_code.is_empty() {
            out.push_str("## Dead Code Files\n\n| File | Days | Last Change | Author |\n|---|---|---|---|\n");
            for p in self.dead_code.iter().take(DEAD_ROWS) {
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {} | {} |",
                    p.path,
                    p.days_ago,
                    day(&p.date),
                    p.author
                );
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for RepoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository Analysis")?;
        writeln!(f, "===================")?;
        writeln!(
            f,
            "Commits: {} | Contributors: {} | {} to {}\n",
            self.summary.total_commits,
            self.summary.unique_authors,
            day_or_unknown(self.summary.date_range.from.as_ref()),
            day_or_unknown(self.summary.date_range.to.as_ref())
        )?;

        let h = &self.health_metrics;
        writeln!(f, "Health")?;
        writeln!(f, "  Overall: {} ({}/100)", h.overall_health, h.health_score)?;
        writeln!(f, "  Bug Fix Ratio: {}%", h.bug_fix_ratio)?;
        writeln!(f, "  Change Concentration: {}%", h.change_concentration)?;
        writeln!(f, "  Activity Trend: {}\n", h.activity_trend)?;

        write_insights(f, &self.insights)?;

        if !self.top_files.is_empty() {
            writeln!(f, "Hotspot Files")?;
            for (rank, file) in self.top_files.iter().enumerate() {
                writeln!(f, "  {:>2}. {} ({} commits)", rank + 1, file.file, file.commits)?;
            }
            writeln!(f)?;
        }

        if !self.top_contributors.is_empty() {
            writeln!(f, "Top Contributors")?;
            let max = self.top_contributors.first().map_or(0, |c| c.commits);
            for c in &self.top_contributors {
                writeln!(f, "  {:<25} {} {}", c.author, bar(c.commits, max), c.commits)?;
            }
            writeln!(f)?;
        }

        if !self.timeline.is_empty() {
            writeln!(f, "Activity Timeline")?;
            let max = self.timeline.iter().map(|m| m.commits).max().unwrap_or(0);
            for m in &self.timeline {
                writeln!(f, "  {}  {} {}", m.month, bar(m.commits, max), m.commits)?;
            }
        }
        Ok(())
    }
}

impl RepoReport {
    /// Render the repository report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let h = &self.health_metrics;
        out.push_str("# Repository Analysis\n\n");
        let _ = writeln!(
            out,
            "**Commits:** {} | **Contributors:** {} | **Health:** {} ({}/100)\n",
            self.summary.total_commits,
            self.summary.unique_authors,
            h.overall_health,
            h.health_score
        );
        let _ = writeln!(
            out,
            "- Bug fix ratio: {}%\n- Change concentration: {}%\n- Activity trend: {}\n",
            h.bug_fix_ratio, h.change_concentration, h.activity_trend
        );
        md_insights(&mut out, &self.insights);
        if !self.top_files.is_empty() {
            out.push_str("## Hotspot Files\n\n| File | Commits |\n|---|---|\n");
            for file in &self.top_files {
                let _ = writeln!(out, "| `{}` | {} |", file.file, file.commits);
            }
            out.push('\n');
        }
        if !self.timeline.is_empty() {
            out.push_str("## Activity Timeline\n\n| Month | Commits |\n|---|---|\n");
            for m in &self.timeline {
                let _ = writeln!(out, "| {} | {} |", m.month, m.commits);
            }
            out.push('\n');
        }
        out
    }
}
