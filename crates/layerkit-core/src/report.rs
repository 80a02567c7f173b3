//! Run summary and its text / JSON renderings

use crate::error::EXIT_COPY_ERRORS;
use crate::features::FeatureSignals;
use crate::templates::classify::{Action, Outcome};
use crate::templates::copier::{CopyError, ExecutionResult};
use crate::templates::fetcher::Provenance;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub spec: String,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub subdir: Option<String>,
    pub mode: Provenance,
    pub root: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSummary {
    pub detected: FeatureSignals,
    pub effective: FeatureSignals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub add: usize,
    pub skip: usize,
    pub exclude: usize,
    pub error: usize,
}

impl Counts {
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut counts = Counts::default();
        for action in actions {
            match action.outcome {
                Outcome::Add => counts.add += 1,
                Outcome::SkipExists => counts.skip += 1,
                _ => counts.exclude += 1,
            }
        }
        counts
    }

    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            add: result.added.len(),
            skip: result.skipped.len(),
            exclude: result.excluded.len(),
            error: result.errors.len(),
        }
    }
}

/// Everything a reporter needs about one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: PathBuf,
    pub source: SourceSummary,
    pub features: FeatureSummary,
    pub counts: Counts,
    pub actions: Vec<Action>,
    pub errors: Vec<CopyError>,
    pub dry_run: bool,
    pub list: bool,
}

impl Report {
    /// 0 on success, the copy-error status when any file failed
    pub fn exit_code(&self) -> u8 {
        if self.errors.is_empty() {
            0
        } else {
            EXIT_COPY_ERRORS
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary; colors follow `colored`'s global override
    pub fn render_text(&self) -> String {
        let on_off = |b: bool| if b { "on".green() } else { "off".dimmed() };

        let mut source = format!("{} ({})", self.source.spec, self.source.mode);
        if let Some(r) = &self.source.git_ref {
            source.push_str(&format!(" @ {}", r));
        }
        let mut lines = vec![
            format!("{} {}", "Target:".bold(), self.target.display()),
            format!("{} {}", "Source:".bold(), source),
            format!(
                "{} content {} (detected {}), tailwind {} (detected {})",
                "Features:".bold(),
                on_off(self.features.effective.content),
                on_off(self.features.detected.content),
                on_off(self.features.effective.tailwind),
                on_off(self.features.detected.tailwind),
            ),
            String::new(),
        ];

        let add_label = if self.dry_run || self.list {
            "would add"
        } else {
            "added"
        };
        for action in &self.actions {
            let line = match (action.outcome, action.reason) {
                (Outcome::Add, _) => {
                    if self.errors.iter().any(|e| e.file == action.file) {
                        continue;
                    }
                    format!("  {} {} {}", "+".green(), action.file, add_label.dimmed())
                }
                (Outcome::SkipExists, _) => {
                    format!("  {} {} {}", "=".blue(), action.file, "exists".dimmed())
                }
                (_, Some(reason)) => {
                    format!("  {} {} {}", "-".yellow(), action.file, reason.as_str().dimmed())
                }
                (_, None) => format!("  {} {}", "-".yellow(), action.file),
            };
            lines.push(line);
        }
        for error in &self.errors {
            lines.push(format!("  {} {} {}", "!".red(), error.file, error.message.red()));
        }
        lines.push(String::new());

        let mut summary = format!(
            "{} {} {}, {} skipped, {} excluded",
            "Summary:".bold(),
            self.counts.add,
            add_label,
            self.counts.skip,
            self.counts.exclude
        );
        if self.counts.error > 0 {
            summary.push_str(&format!(", {}", format!("{} failed", self.counts.error).red()));
        }
        if self.dry_run {
            summary.push_str(&format!(" {}", "(dry run)".yellow()));
        } else if self.list {
            summary.push_str(&format!(" {}", "(list only)".yellow()));
        }
        lines.push(summary);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
