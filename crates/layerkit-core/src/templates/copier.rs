//! Template file copying driven by classified actions

use super::classify::{Action, Outcome, Reason, TemplateFile};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedFile {
    pub file: TemplateFile,
    pub reason: Reason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyError {
    pub file: TemplateFile,
    pub message: String,
}

/// Per-file results of one executor pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Written, or would be written in simulate mode
    pub added: Vec<TemplateFile>,
    pub skipped: Vec<TemplateFile>,
    pub excluded: Vec<ExcludedFile>,
    pub errors: Vec<CopyError>,
}

impl ExecutionResult {
    fn finalize(&mut self) {
        self.added.sort();
        self.skipped.sort();
        self.excluded.sort_by(|a, b| a.file.cmp(&b.file));
        self.errors.sort_by(|a, b| a.file.cmp(&b.file));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Apply `actions`, copying every `add` from `template_root` to `target_root`
///
/// A failing file is recorded in `errors` and the pass continues.
pub async fn execute(
    actions: &[Action],
    template_root: &Path,
    target_root: &Path,
    simulate: bool,
) -> ExecutionResult {
    let mut result = ExecutionResult::default();

    for action in actions {
        match action.outcome {
            Outcome::Add if simulate => result.added.push(action.file.clone()),
            Outcome::Add => match copy_file(&action.file, template_root, target_root).await {
                Ok(()) => result.added.push(action.file.clone()),
                Err(message) => {
                    tracing::warn!(file = %action.file, %message, "copy failed");
                    result.errors.push(CopyError {
                        file: action.file.clone(),
                        message,
                    });
                }
            },
            Outcome::SkipExists => result.skipped.push(action.file.clone()),
            _ => {
                if let Some(reason) = action.reason {
                    result.excluded.push(ExcludedFile {
                        file: action.file.clone(),
                        reason,
                    });
                }
            }
        }
    }

    result.finalize();
    result
}

async fn copy_file(file: &TemplateFile, template_root: &Path, target_root: &Path) -> Result<(), String> {
    let source = file.under(template_root);
    let dest = file.under(target_root);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
    }

    let content = fs::read(&source)
        .await
        .map_err(|e| format!("Failed to read {}: {}", source.display(), e))?;

    // create_new: a file that appeared since classification is never overwritten
    let mut out = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&dest)
        .await
        .map_err(|e| format!("Failed to create {}: {}", dest.display(), e))?;
    out.write_all(&content)
        .await
        .map_err(|e| format!("Failed to write {}: {}", dest.display(), e))?;
    out.flush()
        .await
        .map_err(|e| format!("Failed to write {}: {}", dest.display(), e))?;

    tracing::debug!(file = %file, "copied");
    Ok(())
}
