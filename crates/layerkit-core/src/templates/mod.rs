//! Template resolution, classification and copying
//!
//! This module provides:
//! - Source resolution (embedded, local directory, git clone with fallback)
//! - The classification rule chain and policy lists
//! - The copy executor
//! - Git version checks

pub mod classify;
pub mod copier;
pub mod fetcher;
pub mod manifest;
pub mod version;

use crate::error::{Result, ScaffoldError};
use std::path::Path;
use walkdir::WalkDir;

pub use classify::{classify, Action, ClassifyContext, Outcome, Reason, Rule, TemplateFile};
pub use copier::{execute, CopyError, ExcludedFile, ExecutionResult};
pub use fetcher::{
    CloneBackend, CloneStrategy, Provenance, SourceRequest, SourceResolver, TemplateRoot,
    TemplateSource,
};
pub use manifest::{ClassificationPolicy, TemplateManifest};

/// Directories never descended into while walking a template
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Nesting limit for the template walk
pub const MAX_WALK_DEPTH: usize = 64;

/// List every regular file under `root`, sorted by normalized path
pub fn enumerate_files(root: &Path) -> Result<Vec<TemplateFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(MAX_WALK_DEPTH)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && SKIPPED_DIRS.iter().any(|d| e.file_name() == *d))
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string());
            ScaffoldError::io(
                format!("Failed to walk {}", path),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| ScaffoldError::io(
                format!("{} escaped the template root", entry.path().display()),
                std::io::Error::other("path outside root"),
            ))?;
        files.push(TemplateFile::from_relative(relative));
    }

    files.sort();
    tracing::debug!(count = files.len(), root = %root.display(), "template files enumerated");
    Ok(files)
}
