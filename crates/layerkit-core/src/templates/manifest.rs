//! Classification policy and the optional per-template manifest

use crate::error::{Result, ScaffoldError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// File name of the optional manifest at a template root
pub const TEMPLATE_MANIFEST: &str = "template.yaml";

/// Names and paths the classifier matches against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    /// Basenames that are never copied (build artifacts, lockfiles, our own files)
    pub always_exclude: BTreeSet<String>,

    /// Documentation basenames, compared case-insensitively
    pub docs: BTreeSet<String>,

    /// Basename of the informational marker dropped in clean mode
    pub info_marker: String,

    /// Directory prefixes owned by the content feature (trailing slash optional)
    pub content_paths: Vec<String>,

    /// Basenames owned by the content feature
    pub content_files: BTreeSet<String>,

    /// Basenames of CSS framework configuration files
    pub tailwind_files: BTreeSet<String>,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            always_exclude: set(&[
                "package.json",
                "package-lock.json",
                "npm-shrinkwrap.json",
                "pnpm-lock.yaml",
                "yarn.lock",
                "bun.lock",
                "bun.lockb",
                ".DS_Store",
                "Thumbs.db",
                TEMPLATE_MANIFEST,
                "add.sh",
                "add.ps1",
            ]),
            docs: set(&[
                "README",
                "README.md",
                "README.txt",
                "LICENSE",
                "LICENSE.md",
                "LICENSE.txt",
                "CHANGELOG",
                "CHANGELOG.md",
                "CONTRIBUTING.md",
                "CODE_OF_CONDUCT.md",
            ]),
            info_marker: "INFO.md".to_string(),
            content_paths: vec!["content/".to_string()],
            content_files: set(&["content.config.ts"]),
            tailwind_files: set(&[
                "tailwind.config.ts",
                "tailwind.config.js",
                "tailwind.config.mjs",
                "tailwind.config.cjs",
            ]),
        }
    }
}

/// Per-template manifest (`template.yaml` at the template root)
///
/// Every list extends the product policy; nothing here can remove a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateManifest {
    #[serde(default)]
    pub always_exclude: Vec<String>,

    #[serde(default)]
    pub docs: Vec<String>,

    #[serde(default)]
    pub content_paths: Vec<String>,

    #[serde(default)]
    pub content_files: Vec<String>,

    #[serde(default)]
    pub tailwind_files: Vec<String>,
}

impl TemplateManifest {
    /// Load `template.yaml` from a template root, if present
    pub fn load(template_root: &Path) -> Result<Option<Self>> {
        let path = template_root.join(TEMPLATE_MANIFEST);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ScaffoldError::io(format!("Failed to read {}", path.display()), e))?;
        let manifest = serde_yaml::from_str(&content).map_err(|e| ScaffoldError::ManifestParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(manifest))
    }

    /// Merge this manifest into a policy
    pub fn apply_to(&self, policy: &mut ClassificationPolicy) {
        policy
            .always_exclude
            .extend(self.always_exclude.iter().cloned());
        policy.docs.extend(self.docs.iter().cloned());
        for prefix in &self.content_paths {
            if !policy.content_paths.contains(prefix) {
                policy.content_paths.push(prefix.clone());
            }
        }
        policy
            .content_files
            .extend(self.content_files.iter().cloned());
        policy
            .tailwind_files
            .extend(self.tailwind_files.iter().cloned());
    }
}
