//! Target project checks: directory validity, manifest and framework markers

use crate::error::{Result, ScaffoldError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Project manifest every target must carry
pub const PACKAGE_MANIFEST: &str = "package.json";

/// The parts of `package.json` the scaffolder reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, Value>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, Value>,
}

impl PackageManifest {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| ScaffoldError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(ScaffoldError::ManifestParse {
                path: path.to_path_buf(),
                message: "expected a JSON object".to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| ScaffoldError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Runtime and build dependency names
    pub fn dependency_names(&self) -> BTreeSet<String> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .cloned()
            .collect()
    }
}

/// A target directory that passed eligibility checks
#[derive(Debug, Clone)]
pub struct TargetProject {
    pub root: PathBuf,
    pub manifest: PackageManifest,
    /// Framework marker files found in the root
    pub markers: Vec<String>,
}

/// Validate the target directory and read its manifest
pub fn check_target(root: &Path, framework_markers: &[&str]) -> Result<TargetProject> {
    if !root.exists() {
        return Err(ScaffoldError::TargetNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScaffoldError::TargetNotDirectory(root.to_path_buf()));
    }

    let manifest_path = root.join(PACKAGE_MANIFEST);
    if !manifest_path.is_file() {
        return Err(ScaffoldError::TargetNotEligible {
            path: root.to_path_buf(),
            reason: format!("no {} found", PACKAGE_MANIFEST),
        });
    }
    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|e| ScaffoldError::io(format!("Failed to read {}", manifest_path.display()), e))?;
    let manifest = PackageManifest::parse(&content, &manifest_path).map_err(|e| {
        ScaffoldError::TargetNotEligible {
            path: root.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let markers: Vec<String> = framework_markers
        .iter()
        .filter(|m| root.join(m).is_file())
        .map(|m| m.to_string())
        .collect();
    if markers.is_empty() {
        return Err(ScaffoldError::TargetNotEligible {
            path: root.to_path_buf(),
            reason: format!("none of {} found", framework_markers.join(", ")),
        });
    }

    Ok(TargetProject {
        root: root.to_path_buf(),
        manifest,
        markers,
    })
}
