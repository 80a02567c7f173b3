//! Optional feature detection and override resolution
//!
//! Two feature sets gate parts of a template: the content subsystem and the
//! Tailwind CSS integration. Each is auto-detected from the target's declared
//! dependencies and can be forced on or off from the command line.

use crate::error::{Result, ScaffoldError};
use serde::Serialize;
use std::collections::BTreeSet;

/// Dependency keys whose presence reveals a feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSignatures {
    pub content: Vec<String>,
    pub tailwind: Vec<String>,
}

impl Default for FeatureSignatures {
    fn default() -> Self {
        Self {
            content: vec!["@nuxt/content".to_string()],
            tailwind: vec!["@nuxtjs/tailwindcss".to_string(), "tailwindcss".to_string()],
        }
    }
}

/// Boolean state of every optional feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSignals {
    pub content: bool,
    pub tailwind: bool,
}

/// Detect features from the dependency names declared by the target
///
/// Only key presence matters; version ranges are ignored.
pub fn detect(dependencies: &BTreeSet<String>, signatures: &FeatureSignatures) -> FeatureSignals {
    let any = |keys: &[String]| keys.iter().any(|k| dependencies.contains(k));
    FeatureSignals {
        content: any(&signatures.content),
        tailwind: any(&signatures.tailwind),
    }
}

/// Explicit feature flags given by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureOverrides {
    pub all: bool,
    pub with_content: bool,
    pub without_content: bool,
    pub with_tailwind: bool,
    pub without_tailwind: bool,
}

impl FeatureOverrides {
    /// Reject combinations that cannot be honoured
    pub fn validate(&self) -> Result<()> {
        if self.with_content && self.without_content {
            return Err(ScaffoldError::InvalidConfig(
                "--with-content and --without-content cannot be used together".to_string(),
            ));
        }
        if self.with_tailwind && self.without_tailwind {
            return Err(ScaffoldError::InvalidConfig(
                "--with-tailwind and --without-tailwind cannot be used together".to_string(),
            ));
        }
        if self.all && (self.without_content || self.without_tailwind) {
            return Err(ScaffoldError::InvalidConfig(
                "--all cannot be combined with --without-content or --without-tailwind"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Effective signals: force-all, then with-X, then without-X, then detection
    pub fn resolve(&self, detected: FeatureSignals) -> FeatureSignals {
        let pick = |with: bool, without: bool, detected: bool| {
            if self.all || with {
                true
            } else if without {
                false
            } else {
                detected
            }
        };
        FeatureSignals {
            content: pick(self.with_content, self.without_content, detected.content),
            tailwind: pick(self.with_tailwind, self.without_tailwind, detected.tailwind),
        }
    }
}
