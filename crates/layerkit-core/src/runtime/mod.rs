//! Checks against the host and the target project
//!
//! This module provides:
//! - Target project eligibility (manifest and framework markers)
//! - The `git` tool wrapper used for remote templates

pub mod check;
pub mod tool;

pub use check::{check_target, PackageManifest, TargetProject};
pub use tool::{GitTool, ToolConfig};
