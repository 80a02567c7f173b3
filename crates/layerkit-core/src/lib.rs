//! Layerkit Core - additive scaffolding into existing projects
//!
//! Given a template source and a target project, every template file is
//! classified as add, skip or exclude, and the add set is copied into the
//! target. Existing files are never overwritten.
//!
//! # Architecture
//!
//! - **Source resolution** ([`templates::fetcher`]) - embedded directory, local
//!   path or shallow git clone, with a full-clone fallback when an optimized
//!   sparse clone comes back empty
//! - **Feature detection** ([`features`]) - optional feature sets inferred from
//!   the target's `package.json` and merged with explicit overrides
//! - **Classification** ([`templates::classify`]) - an ordered rule chain, first
//!   match wins
//! - **Execution** ([`templates::copier`]) - copies the add set, recording
//!   per-file failures without stopping
//! - **Orchestration** ([`scaffold`]) - one run, end to end, guarded by an
//!   advisory [`lock`] and a [`cleanup`] registry
//!
//! # Example Usage
//!
//! ```ignore
//! use layerkit_core::{scaffold, Cleanup, ProductConfig};
//!
//! let cleanup = Cleanup::new();
//! let report = scaffold::run(&MyConfig, &options, &cleanup).await?;
//! println!("{}", report.render_text());
//! cleanup.run();
//! ```

pub mod cleanup;
pub mod error;
pub mod features;
pub mod lock;
pub mod product;
pub mod report;
pub mod runtime;
pub mod scaffold;
pub mod templates;

// Re-export main types for convenience
pub use cleanup::Cleanup;
pub use error::{ErrorCategory, ScaffoldError};
pub use features::{FeatureOverrides, FeatureSignals};
pub use product::ProductConfig;
pub use report::Report;
pub use scaffold::{run, RunMode, ScaffoldOptions};
pub use templates::{SourceRequest, TemplateFile};
