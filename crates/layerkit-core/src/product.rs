//! Product configuration trait for CLI binaries
//!
//! A binary implements this trait to supply the defaults the scaffolding
//! pipeline needs: where templates come from, what the lock file is called
//! and which files the classifier treats specially.

use crate::features::FeatureSignatures;
use crate::templates::manifest::ClassificationPolicy;

/// Configuration trait for a scaffolding product
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for the binary name and env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Built-in template source; selecting it enables the embedded fast path
    fn default_template_source(&self) -> &'static str;

    /// Environment variable name for overriding the template source
    fn template_source_env(&self) -> &'static str;

    /// Directory next to the executable that holds the embedded template
    fn embedded_dir_name(&self) -> &'static str {
        "template"
    }

    /// Conventional subdirectory templates are nested under in a repository
    fn default_subdir(&self) -> &'static str {
        "template"
    }

    /// Advisory lock file written into the target root while a run writes
    fn lock_file_name(&self) -> &'static str;

    /// Files that mark a directory as a project this product can scaffold into
    fn framework_markers(&self) -> &'static [&'static str];

    /// Dependency keys that reveal each optional feature in the target
    fn feature_signatures(&self) -> FeatureSignatures {
        FeatureSignatures::default()
    }

    /// Lists driving the classifier's rule chain
    fn classification_policy(&self) -> ClassificationPolicy {
        let mut policy = ClassificationPolicy::default();
        policy
            .always_exclude
            .insert(self.lock_file_name().to_string());
        policy
    }

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;
}
