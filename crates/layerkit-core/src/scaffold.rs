//! One scaffolding run: validate, detect, resolve, classify, copy

use crate::cleanup::Cleanup;
use crate::error::{Result, ScaffoldError};
use crate::features::{self, FeatureOverrides};
use crate::lock::LockGuard;
use crate::product::ProductConfig;
use crate::report::{Counts, FeatureSummary, Report, SourceSummary};
use crate::runtime::check::check_target;
use crate::runtime::tool::GitTool;
use crate::templates::classify::{classify, exists_in, ClassifyContext};
use crate::templates::copier::execute;
use crate::templates::fetcher::{CloneBackend, SourceRequest, SourceResolver};
use crate::templates::manifest::TemplateManifest;
use crate::templates::enumerate_files;
use std::path::PathBuf;

/// How far a run goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Classify and copy
    Apply,
    /// Classify and report what would be copied
    DryRun,
    /// Classify only
    List,
}

/// Explicit inputs of a run; nothing is read from the environment past this point
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub target: PathBuf,
    pub source: SourceRequest,
    /// Embedded template directory shipped next to the executable
    pub embedded_dir: Option<PathBuf>,
    pub overrides: FeatureOverrides,
    pub clean: bool,
    pub include_docs: bool,
    pub mode: RunMode,
}

/// Run with the system `git`
pub async fn run<C: ProductConfig>(
    config: &C,
    options: &ScaffoldOptions,
    cleanup: &Cleanup,
) -> Result<Report> {
    run_with_backend(config, options, cleanup, GitTool::default()).await
}

pub async fn run_with_backend<C: ProductConfig, B: CloneBackend>(
    config: &C,
    options: &ScaffoldOptions,
    cleanup: &Cleanup,
    backend: B,
) -> Result<Report> {
    // Step 1: Flags
    options.overrides.validate()?;

    // Step 2: Target eligibility
    let target = check_target(&options.target, config.framework_markers())?;

    // Step 3: Features
    let detected = features::detect(
        &target.manifest.dependency_names(),
        &config.feature_signatures(),
    );
    let effective = options.overrides.resolve(detected);
    tracing::info!(?detected, ?effective, "feature signals");

    // Step 4: Lock, only when files will be written
    let _lock = match options.mode {
        RunMode::Apply => Some(LockGuard::acquire(
            &target.root,
            config.lock_file_name(),
            cleanup,
        )?),
        RunMode::DryRun | RunMode::List => None,
    };

    // Step 5: Template source
    let resolver = SourceResolver::new(
        backend,
        config.default_template_source(),
        options.embedded_dir.clone(),
        cleanup.clone(),
    );
    let root = resolver.resolve(&options.source, &target.root).await?;

    let files = enumerate_files(root.dir())?;
    if files.is_empty() {
        return Err(ScaffoldError::EmptyTemplate {
            source_spec: options.source.source.clone(),
        });
    }

    // Step 6: Classify
    let mut policy = config.classification_policy();
    if let Some(manifest) = TemplateManifest::load(root.dir())? {
        tracing::debug!("applying template.yaml");
        manifest.apply_to(&mut policy);
    }
    let exists = exists_in(&target.root);
    let ctx = ClassifyContext {
        policy: &policy,
        clean: options.clean,
        include_docs: options.include_docs,
        features: effective,
        exists: &exists,
    };
    let actions = classify(&files, &ctx);

    // Step 7: Execute
    let (counts, errors) = match options.mode {
        RunMode::List => (Counts::from_actions(&actions), Vec::new()),
        RunMode::DryRun | RunMode::Apply => {
            let simulate = options.mode == RunMode::DryRun;
            let result = execute(&actions, root.dir(), &target.root, simulate).await;
            (Counts::from_result(&result), result.errors)
        }
    };
    tracing::info!(
        add = counts.add,
        skip = counts.skip,
        exclude = counts.exclude,
        error = counts.error,
        "scaffold finished"
    );

    Ok(Report {
        target: target.root.clone(),
        source: SourceSummary {
            spec: options.source.source.clone(),
            git_ref: options.source.git_ref.clone(),
            subdir: root
                .subdir_applied()
                .then(|| options.source.subdir.clone()),
            mode: root.provenance(),
            root: root.dir().to_path_buf(),
        },
        features: FeatureSummary {
            detected,
            effective,
        },
        counts,
        actions,
        errors,
        dry_run: options.mode == RunMode::DryRun,
        list: options.mode == RunMode::List,
    })
}
