//! Template source resolution: embedded, local directory or git remote
//!
//! Remote sources are shallow-cloned into a temporary directory. An optimized
//! (blob-filtered, sparse) clone is tried first when requested; if it fails or
//! leaves an empty working tree the directory is discarded and a full clone is
//! made instead, so the optimization can never produce an empty scaffold.

use super::version::check_sparse_support;
use crate::cleanup::Cleanup;
use crate::error::{Result, ScaffoldError};
use semver::Version;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;

/// Where a template source points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The built-in default, served from the embedded directory
    Embedded(PathBuf),
    Remote(String),
    Local(PathBuf),
}

impl TemplateSource {
    /// Interpret a source spec given the product default and embedded directory
    pub fn parse(spec: &str, default_source: &str, embedded_dir: Option<&Path>) -> Self {
        if spec == default_source {
            if let Some(dir) = embedded_dir.filter(|d| d.is_dir()) {
                return Self::Embedded(dir.to_path_buf());
            }
        }
        if is_remote(spec) {
            Self::Remote(spec.to_string())
        } else {
            Self::Local(PathBuf::from(spec))
        }
    }
}

/// True for `scheme://...` URLs and scp-like `user@host:path` specs
pub fn is_remote(spec: &str) -> bool {
    if spec.contains("://") {
        return Url::parse(spec).is_ok();
    }
    // user@host:path, but not a path that happens to contain '@'
    match (spec.find('@'), spec.find(':')) {
        (Some(at), Some(colon)) if at < colon => {
            let user = &spec[..at];
            let host = &spec[at + 1..colon];
            !user.is_empty()
                && !host.is_empty()
                && !user.contains('/')
                && !user.contains('\\')
                && !host.contains('/')
                && colon + 1 < spec.len()
        }
        _ => false,
    }
}

/// Which resolution path produced a template root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Embedded,
    Local,
    ClonedFull,
    ClonedOptimized,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Embedded => "embedded",
            Provenance::Local => "local",
            Provenance::ClonedFull => "cloned-full",
            Provenance::ClonedOptimized => "cloned-optimized",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a remote is cloned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStrategy {
    /// `--depth 1 --filter=blob:none --sparse` restricted to the subdirectory
    Optimized,
    /// `--depth 1`
    Full,
}

impl CloneStrategy {
    /// Attempts in order; each must leave a non-empty tree before the next is skipped
    pub fn plan(optimized: bool) -> &'static [CloneStrategy] {
        if optimized {
            &[CloneStrategy::Optimized, CloneStrategy::Full]
        } else {
            &[CloneStrategy::Full]
        }
    }

    fn provenance(self) -> Provenance {
        match self {
            CloneStrategy::Optimized => Provenance::ClonedOptimized,
            CloneStrategy::Full => Provenance::ClonedFull,
        }
    }
}

/// The operations the resolver needs from a version-control tool
#[allow(async_fn_in_trait)]
pub trait CloneBackend {
    /// Fail with [`ScaffoldError::VcsUnavailable`] when the tool cannot run
    async fn probe(&self) -> Result<Option<Version>>;

    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        strategy: CloneStrategy,
        subdir: &str,
    ) -> Result<()>;

    async fn checkout_ref(&self, dest: &Path, git_ref: &str, strategy: CloneStrategy) -> Result<()>;
}

/// What the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub source: String,
    /// `None` keeps the remote's default branch
    pub git_ref: Option<String>,
    pub subdir: String,
    pub optimized: bool,
}

/// A resolved template directory; owns its temporary clone, if any
#[derive(Debug)]
pub struct TemplateRoot {
    dir: PathBuf,
    provenance: Provenance,
    subdir_applied: bool,
    temp: Option<TempDir>,
    cleanup: Option<Cleanup>,
}

impl TemplateRoot {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether the requested subdirectory narrowed the root
    pub fn subdir_applied(&self) -> bool {
        self.subdir_applied
    }

    /// Narrow to `subdir` when the root contains such a directory
    fn narrow(mut self, subdir: &str) -> Self {
        if subdir.is_empty() {
            return self;
        }
        let candidate = self.dir.join(subdir);
        if candidate.is_dir() {
            tracing::debug!(subdir, "using template subdirectory");
            self.dir = candidate;
            self.subdir_applied = true;
        }
        self
    }
}

impl Drop for TemplateRoot {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            if let Err(e) = temp.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary clone");
            }
            if let Some(cleanup) = &self.cleanup {
                cleanup.forget_dir(&path);
            }
        }
    }
}

/// Resolves source specs into template roots
pub struct SourceResolver<B> {
    backend: B,
    default_source: String,
    embedded_dir: Option<PathBuf>,
    cleanup: Cleanup,
}

impl<B: CloneBackend> SourceResolver<B> {
    pub fn new(
        backend: B,
        default_source: impl Into<String>,
        embedded_dir: Option<PathBuf>,
        cleanup: Cleanup,
    ) -> Self {
        Self {
            backend,
            default_source: default_source.into(),
            embedded_dir,
            cleanup,
        }
    }

    /// Resolve `request` into a template root distinct from `target`
    pub async fn resolve(&self, request: &SourceRequest, target: &Path) -> Result<TemplateRoot> {
        let source = TemplateSource::parse(
            &request.source,
            &self.default_source,
            self.embedded_dir.as_deref(),
        );
        tracing::debug!(?source, "resolving template source");

        let root = match source {
            TemplateSource::Embedded(dir) => TemplateRoot {
                dir,
                provenance: Provenance::Embedded,
                subdir_applied: false,
                temp: None,
                cleanup: None,
            },
            TemplateSource::Local(dir) => {
                if !dir.is_dir() {
                    return Err(ScaffoldError::TemplateSourceNotFound(dir));
                }
                TemplateRoot {
                    dir,
                    provenance: Provenance::Local,
                    subdir_applied: false,
                    temp: None,
                    cleanup: None,
                }
            }
            TemplateSource::Remote(url) => self.clone_remote(&url, request).await?,
        };

        let root = root.narrow(&request.subdir);
        if same_entry(root.dir(), target) {
            return Err(ScaffoldError::SelfTargetConflict(root.dir().to_path_buf()));
        }
        tracing::info!(
            provenance = %root.provenance(),
            dir = %root.dir().display(),
            "template source resolved"
        );
        Ok(root)
    }

    async fn clone_remote(&self, url: &str, request: &SourceRequest) -> Result<TemplateRoot> {
        let version = self.backend.probe().await?;

        let mut optimized = request.optimized;
        if optimized {
            if let Some(warning) = check_sparse_support(version.as_ref()) {
                tracing::warn!("{}", warning);
                optimized = false;
            }
        }

        let plan = CloneStrategy::plan(optimized);
        let mut last = None;
        for (idx, strategy) in plan.iter().copied().enumerate() {
            let is_last = idx + 1 == plan.len();
            let root = match self.clone_attempt(url, request, strategy).await {
                Ok(root) => root,
                Err(e) if !is_last => {
                    tracing::warn!(url, error = %e, "optimized clone failed; retrying with a full clone");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if is_last || has_working_tree(root.dir())? {
                last = Some(root);
                break;
            }
            tracing::warn!(
                url,
                "optimized clone produced an empty working tree; retrying with a full clone"
            );
            drop(root);
        }

        last.ok_or_else(|| ScaffoldError::TemplateSourceNotFound(PathBuf::from(url)))
    }

    async fn clone_attempt(
        &self,
        url: &str,
        request: &SourceRequest,
        strategy: CloneStrategy,
    ) -> Result<TemplateRoot> {
        let temp = tempfile::Builder::new()
            .prefix("layerkit-template-")
            .tempdir()
            .map_err(|e| ScaffoldError::io("Failed to create temporary directory", e))?;
        self.cleanup.register_dir(temp.path());

        // Constructed first so the directory is removed on any early return
        let root = TemplateRoot {
            dir: temp.path().to_path_buf(),
            provenance: strategy.provenance(),
            subdir_applied: false,
            temp: Some(temp),
            cleanup: Some(self.cleanup.clone()),
        };

        tracing::debug!(url, ?strategy, dest = %root.dir.display(), "cloning template");
        self.backend
            .clone_repo(url, &root.dir, strategy, &request.subdir)
            .await?;
        if let Some(git_ref) = request.git_ref.as_deref() {
            self.backend
                .checkout_ref(&root.dir, git_ref, strategy)
                .await?;
        }
        Ok(root)
    }
}

/// True when `dir` has any entry besides `.git`
pub fn has_working_tree(dir: &Path) -> Result<bool> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ScaffoldError::io(format!("Failed to read {}", dir.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| ScaffoldError::io(format!("Failed to read {}", dir.display()), e))?;
        if entry.file_name() != ".git" {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether two paths name the same filesystem entry
pub fn same_entry(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (std::fs::metadata(a), std::fs::metadata(b)) {
            (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (a.canonicalize(), b.canonicalize()) {
            (Ok(ca), Ok(cb)) => ca == cb,
            _ => false,
        }
    }
}
