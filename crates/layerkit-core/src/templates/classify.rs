//! Per-file classification into add / skip / exclude
//!
//! The rule chain is data: an ordered list of [`Rule`] values evaluated top to
//! bottom, first match wins. Files no rule claims are skipped when the target
//! already has them and added otherwise.

use super::manifest::ClassificationPolicy;
use crate::features::FeatureSignals;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Slash-normalized path of a file relative to the template root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateFile(String);

impl TemplateFile {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().replace('\\', "/"))
    }

    /// Build from a relative filesystem path, joining components with `/`
    pub fn from_relative(path: &Path) -> Self {
        let joined = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Location of this file under `root`
    pub fn under(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
    }
}

impl fmt::Display for TemplateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TemplateFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Add,
    SkipExists,
    ExcludeAlways,
    ExcludeDocs,
    ExcludeInfo,
    ExcludeFeature,
}

impl Outcome {
    pub fn is_excluded(self) -> bool {
        !matches!(self, Outcome::Add | Outcome::SkipExists)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Add => "add",
            Outcome::SkipExists => "skip-exists",
            Outcome::ExcludeAlways => "exclude-always",
            Outcome::ExcludeDocs => "exclude-docs",
            Outcome::ExcludeInfo => "exclude-info",
            Outcome::ExcludeFeature => "exclude-feature",
        }
    }
}

/// Short reason code attached to exclusions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    Utility,
    Docs,
    InfoClean,
    ContentDisabled,
    TailwindDisabled,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Utility => "utility",
            Reason::Docs => "docs",
            Reason::InfoClean => "info-clean",
            Reason::ContentDisabled => "content-disabled",
            Reason::TailwindDisabled => "tailwind-disabled",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub file: TemplateFile,
    #[serde(rename = "action")]
    pub outcome: Outcome,
    pub reason: Option<Reason>,
}

/// One exclusion rule of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    AlwaysExclude,
    Docs,
    Info,
    FeatureContent,
    FeatureCss,
}

impl Rule {
    /// Rules in evaluation order
    pub const CHAIN: [Rule; 5] = [
        Rule::AlwaysExclude,
        Rule::Docs,
        Rule::Info,
        Rule::FeatureContent,
        Rule::FeatureCss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::AlwaysExclude => "always-exclude",
            Rule::Docs => "doc-exclude",
            Rule::Info => "info-exclude",
            Rule::FeatureContent => "feature-exclude-content",
            Rule::FeatureCss => "feature-exclude-css",
        }
    }

    pub fn outcome(self) -> (Outcome, Reason) {
        match self {
            Rule::AlwaysExclude => (Outcome::ExcludeAlways, Reason::Utility),
            Rule::Docs => (Outcome::ExcludeDocs, Reason::Docs),
            Rule::Info => (Outcome::ExcludeInfo, Reason::InfoClean),
            Rule::FeatureContent => (Outcome::ExcludeFeature, Reason::ContentDisabled),
            Rule::FeatureCss => (Outcome::ExcludeFeature, Reason::TailwindDisabled),
        }
    }

    pub fn matches(self, file: &TemplateFile, ctx: &ClassifyContext<'_>) -> bool {
        let policy = ctx.policy;
        let base = file.basename();
        match self {
            Rule::AlwaysExclude => policy.always_exclude.contains(base),
            Rule::Docs => {
                !ctx.include_docs && policy.docs.iter().any(|d| d.eq_ignore_ascii_case(base))
            }
            Rule::Info => ctx.clean && base == policy.info_marker,
            Rule::FeatureContent => {
                !ctx.features.content
                    && (policy.content_files.contains(base)
                        || policy
                            .content_paths
                            .iter()
                            .any(|prefix| under_dir(file.as_str(), prefix)))
            }
            Rule::FeatureCss => !ctx.features.tailwind && policy.tailwind_files.contains(base),
        }
    }
}

fn under_dir(path: &str, prefix: &str) -> bool {
    let prefix = prefix.replace('\\', "/");
    let dir = prefix.trim_end_matches('/');
    !dir.is_empty()
        && path.len() > dir.len()
        && path.starts_with(dir)
        && path.as_bytes()[dir.len()] == b'/'
}

/// Everything a classification pass depends on
pub struct ClassifyContext<'a> {
    pub policy: &'a ClassificationPolicy,
    pub clean: bool,
    pub include_docs: bool,
    pub features: FeatureSignals,
    pub exists: &'a dyn Fn(&TemplateFile) -> bool,
}

/// Classify a single file
pub fn classify_file(file: &TemplateFile, ctx: &ClassifyContext<'_>) -> Action {
    for rule in Rule::CHAIN {
        if rule.matches(file, ctx) {
            let (outcome, reason) = rule.outcome();
            tracing::debug!(file = %file, rule = rule.name(), "excluded");
            return Action {
                file: file.clone(),
                outcome,
                reason: Some(reason),
            };
        }
    }
    let outcome = if (ctx.exists)(file) {
        Outcome::SkipExists
    } else {
        Outcome::Add
    };
    Action {
        file: file.clone(),
        outcome,
        reason: None,
    }
}

/// Classify every file; output is ordered by path
pub fn classify(files: &[TemplateFile], ctx: &ClassifyContext<'_>) -> Vec<Action> {
    let mut actions: Vec<Action> = files.iter().map(|f| classify_file(f, ctx)).collect();
    actions.sort_by(|a, b| a.file.cmp(&b.file));
    actions
}

/// Existence probe against a target directory
pub fn exists_in(target: &Path) -> impl Fn(&TemplateFile) -> bool + '_ {
    move |file| file.under(target).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn files(paths: &[&str]) -> Vec<TemplateFile> {
        paths.iter().map(TemplateFile::new).collect()
    }

    fn outcome_of<'a>(actions: &'a [Action], path: &str) -> &'a Action {
        actions
            .iter()
            .find(|a| a.file.as_str() == path)
            .unwrap_or_else(|| panic!("no action for {path}"))
    }

    fn scenario() -> Vec<TemplateFile> {
        files(&[
            "content/index.md",
            "tailwind.config.ts",
            "package.json",
            "README.md",
        ])
    }

    #[test]
    fn test_no_flags_excludes_everything() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&scenario(), &ctx);

        let a = outcome_of(&actions, "content/index.md");
        assert_eq!(a.outcome, Outcome::ExcludeFeature);
        assert_eq!(a.reason, Some(Reason::ContentDisabled));
        let a = outcome_of(&actions, "tailwind.config.ts");
        assert_eq!(a.reason, Some(Reason::TailwindDisabled));
        let a = outcome_of(&actions, "package.json");
        assert_eq!(a.outcome, Outcome::ExcludeAlways);
        assert_eq!(a.reason, Some(Reason::Utility));
        let a = outcome_of(&actions, "README.md");
        assert_eq!(a.outcome, Outcome::ExcludeDocs);
        assert!(actions.iter().all(|a| a.outcome != Outcome::Add));
    }

    #[test]
    fn test_all_features_adds_gated_files() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals {
                content: true,
                tailwind: true,
            },
            exists: &nothing,
        };
        let actions = classify(&scenario(), &ctx);

        assert_eq!(outcome_of(&actions, "content/index.md").outcome, Outcome::Add);
        assert_eq!(outcome_of(&actions, "tailwind.config.ts").outcome, Outcome::Add);
        assert_eq!(outcome_of(&actions, "package.json").outcome, Outcome::ExcludeAlways);
        assert_eq!(outcome_of(&actions, "README.md").outcome, Outcome::ExcludeDocs);
    }

    #[test]
    fn test_include_docs_adds_readme() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: true,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["README.md", "docs/readme.md"]), &ctx);
        assert_eq!(outcome_of(&actions, "README.md").outcome, Outcome::Add);
    }

    #[test]
    fn test_docs_match_case_insensitively() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["Readme.md", "sub/license"]), &ctx);
        assert!(actions.iter().all(|a| a.outcome == Outcome::ExcludeDocs));
    }

    #[test]
    fn test_existing_file_is_skipped_even_when_enabled() {
        let policy = ClassificationPolicy::default();
        let existing = |f: &TemplateFile| f.as_str() == "content/index.md";
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals {
                content: true,
                tailwind: true,
            },
            exists: &existing,
        };
        let actions = classify(&scenario(), &ctx);
        let a = outcome_of(&actions, "content/index.md");
        assert_eq!(a.outcome, Outcome::SkipExists);
        assert_eq!(a.reason, None);
    }

    #[test]
    fn test_always_exclude_wins_over_feature_gate() {
        let mut policy = ClassificationPolicy::default();
        policy.always_exclude.insert("tailwind.config.ts".to_string());
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["tailwind.config.ts", "content/package.json"]), &ctx);
        for action in &actions {
            assert_eq!(action.outcome, Outcome::ExcludeAlways);
            assert_eq!(action.reason, Some(Reason::Utility));
        }
    }

    #[test]
    fn test_docs_win_over_content_gate() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["content/README.md"]), &ctx);
        assert_eq!(actions[0].reason, Some(Reason::Docs));
    }

    #[test]
    fn test_info_marker_only_excluded_in_clean_mode() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let mut ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let input = files(&["INFO.md"]);
        assert_eq!(classify(&input, &ctx)[0].outcome, Outcome::Add);

        ctx.clean = true;
        let action = &classify(&input, &ctx)[0];
        assert_eq!(action.outcome, Outcome::ExcludeInfo);
        assert_eq!(action.reason, Some(Reason::InfoClean));
    }

    #[test]
    fn test_backslash_paths_match_content_dir() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["content\\blog\\post.md", "contents/x.md"]), &ctx);
        assert_eq!(outcome_of(&actions, "content/blog/post.md").reason, Some(Reason::ContentDisabled));
        assert_eq!(outcome_of(&actions, "contents/x.md").outcome, Outcome::Add);
    }

    #[test]
    fn test_content_marker_file_is_gated() {
        let policy = ClassificationPolicy::default();
        let nothing = |_: &TemplateFile| false;
        let ctx = ClassifyContext {
            policy: &policy,
            clean: false,
            include_docs: false,
            features: FeatureSignals::default(),
            exists: &nothing,
        };
        let actions = classify(&files(&["content.config.ts"]), &ctx);
        assert_eq!(actions[0].reason, Some(Reason::ContentDisabled));
    }

    #[test]
    fn test_classification_is_deterministic_and_covers_every_file() {
        let policy = ClassificationPolicy::default();
        let existing = |f: &TemplateFile| f.as_str().starts_with("pages/");
        let ctx = ClassifyContext {
            policy: &policy,
            clean: true,
            include_docs: false,
            features: FeatureSignals {
                content: false,
                tailwind: true,
            },
            exists: &existing,
        };
        let input = files(&[
            "pages/index.vue",
            "components/Nav.vue",
            "INFO.md",
            "content/a.md",
            "tailwind.config.js",
            "yarn.lock",
            "LICENSE",
        ]);
        let first = classify(&input, &ctx);
        let mut reversed = input.clone();
        reversed.reverse();
        let second = classify(&reversed, &ctx);
        assert_eq!(first, second);

        assert_eq!(first.len(), input.len());
        let seen: HashSet<_> = first.iter().map(|a| a.file.clone()).collect();
        let expected: HashSet<_> = input.into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_template_file_helpers() {
        let f = TemplateFile::new("a\\b\\c.txt");
        assert_eq!(f.as_str(), "a/b/c.txt");
        assert_eq!(f.basename(), "c.txt");
        assert_eq!(f.under(Path::new("/root")), Path::new("/root/a/b/c.txt"));
        assert_eq!(
            TemplateFile::from_relative(Path::new("x").join("y.md").as_path()).as_str(),
            "x/y.md"
        );
    }

    #[test]
    fn test_outcome_serializes_kebab_case() {
        let action = Action {
            file: TemplateFile::new("content/index.md"),
            outcome: Outcome::ExcludeFeature,
            reason: Some(Reason::ContentDisabled),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["file"], "content/index.md");
        assert_eq!(json["action"], "exclude-feature");
        assert_eq!(json["reason"], "content-disabled");
    }
}
