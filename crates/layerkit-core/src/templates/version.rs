//! Git version parsing and capability checks

use semver::Version;

/// First git release with the `sparse-checkout` command
pub const SPARSE_CHECKOUT_SINCE: Version = Version::new(2, 25, 0);

/// Parse the output of `git --version`
///
/// Accepts forms like `git version 2.39.3 (Apple Git-146)` and
/// `git version 2.45.1.windows.1`; only the first three numeric parts count.
pub fn parse_git_version(output: &str) -> Option<Version> {
    let token = output
        .split_whitespace()
        .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))?;
    let mut parts = token
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .take_while(Option::is_some)
        .flatten();
    let major = parts.next()?;
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Returns a warning when the installed git cannot do sparse clones
pub fn check_sparse_support(git_version: Option<&Version>) -> Option<String> {
    let version = git_version?; // Unknown version, let git decide
    if *version < SPARSE_CHECKOUT_SINCE {
        Some(format!(
            "git {} does not support sparse checkout (needs {} or newer); using a full clone",
            version, SPARSE_CHECKOUT_SINCE
        ))
    } else {
        None
    }
}
