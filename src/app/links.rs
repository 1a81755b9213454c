use std::env;
use std::path::Path;

use crate::app::git::Git;

pub const DEFAULT_FALLBACK_REPO_URL: &str = "https://github.com/author/repo";
pub const DEFAULT_LINK_REFERENCE: &str = "main";

/// CI variables consulted when the repository URL or ref isn't given explicitly.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
    pub repository: Option<String>,
    pub ref_name: Option<String>,
    pub head_ref: Option<String>,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            repository: read("GITHUB_REPOSITORY"),
            ref_name: read("GITHUB_REF_NAME"),
            head_ref: read("GITHUB_HEAD_REF"),
        }
    }
}

/// Turns ssh remotes into browsable https URLs and drops a trailing `/` or `.git`.
pub fn normalize_repo_url(url: Option<&str>) -> Option<String> {
    let mut candidate = url?.trim().to_string();
    if candidate.is_empty() {
        return None;
    }

    if candidate.starts_with("git@") {
        if let Some((user_host, path)) = candidate.split_once(':') {
            let host = user_host.split_once('@').map_or(user_host, |(_, host)| host);
            candidate = format!("https://{}/{}", host, path);
        }
    }
    if let Some(rest) = candidate.strip_prefix("ssh://") {
        candidate = format!("https://{}", rest.replacen("git@", "", 1));
    }

    let mut candidate = candidate.trim_end_matches('/');
    if let Some(stripped) = candidate.strip_suffix(".git") {
        candidate = stripped;
    }
    Some(candidate.to_string())
}

/// Explicit URL, then the CI slug, then the `origin` remote, then the fallback.
pub fn resolve_repo_url(
    provided: Option<&str>,
    fallback: Option<&str>,
    directory: &Path,
    ci: &CiEnvironment,
    git: &Git<'_>,
) -> Option<String> {
    if let Some(url) = normalize_repo_url(provided) {
        return Some(url);
    }
    if let Some(slug) = ci.repository.as_deref() {
        if let Some(url) = normalize_repo_url(Some(&format!("https://github.com/{}", slug))) {
            return Some(url);
        }
    }
    if let Some(url) = normalize_repo_url(git.remote_origin_url(directory).as_deref()) {
        return Some(url);
    }
    normalize_repo_url(fallback)
}

/// Explicit ref, then the default-branch override, then CI, then the checked-out branch.
pub fn resolve_link_reference(
    link_ref: Option<&str>,
    default_branch: Option<&str>,
    directory: &Path,
    ci: &CiEnvironment,
    git: &Git<'_>,
) -> String {
    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    non_empty(link_ref)
        .or_else(|| non_empty(default_branch))
        .or_else(|| non_empty(ci.ref_name.as_deref()))
        .or_else(|| non_empty(ci.head_ref.as_deref()))
        .or_else(|| git.current_branch(directory))
        .unwrap_or_else(|| DEFAULT_LINK_REFERENCE.to_string())
}

/// Percent-encodes each segment of `relative_path`, keeping the `/` separators.
pub fn encode_path(relative_path: &str) -> String {
    relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `<repo>/blob/<ref>/<path>`, or just the encoded path when there is no repository.
pub fn build_file_url(repo_url: Option<&str>, link_reference: &str, relative_path: &str) -> String {
    let encoded = encode_path(relative_path);
    match repo_url {
        Some(base) if !base.is_empty() => {
            format!("{}/blob/{}/{}", base.trim_end_matches('/'), link_reference, encoded)
        }
        _ => encoded,
    }
}
