//! Repository URL validation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::models::RepositoryRef;

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([\w\-]+)/([\w\-]+)/?$").expect("valid GitHub URL pattern")
});

/// Parse `https://github.com/{owner}/{name}` (optional trailing slash).
pub fn parse_repo_url(url: &str) -> Result<RepositoryRef, ValidationError> {
    let caps = GITHUB_URL.captures(url).ok_or_else(|| ValidationError {
        url: url.to_string(),
    })?;
    Ok(RepositoryRef::new(&caps[1], &caps[2]))
}
