//! Source repositories and the build inputs that travel with them.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use super::common::is_dns_subdomain;
use super::dockerfile::Dockerfile;
use crate::domain::{BuildStrategy, DomainError};

const REMOTE_SCHEMES: &[&str] = &["http", "https", "git", "ssh", "file", "git+ssh"];

// ── SourceRepository ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SourceLocation {
    Remote(Url),
    Local(PathBuf),
    /// Stand-in for a literal Dockerfile supplied without any repository.
    Synthetic,
}

/// A place source code comes from, plus what inspection found there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRepository {
    /// The location as the user wrote it, without `#ref`.
    display: String,
    location: SourceLocation,
    git_ref: Option<String>,
    pub context_dir: Option<String>,
    pub strategy: Option<BuildStrategy>,
    pub info: Option<SourceRepositoryInfo>,
}

impl SourceRepository {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidSourceRepository {
            location: input.to_string(),
            reason: reason.to_string(),
        };

        let (location, git_ref) = match input.split_once('#') {
            Some((loc, r)) if !r.is_empty() => (loc, Some(r.to_string())),
            Some((loc, _)) => (loc, None),
            None => (input, None),
        };
        if location.is_empty() {
            return Err(invalid("location is empty"));
        }

        let parsed = if location.contains("://") {
            let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
            if !REMOTE_SCHEMES.contains(&url.scheme()) {
                return Err(invalid("unsupported URL scheme"));
            }
            SourceLocation::Remote(url)
        } else if let Some(url) = scp_to_url(location) {
            SourceLocation::Remote(url)
        } else {
            SourceLocation::Local(PathBuf::from(location))
        };

        Ok(Self {
            display: location.to_string(),
            location: parsed,
            git_ref,
            context_dir: None,
            strategy: None,
            info: None,
        })
    }

    /// A repository with no tree whose only content is a literal Dockerfile.
    pub fn for_dockerfile(dockerfile: Dockerfile) -> Self {
        Self {
            display: String::new(),
            location: SourceLocation::Synthetic,
            git_ref: None,
            context_dir: None,
            strategy: Some(BuildStrategy::Docker),
            info: Some(SourceRepositoryInfo {
                terms: Vec::new(),
                dockerfile: Some(dockerfile),
            }),
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.location, SourceLocation::Synthetic)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.location, SourceLocation::Remote(_))
    }

    /// Key used to de-duplicate repositories named more than once.
    pub fn key(&self) -> String {
        match &self.git_ref {
            Some(r) => format!("{}#{r}", self.display),
            None => self.display.clone(),
        }
    }

    /// URI recorded on build definitions.
    pub fn uri(&self) -> String {
        match &self.location {
            SourceLocation::Remote(url) => url.to_string(),
            SourceLocation::Local(path) => path.display().to_string(),
            SourceLocation::Synthetic => String::new(),
        }
    }

    /// Last path segment without a `.git` suffix, if it makes a usable name.
    pub fn name(&self) -> Option<String> {
        let path = match &self.location {
            SourceLocation::Remote(url) => url.path().to_string(),
            SourceLocation::Local(path) => path.to_string_lossy().into_owned(),
            SourceLocation::Synthetic => return None,
        };
        let segment = path.trim_end_matches('/').rsplit('/').next()?;
        let segment = segment.strip_suffix(".git").unwrap_or(segment);
        match segment {
            "" | "." | ".." => None,
            s => Some(s.to_string()),
        }
    }

    pub fn dockerfile(&self) -> Option<&Dockerfile> {
        self.info.as_ref().and_then(|i| i.dockerfile.as_ref())
    }

    pub fn terms(&self) -> &[String] {
        self.info.as_ref().map_or(&[], |i| i.terms.as_slice())
    }

    /// Replace the location, e.g. with a canonicalized local path.
    pub fn with_local_path(mut self, path: PathBuf) -> Self {
        if matches!(self.location, SourceLocation::Local(_)) {
            self.location = SourceLocation::Local(path);
        }
        self
    }
}

impl fmt::Display for SourceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// `true` if the token names a remote repository (URL or SCP-like address).
pub fn is_remote_location(token: &str) -> bool {
    let location = token.split('#').next().unwrap_or(token);
    if let Some((scheme, rest)) = location.split_once("://") {
        return REMOTE_SCHEMES.contains(&scheme) && !rest.is_empty();
    }
    scp_to_url(location).is_some()
}

/// `user@host:path` style addresses, rewritten as `ssh://` URLs.
///
/// A bare `name:tag` is an image reference, not an address, so a host must
/// carry a user or a dot. A numeric first path segment is a registry port.
fn scp_to_url(location: &str) -> Option<Url> {
    let (authority, path) = location.split_once(':')?;
    if authority.is_empty() || path.is_empty() || authority.contains('/') {
        return None;
    }
    let (user, host) = match authority.split_once('@') {
        Some((u, h)) => (Some(u), h),
        None => (None, authority),
    };
    if host.is_empty() || (user.is_none() && !host.contains('.')) {
        return None;
    }
    let first = path.split('/').next().unwrap_or("");
    if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let user_part = user.map(|u| format!("{u}@")).unwrap_or_default();
    Url::parse(&format!("ssh://{user_part}{host}/{}", path.trim_start_matches('/'))).ok()
}

/// Result of inspecting a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceRepositoryInfo {
    /// Language or platform terms from the first matching detector.
    pub terms: Vec<String>,
    pub dockerfile: Option<Dockerfile>,
}

// ── SecretMount ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretMount {
    pub name: String,
    pub destination_dir: String,
}

impl SecretMount {
    /// Parse `name[:destination]`; a bare name mounts at `.`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let (name, dest) = input.split_once(':').unwrap_or((input, "."));
        if !is_dns_subdomain(name) {
            return Err(DomainError::InvalidSecret {
                secret: input.to_string(),
                reason: "secret name must be a valid DNS subdomain".into(),
            });
        }
        let dest = if dest.is_empty() { "." } else { dest };
        Ok(Self {
            name: name.to_string(),
            destination_dir: dest.to_string(),
        })
    }

    /// Parse a list, keeping the first mount for each name.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, DomainError> {
        let mut out: Vec<Self> = Vec::new();
        for input in inputs {
            let secret = Self::parse(input.as_ref())?;
            if !out.iter().any(|s| s.name == secret.name) {
                out.push(secret);
            }
        }
        Ok(out)
    }
}

// ── Source images ─────────────────────────────────────────────────────────────

/// Copy mapping from an auxiliary image into the build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSourcePath {
    pub source_path: String,
    pub destination_dir: String,
}

impl ImageSourcePath {
    /// Parse `/absolute/source:relative/destination`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidSourceImagePath {
            path: input.to_string(),
            reason: reason.to_string(),
        };
        let (src, dst) = input
            .split_once(':')
            .ok_or_else(|| invalid("expected [source-dir]:[destination-dir]"))?;
        if !src.starts_with('/') {
            return Err(invalid("source path must be absolute"));
        }
        if dst.starts_with('/') {
            return Err(invalid("destination path must be relative"));
        }
        Ok(Self {
            source_path: src.to_string(),
            destination_dir: if dst.is_empty() { ".".into() } else { dst.to_string() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_url_with_ref() {
        let repo = SourceRepository::parse("https://github.com/openshift/ruby-hello-world.git#beta4").unwrap();
        assert!(repo.is_remote());
        assert_eq!(repo.git_ref(), Some("beta4"));
        assert_eq!(repo.name().as_deref(), Some("ruby-hello-world"));
        assert_eq!(repo.key(), "https://github.com/openshift/ruby-hello-world.git#beta4");
    }

    #[test]
    fn parses_scp_address() {
        let repo = SourceRepository::parse("git@github.com:openshift/origin.git").unwrap();
        assert!(repo.is_remote());
        assert_eq!(repo.uri(), "ssh://git@github.com/openshift/origin.git");
        assert_eq!(repo.name().as_deref(), Some("origin"));
    }

    #[test]
    fn image_references_are_not_remote() {
        assert!(!is_remote_location("ruby:2.2"));
        assert!(!is_remote_location("centos/ruby-22-centos7:latest"));
        assert!(!is_remote_location("registry.example.com:5000/ns/image"));
        assert!(is_remote_location("git://example.com/repo.git"));
        assert!(!is_remote_location("ftp://example.com/repo"));
    }

    #[test]
    fn dot_has_no_name() {
        let repo = SourceRepository::parse(".").unwrap();
        assert_eq!(repo.name(), None);
        let repo = repo.with_local_path(PathBuf::from("/work/my-app"));
        assert_eq!(repo.name().as_deref(), Some("my-app"));
    }

    #[test]
    fn synthetic_repository_displays_empty() {
        let repo = SourceRepository::for_dockerfile(Dockerfile::parse("FROM centos"));
        assert!(repo.is_synthetic());
        assert_eq!(repo.to_string(), "");
        assert_eq!(repo.strategy, Some(BuildStrategy::Docker));
    }

    #[test]
    fn secrets_default_destination_and_dedup() {
        let secrets = SecretMount::parse_all(&["foo:/var", "bar", "foo:/other"]).unwrap();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].destination_dir, "/var");
        assert_eq!(secrets[1].destination_dir, ".");
        assert!(SecretMount::parse("Bad_Name").is_err());
    }

    #[test]
    fn source_image_paths_require_absolute_source() {
        let p = ImageSourcePath::parse("/opt/app/build:out").unwrap();
        assert_eq!(p.destination_dir, "out");
        assert!(ImageSourcePath::parse("relative:out").is_err());
        assert!(ImageSourcePath::parse("/abs").is_err());
    }
}
