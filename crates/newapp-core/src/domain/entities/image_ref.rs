//! Container image references.
//!
//! An [`ImageReference`] is the parsed form of `[registry/][namespace/]name[:tag][@digest]`.
//! Two references denote the same image iff their
//! [`docker_client_defaults`](ImageReference::docker_client_defaults) forms
//! have equal [`exact`](ImageReference::exact) strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

pub const DEFAULT_REGISTRY: &str = "docker.io";
pub const DEFAULT_NAMESPACE: &str = "library";
pub const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    pub registry: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// A bare reference with only a name, e.g. an output derived from a
    /// pipeline name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            registry: None,
            namespace: None,
            name: name.into(),
            tag: None,
            digest: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidImageReference {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        let input_trimmed = input.trim();
        if input_trimmed.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if input_trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("reference contains whitespace"));
        }

        let (remainder, digest) = match input_trimmed.split_once('@') {
            Some((rest, digest)) => {
                if !digest.contains(':') {
                    return Err(invalid("digest must be algorithm:hex"));
                }
                (rest, Some(digest.to_string()))
            }
            None => (input_trimmed, None),
        };

        let mut segments: Vec<&str> = remainder.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty path segment"));
        }

        let registry = if segments.len() > 1 && looks_like_registry(segments[0]) {
            Some(segments.remove(0).to_string())
        } else {
            None
        };

        let last = segments.pop().ok_or_else(|| invalid("missing image name"))?;
        let (name, tag) = match last.split_once(':') {
            Some((name, tag)) => {
                if tag.is_empty() {
                    return Err(invalid("empty tag"));
                }
                if !is_valid_tag(tag) {
                    return Err(invalid("tag may only contain [A-Za-z0-9_.-]"));
                }
                (name, Some(tag.to_string()))
            }
            None => (last, None),
        };

        if !is_valid_component(name) {
            return Err(invalid("name must be lowercase alphanumerics separated by '.', '_' or '-'"));
        }
        for ns in &segments {
            if !is_valid_component(ns) {
                return Err(invalid("namespace must be lowercase alphanumerics"));
            }
        }

        let namespace = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };

        Ok(Self {
            registry,
            namespace,
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// Fill in the implicit registry, namespace and tag the way a container
    /// client would.
    pub fn docker_client_defaults(&self) -> Self {
        let mut out = self.clone();
        if out.registry.is_none() {
            out.registry = Some(DEFAULT_REGISTRY.to_string());
        }
        if out.namespace.is_none() && out.registry.as_deref() == Some(DEFAULT_REGISTRY) {
            out.namespace = Some(DEFAULT_NAMESPACE.to_string());
        }
        if out.tag.is_none() && out.digest.is_none() {
            out.tag = Some(DEFAULT_TAG.to_string());
        }
        out
    }

    /// The fully written-out reference, omitting absent parts.
    pub fn exact(&self) -> String {
        let mut s = self.repository();
        if let Some(tag) = &self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }

    /// `registry/namespace/name` without tag or digest.
    pub fn repository(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(r) = &self.registry {
            parts.push(r);
        }
        if let Some(ns) = &self.namespace {
            parts.push(ns);
        }
        parts.push(&self.name);
        parts.join("/")
    }

    /// Canonical identity used for equality across sources.
    pub fn identity(&self) -> String {
        self.docker_client_defaults().exact()
    }

    pub fn same_image(&self, other: &ImageReference) -> bool {
        self.identity() == other.identity()
    }

    /// Tag, or `latest` when neither tag nor digest is present.
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exact())
    }
}

impl FromStr for ImageReference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn looks_like_registry(segment: &str) -> bool {
    segment == "localhost" || segment.contains('.') || segment.contains(':')
}

fn is_valid_component(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
        })
        && s.starts_with(|c: char| c.is_ascii_alphanumeric())
        && s.ends_with(|c: char| c.is_ascii_alphanumeric())
}

fn is_valid_tag(s: &str) -> bool {
    s.len() <= 128
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
