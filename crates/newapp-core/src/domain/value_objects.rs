//! Domain value objects: BuildStrategy, MatchKind, ResolverKind, Protocol,
//! PortSpec, ReferenceKind.
//!
//! # Design
//!
//! These are pure value types: `Copy`, equality-by-value, no identity. This
//! file defines the types, their string representations, and their
//! `FromStr` parsers. Behaviour that depends on several values lives in the
//! services that consume them.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── BuildStrategy ─────────────────────────────────────────────────────────────

/// How a pipeline turns source into an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// Inject source into a builder image.
    Source,
    /// Run a Dockerfile.
    Docker,
}

impl BuildStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "sti" | "s2i" => Ok(Self::Source),
            "docker" => Ok(Self::Docker),
            other => Err(DomainError::InvalidStrategy(other.to_string())),
        }
    }
}

// ── MatchKind ─────────────────────────────────────────────────────────────────

/// Discriminator of what a [`ComponentMatch`](crate::domain::ComponentMatch)
/// resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// An image that knows how to build source code.
    BuilderImage,
    /// An image already tracked by the platform.
    RuntimeImage,
    /// A plain container image from a registry or the local daemon.
    DockerImage,
    /// A parameterised template.
    Template,
}

impl MatchKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuilderImage => "builder-image",
            Self::RuntimeImage => "runtime-image",
            Self::DockerImage => "docker-image",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ResolverKind ──────────────────────────────────────────────────────────────

/// Which resolution policy a component input is bound to.
///
/// The classifier and reference builder assign one of these; the resolver
/// framework maps it to concrete searchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverKind {
    /// Images and templates, unique exact-or-inexact policy.
    Default,
    /// Images only (`--image`, `--docker-image`).
    ImageOnly,
    /// Templates only (`--template`).
    TemplateOnly,
    /// Builder images matching detected language terms, first match wins.
    SourceLanguage,
    /// The base image of a Dockerfile; never fails with "no match".
    DockerfileBase,
}

// ── Protocol ──────────────────────────────────────────────────────────────────

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

impl FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(DomainError::InvalidComponent {
                value: other.to_string(),
                reason: "unknown port protocol".into(),
            }),
        }
    }
}

// ── PortSpec ──────────────────────────────────────────────────────────────────

/// An exposed container port, written `8080` or `8080/tcp`.
///
/// Ordering is numeric by port, then protocol, so the lowest port of a set
/// is the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: u16,
    pub protocol: Protocol,
}

impl PortSpec {
    pub const fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

impl FromStr for PortSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (port, proto) = s.split_once('/').unwrap_or((s, ""));
        let port = port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| DomainError::InvalidComponent {
                value: s.to_string(),
                reason: "port must be a number between 1 and 65535".into(),
            })?;
        Ok(Self {
            port,
            protocol: proto.parse()?,
        })
    }
}

// ── ReferenceKind ─────────────────────────────────────────────────────────────

/// The kind of object an emitted artifact points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A tag on an image tracker managed by the platform.
    ImageStreamTag,
    /// A raw pull spec.
    DockerImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!(BuildStrategy::from_str("Docker").unwrap(), BuildStrategy::Docker);
        assert_eq!(BuildStrategy::from_str("sti").unwrap(), BuildStrategy::Source);
        assert!(BuildStrategy::from_str("pipeline").is_err());
    }

    #[test]
    fn protocol_defaults_to_tcp() {
        assert_eq!(Protocol::from_str("").unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::from_str("UDP").unwrap(), Protocol::Udp);
    }

    #[test]
    fn port_spec_parses_and_sorts_numerically() {
        let mut ports: Vec<PortSpec> = ["8080/tcp", "53/udp", "443"]
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();
        ports.sort();
        assert_eq!(ports[0].to_string(), "53/udp");
        assert_eq!(ports[1], PortSpec::tcp(443));
        assert!("0".parse::<PortSpec>().is_err());
        assert!("http".parse::<PortSpec>().is_err());
    }
}
