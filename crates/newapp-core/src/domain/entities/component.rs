//! Component inputs and the matches they resolve to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::common::Environment;
use super::image_ref::ImageReference;
use crate::domain::{MatchKind, PortSpec, ResolverKind};

/// Environment variable that marks an image as able to build source.
pub const BUILDER_SCRIPTS_ENV: &str = "STI_SCRIPTS_URL";
/// Label that marks an image as able to build source.
pub const BUILDER_SCRIPTS_LABEL: &str = "io.openshift.s2i.scripts-url";

// ── Image metadata ────────────────────────────────────────────────────────────

/// What an image declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default)]
    pub exposed_ports: Vec<PortSpec>,
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Language or platform terms this image can build, e.g. `ruby`.
    #[serde(default)]
    pub supports: Vec<String>,
}

impl ImageMetadata {
    pub fn is_builder(&self) -> bool {
        self.env.get(BUILDER_SCRIPTS_ENV).is_some() || self.labels.contains_key(BUILDER_SCRIPTS_LABEL)
    }

    /// Lowest exposed port.
    pub fn primary_port(&self) -> Option<PortSpec> {
        self.exposed_ports.iter().min().copied()
    }

    pub fn sorted_ports(&self) -> Vec<PortSpec> {
        let mut ports = self.exposed_ports.clone();
        ports.sort();
        ports.dedup();
        ports
    }
}

// ── Templates ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
}

impl TemplateRecord {
    pub fn parameter(&self, name: &str) -> Option<&TemplateParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ── ComponentMatch ────────────────────────────────────────────────────────────

/// Kind-specific body of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatchPayload {
    /// A plain image pulled by reference.
    DockerImage {
        reference: ImageReference,
        metadata: Option<ImageMetadata>,
    },
    /// A tag on an image tracker that already exists on the platform.
    ImageStream {
        reference: ImageReference,
        stream: String,
        tag: String,
        metadata: Option<ImageMetadata>,
    },
    Template(TemplateRecord),
}

/// One candidate resolution of a component value.
///
/// `score` is in `[0.0, 1.0]`; lower is better and `0.0` is exact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentMatch {
    /// The term that was searched.
    pub value: String,
    /// Canonical display name.
    pub name: String,
    /// The argument that would select this match unambiguously.
    pub argument: String,
    pub description: String,
    pub score: f32,
    /// The backing registry is insecure or unauthenticated.
    pub insecure: bool,
    /// Present only in the local daemon, so it cannot be imported.
    pub local_only: bool,
    pub payload: MatchPayload,
}

impl ComponentMatch {
    pub fn is_exact(&self) -> bool {
        self.score == 0.0
    }

    pub fn kind(&self) -> MatchKind {
        match &self.payload {
            MatchPayload::Template(_) => MatchKind::Template,
            _ if self.is_builder() => MatchKind::BuilderImage,
            MatchPayload::ImageStream { .. } => MatchKind::RuntimeImage,
            MatchPayload::DockerImage { .. } => MatchKind::DockerImage,
        }
    }

    pub fn is_builder(&self) -> bool {
        self.metadata().is_some_and(ImageMetadata::is_builder)
    }

    pub fn is_template(&self) -> bool {
        matches!(self.payload, MatchPayload::Template(_))
    }

    pub fn image(&self) -> Option<&ImageReference> {
        match &self.payload {
            MatchPayload::DockerImage { reference, .. } | MatchPayload::ImageStream { reference, .. } => {
                Some(reference)
            }
            MatchPayload::Template(_) => None,
        }
    }

    pub fn metadata(&self) -> Option<&ImageMetadata> {
        match &self.payload {
            MatchPayload::DockerImage { metadata, .. } | MatchPayload::ImageStream { metadata, .. } => {
                metadata.as_ref()
            }
            MatchPayload::Template(_) => None,
        }
    }

    pub fn metadata_mut(&mut self) -> Option<&mut Option<ImageMetadata>> {
        match &mut self.payload {
            MatchPayload::DockerImage { metadata, .. } | MatchPayload::ImageStream { metadata, .. } => {
                Some(metadata)
            }
            MatchPayload::Template(_) => None,
        }
    }

    pub fn template(&self) -> Option<&TemplateRecord> {
        match &self.payload {
            MatchPayload::Template(t) => Some(t),
            _ => None,
        }
    }

    /// Identity used to decide whether two matches are the same thing.
    pub fn identity(&self) -> String {
        match &self.payload {
            MatchPayload::Template(t) => format!("template:{}", t.name),
            MatchPayload::DockerImage { reference, .. } | MatchPayload::ImageStream { reference, .. } => {
                reference.identity()
            }
        }
    }

    /// An exact, metadata-less image match for a value no source knows.
    pub fn unresolved(value: &str, reference: ImageReference) -> Self {
        Self {
            value: value.to_string(),
            name: reference.exact(),
            argument: format!("--image={value}"),
            description: "image not found, using it as given".into(),
            score: 0.0,
            insecure: false,
            local_only: false,
            payload: MatchPayload::DockerImage {
                reference,
                metadata: None,
            },
        }
    }
}

impl fmt::Display for ComponentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.argument)
    }
}

// ── ComponentInput ────────────────────────────────────────────────────────────

/// One user-requested unit, before and after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInput {
    pub value: String,
    /// Terms handed to the searchers; defaults to `[value]`.
    pub terms: Vec<String>,
    /// Index into the request's source repositories.
    pub uses: Option<usize>,
    pub expect_to_build: bool,
    pub is_template: bool,
    pub is_image: bool,
    /// Deployment group; members of one group share a deploy definition.
    pub group: usize,
    pub resolver: Option<ResolverKind>,
    pub resolved: Option<ComponentMatch>,
    /// Created from an unbound repository rather than named by the user.
    pub derived: bool,
}

impl ComponentInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            terms: vec![value.clone()],
            value,
            uses: None,
            expect_to_build: false,
            is_template: false,
            is_image: false,
            group: 0,
            resolver: Some(ResolverKind::Default),
            resolved: None,
            derived: false,
        }
    }

    pub fn with_resolver(mut self, resolver: Option<ResolverKind>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_terms(mut self, terms: Vec<String>) -> Self {
        self.terms = terms;
        self
    }

    /// Needs a source repository but has none bound yet.
    pub fn needs_source(&self) -> bool {
        self.expect_to_build && self.uses.is_none()
    }
}

impl fmt::Display for ComponentInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
