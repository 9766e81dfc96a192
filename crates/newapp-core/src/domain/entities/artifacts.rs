//! The emitted object graph.
//!
//! These types are output only. They serialize to JSON for external
//! printers and appliers and are never read back.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::common::Environment;
use super::source::{ImageSourcePath, SecretMount};
use crate::domain::{PortSpec, Protocol, ReferenceKind};

/// Annotation set on trackers whose upstream registry is insecure.
pub const INSECURE_REPOSITORY_ANNOTATION: &str = "openshift.io/image.insecureRepository";

// ── Shared pieces ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, labels: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            labels,
            annotations: BTreeMap::new(),
        }
    }
}

/// Pointer from one artifact to an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectRef {
    pub kind: ReferenceKind,
    pub name: String,
}

impl ObjectRef {
    pub fn stream_tag(stream: &str, tag: &str) -> Self {
        Self {
            kind: ReferenceKind::ImageStreamTag,
            name: format!("{stream}:{tag}"),
        }
    }

    pub fn docker_image(pull_spec: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::DockerImage,
            name: pull_spec.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ReferenceKind::ImageStreamTag => "ImageStreamTag",
            ReferenceKind::DockerImage => "DockerImage",
        };
        write!(f, "{kind} {}", self.name)
    }
}

// ── Image trackers ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerTag {
    pub name: String,
    /// Upstream image the tag imports from. Absent for build outputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectRef>,
}

/// Platform-side record of an image repository and its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageTracker {
    pub meta: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image_repository: Option<String>,
    pub tags: Vec<TrackerTag>,
}

impl ImageTracker {
    pub fn is_insecure(&self) -> bool {
        self.meta
            .annotations
            .get(INSECURE_REPOSITORY_ANNOTATION)
            .is_some_and(|v| v == "true")
    }
}

// ── Builds ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSource {
    pub uri: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    pub from: ObjectRef,
    pub paths: Vec<ImageSourcePath>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretMount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BuildStrategySpec {
    Source { from: ObjectRef, env: Environment },
    Docker { from: Option<ObjectRef>, env: Environment },
}

impl BuildStrategySpec {
    pub fn env(&self) -> &Environment {
        match self {
            Self::Source { env, .. } | Self::Docker { env, .. } => env,
        }
    }

    pub fn from(&self) -> Option<&ObjectRef> {
        match self {
            Self::Source { from, .. } => Some(from),
            Self::Docker { from, .. } => from.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BuildTrigger {
    ConfigChange,
    /// Rebuild when the builder or base tracker tag changes.
    ImageChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDefinition {
    pub meta: ObjectMeta,
    pub source: BuildSource,
    pub strategy: BuildStrategySpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ObjectRef>,
    pub triggers: Vec<BuildTrigger>,
}

// ── Deployments ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,
    #[serde(skip_serializing_if = "Environment::is_empty")]
    pub env: Environment,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VolumeSource {
    /// Ephemeral storage that lives as long as the pod.
    EmptyDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DeployTrigger {
    ConfigChange,
    ImageChange {
        container_names: Vec<String>,
        from: ObjectRef,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployDefinition {
    pub meta: ObjectMeta,
    pub replicas: u32,
    pub selector: BTreeMap<String, String>,
    pub containers: Vec<Container>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    pub triggers: Vec<DeployTrigger>,
}

// ── Network exposure ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub target_port: u16,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkExposure {
    pub meta: ObjectMeta,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

// ── Templates ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInstantiation {
    pub meta: ObjectMeta,
    pub template: String,
    pub parameters: BTreeMap<String, String>,
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// Everything one generation run emits. Names are unique within each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectGraph {
    pub image_trackers: Vec<ImageTracker>,
    pub builds: Vec<BuildDefinition>,
    pub deployments: Vec<DeployDefinition>,
    pub services: Vec<NetworkExposure>,
    pub template_instantiations: Vec<TemplateInstantiation>,
}

impl ObjectGraph {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.image_trackers.len()
            + self.builds.len()
            + self.deployments.len()
            + self.services.len()
            + self.template_instantiations.len()
    }

    pub fn tracker(&self, name: &str) -> Option<&ImageTracker> {
        self.image_trackers.iter().find(|t| t.meta.name == name)
    }

    pub fn build(&self, name: &str) -> Option<&BuildDefinition> {
        self.builds.iter().find(|b| b.meta.name == name)
    }

    pub fn deployment(&self, name: &str) -> Option<&DeployDefinition> {
        self.deployments.iter().find(|d| d.meta.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&NetworkExposure> {
        self.services.iter().find(|s| s.meta.name == name)
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
}

/// A non-fatal message for the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            DiagnosticLevel::Warning => write!(f, "--> WARNING: {}", self.message),
            DiagnosticLevel::Info => write!(f, "--> {}", self.message),
        }
    }
}
