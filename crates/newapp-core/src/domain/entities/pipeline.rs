//! Resolved build/deploy topology, one per component.
//!
//! Pipelines are produced by the assembler and read by the synthesizer.
//! Once assembled they are not modified.

use serde::Serialize;
use std::fmt;

use super::common::Environment;
use super::component::ComponentMatch;
use super::dockerfile::Dockerfile;
use super::image_ref::ImageReference;
use super::source::{ImageSourcePath, SecretMount, SourceRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStrategy {
    SourceBuild,
    DockerBuildFromRepository,
    DockerBuildFromDockerfile,
    DirectImage,
}

impl fmt::Display for PipelineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceBuild => "source build",
            Self::DockerBuildFromRepository => "docker build",
            Self::DockerBuildFromDockerfile => "docker build from Dockerfile",
            Self::DirectImage => "image",
        })
    }
}

/// Where a build pushes its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputTarget {
    /// A tag on an image tracker created alongside the build.
    Tracker { name: String, tag: String },
    /// A raw pull spec; no tracker is created for it.
    DockerImage(ImageReference),
}

/// An auxiliary image copied into the build context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceImageInput {
    pub image: ComponentMatch,
    pub paths: Vec<ImageSourcePath>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildPlan {
    pub strategy: PipelineStrategy,
    /// Build context. Absent when the only source is an image.
    pub repository: Option<SourceRepository>,
    /// Literal Dockerfile content overriding the repository's own.
    pub dockerfile: Option<Dockerfile>,
    pub source_images: Vec<SourceImageInput>,
    pub output: Option<OutputTarget>,
    /// Applied to the executing strategy only.
    pub environment: Environment,
    pub secrets: Vec<SecretMount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    pub name: String,
    /// Index of the component this pipeline was assembled from.
    pub component: usize,
    pub group: usize,
    pub input: ComponentMatch,
    pub build: Option<BuildPlan>,
    pub deploy: bool,
    /// Deploy-time environment.
    pub environment: Environment,
}

impl Pipeline {
    pub fn strategy(&self) -> PipelineStrategy {
        self.build
            .as_ref()
            .map_or(PipelineStrategy::DirectImage, |b| b.strategy)
    }

    pub fn output(&self) -> Option<&OutputTarget> {
        self.build.as_ref().and_then(|b| b.output.as_ref())
    }
}

/// A template resolved for instantiation, with the parameters to pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplatePlan {
    pub component: usize,
    pub template: ComponentMatch,
    pub parameters: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::component::MatchPayload;

    #[test]
    fn pipeline_without_build_is_direct_image() {
        let reference = ImageReference::parse("mysql").unwrap();
        let pipeline = Pipeline {
            name: "mysql".into(),
            component: 0,
            group: 0,
            input: ComponentMatch::unresolved("mysql", reference),
            build: None,
            deploy: true,
            environment: Environment::new(),
        };
        assert_eq!(pipeline.strategy(), PipelineStrategy::DirectImage);
        assert!(pipeline.output().is_none());
        assert!(matches!(pipeline.input.payload, MatchPayload::DockerImage { .. }));
    }
}
