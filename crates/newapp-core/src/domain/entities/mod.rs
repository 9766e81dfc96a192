pub mod artifacts;
pub mod common;
pub mod component;
pub mod dockerfile;
pub mod image_ref;
pub mod pipeline;
pub mod source;

pub use crate::domain::DomainError;
pub use artifacts::{Diagnostic, DiagnosticLevel, ObjectGraph};
pub use common::{Environment, Labels};
pub use component::{ComponentInput, ComponentMatch, ImageMetadata, MatchPayload, TemplateRecord};
pub use dockerfile::Dockerfile;
pub use image_ref::ImageReference;
pub use pipeline::{BuildPlan, OutputTarget, Pipeline, PipelineStrategy, TemplatePlan};
pub use source::{SecretMount, SourceRepository, SourceRepositoryInfo};
