// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for newapp.
//!
//! This module contains the pure data model of a generation run: image
//! references, component inputs and matches, source repositories,
//! pipelines and the emitted object graph.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Few external crates**: std, thiserror, serde and url
//! - **Value semantics**: All domain objects are Clone + PartialEq
//!
pub mod entities;
pub mod error;
pub mod value_objects;

mod validation;

pub use entities::{
    BuildPlan, ComponentInput, ComponentMatch, Diagnostic, DiagnosticLevel, Dockerfile,
    Environment, ImageMetadata, ImageReference, Labels, MatchPayload, ObjectGraph, OutputTarget,
    Pipeline, PipelineStrategy, SecretMount, SourceRepository, SourceRepositoryInfo,
    TemplatePlan, TemplateRecord, artifacts, component, image_ref, pipeline, source,
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{BuildStrategy, MatchKind, PortSpec, Protocol, ReferenceKind, ResolverKind};

pub use validation::{DomainValidator, MAX_NAME_LENGTH};

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Cross-entity checks
    // ========================================================================

    #[test]
    fn repository_dockerfile_exposes_ports() {
        let repo = SourceRepository::for_dockerfile(Dockerfile::parse(
            "FROM centos\nEXPOSE 1234 4567",
        ));
        let ports = repo.dockerfile().unwrap().exposed_ports();
        assert_eq!(ports, vec![PortSpec::tcp(1234), PortSpec::tcp(4567)]);
    }

    #[test]
    fn unresolved_match_is_exact_docker_image() {
        let m = ComponentMatch::unresolved("centos", ImageReference::parse("centos").unwrap());
        assert!(m.is_exact());
        assert_eq!(m.kind(), MatchKind::DockerImage);
        assert!(m.metadata().is_none());
    }

    #[test]
    fn build_and_template_plans_are_reexported() {
        let plan = BuildPlan {
            strategy: PipelineStrategy::SourceBuild,
            repository: Some(SourceRepository::parse("/work/app").unwrap()),
            dockerfile: None,
            source_images: vec![],
            output: None,
            environment: Environment::new(),
            secrets: vec![],
        };
        assert!(plan.output.is_none());

        let record = TemplateRecord {
            name: "mysql-ephemeral".into(),
            description: String::new(),
            parameters: vec![],
        };
        let mut template = ComponentMatch::unresolved("mysql-ephemeral", ImageReference::named("mysql"));
        template.payload = MatchPayload::Template(record);
        let plan = TemplatePlan {
            component: 0,
            template,
            parameters: Default::default(),
        };
        assert_eq!(plan.template.template().map(|t| t.name.as_str()), Some("mysql-ephemeral"));
    }

    #[test]
    fn sanitized_repository_name_is_valid() {
        let repo = SourceRepository::parse("https://github.com/org/My_App.git").unwrap();
        let name = DomainValidator::sanitize_name(&repo.name().unwrap()).unwrap();
        assert!(DomainValidator::validate_name(&name).is_ok());
        assert_eq!(name, "my-app");
    }
}
