//! Integration tests for newapp-core.
//!
//! Searchers and detectors are mocked with mockall; repository trees are
//! small in-memory maps.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use mockall::mock;
use newapp_core::application::services::{
    ReferenceBuilder, ResolverSet, UniqueExactOrInexactMatchResolver,
};
use newapp_core::application::services::resolver::Resolver;
use newapp_core::domain::component::BUILDER_SCRIPTS_ENV;
use newapp_core::domain::{ReferenceKind, SecretMount};
use newapp_core::prelude::*;

// ============================================================================
// Test doubles
// ============================================================================

mock! {
    pub Catalog {}

    impl Searcher for Catalog {
        fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>>;
    }
}

mock! {
    pub Detector {}

    impl RepositoryDetector for Detector {
        fn name(&self) -> &str;
        fn detect(&self, tree: &dyn RepositoryTree) -> Option<Vec<String>>;
    }
}

struct Files(BTreeMap<String, String>);

impl RepositoryTree for Files {
    fn root(&self) -> Option<&Path> {
        None
    }

    fn contains(&self, relative: &str) -> bool {
        self.0.contains_key(relative)
    }

    fn files(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    fn read_to_string(&self, relative: &str) -> NewAppResult<String> {
        self.0.get(relative).cloned().ok_or_else(|| NewAppError::Internal {
            message: format!("missing {relative}"),
        })
    }
}

/// Every repository opens to the same file set.
struct SameTree(BTreeMap<String, String>);

impl TreeProvider for SameTree {
    fn open(&self, _: &SourceRepository) -> NewAppResult<Box<dyn RepositoryTree>> {
        Ok(Box::new(Files(self.0.clone())))
    }
}

struct RootDockerfile;

impl DockerfileTester for RootDockerfile {
    fn test(&self, tree: &dyn RepositoryTree) -> NewAppResult<Option<String>> {
        if !tree.contains("Dockerfile") {
            return Ok(None);
        }
        tree.read_to_string("Dockerfile").map(Some)
    }
}

fn image(reference: &str, score: f32, builder: bool) -> ComponentMatch {
    let mut metadata = ImageMetadata::default();
    metadata.exposed_ports.push("8080".parse().unwrap());
    if builder {
        metadata.env.insert(BUILDER_SCRIPTS_ENV, "image:///usr/libexec/s2i");
    }
    ComponentMatch {
        value: reference.into(),
        name: reference.into(),
        argument: format!("--image={reference}"),
        description: String::new(),
        score,
        insecure: false,
        local_only: false,
        payload: MatchPayload::DockerImage {
            reference: ImageReference::parse(reference).unwrap(),
            metadata: Some(metadata),
        },
    }
}

/// A catalog answering each term with the matches listed for it.
fn catalog(entries: Vec<(&'static str, Vec<ComponentMatch>)>) -> MockCatalog {
    let table: BTreeMap<String, Vec<ComponentMatch>> =
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let mut mock = MockCatalog::new();
    mock.expect_search().returning(move |terms| {
        Ok(terms
            .iter()
            .flat_map(|t| table.get(t).cloned().unwrap_or_default())
            .collect())
    });
    mock
}

fn ruby_detector() -> MockDetector {
    let mut detector = MockDetector::new();
    detector.expect_name().return_const("ruby".to_string());
    detector
        .expect_detect()
        .returning(|tree| tree.contains("Gemfile").then(|| vec!["ruby".to_string()]));
    detector
}

fn service_with(images: MockCatalog, files: &[(&str, &str)]) -> GenerateService {
    let files = files.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let inspector = RepositoryInspector::new(
        Arc::new(SameTree(files)),
        vec![Arc::new(ruby_detector())],
        Arc::new(RootDockerfile),
    );
    GenerateService::new(vec![Arc::new(images)], Vec::new(), inspector)
}

fn standard_catalog() -> MockCatalog {
    catalog(vec![
        ("ruby", vec![image("centos/ruby-22-centos7", 0.0, true)]),
        ("php", vec![image("centos/php-56-centos7", 0.0, true)]),
        ("mysql", vec![image("mysql", 0.0, false)]),
    ])
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn single_exact_match_wins_over_inexact() {
    let mut mock = MockCatalog::new();
    mock.expect_search()
        .times(1)
        .returning(|_| {
            Ok(vec![
                image("mysql", 0.0, false),
                image("mysql-proxy", 0.4, false),
                image("mariadb", 0.6, false),
            ])
        });
    let resolver = UniqueExactOrInexactMatchResolver::new(vec![Arc::new(mock)]);
    let found = resolver.resolve("mysql", &["mysql".to_string()]).unwrap();
    assert_eq!(found.name, "mysql");
}

#[test]
fn several_inexact_matches_are_ambiguous() {
    let mut mock = MockCatalog::new();
    mock.expect_search()
        .returning(|_| Ok(vec![image("mysql-proxy", 0.4, false), image("mariadb", 0.6, false)]));
    let resolver = UniqueExactOrInexactMatchResolver::new(vec![Arc::new(mock)]);
    let err = resolver.resolve("sql", &["sql".to_string()]).unwrap_err();
    assert!(err.to_string().starts_with("multiple matches for \"sql\""));
}

#[test]
fn resolution_is_per_component_and_in_request_order() {
    let images: Vec<Arc<dyn Searcher>> = vec![Arc::new(standard_catalog())];
    let resolvers = ResolverSet::from_searchers(images, Vec::new(), false);
    let mut builder = ReferenceBuilder::new();
    builder.add_components(&["mysql", "ruby", "php"], |_| {}).unwrap();
    let (mut components, _) = builder.result();
    resolvers.resolve_all(&mut components, None).unwrap();
    let names: Vec<_> = components
        .iter()
        .map(|c| c.resolved.as_ref().unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["mysql", "centos/ruby-22-centos7", "centos/php-56-centos7"]);
}

// ============================================================================
// Source binding
// ============================================================================

#[test]
fn unbound_components_and_repositories_need_explicit_binding() {
    let service = service_with(standard_catalog(), &[("Gemfile", "")]);
    let err = service
        .generate(GenerationRequest {
            arguments: vec![
                "ruby".into(),
                "php".into(),
                "https://example.com/r1.git".into(),
                "https://example.com/r2.git".into(),
            ],
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.to_string().contains("Use '[image]~[repo]'"));
}

#[test]
fn explicit_bindings_pair_components_with_repositories() {
    let service = service_with(standard_catalog(), &[("Gemfile", "")]);
    let result = service
        .generate(GenerationRequest {
            arguments: vec![
                "ruby~https://example.com/r1.git".into(),
                "php~https://example.com/r2.git".into(),
            ],
            ..Default::default()
        })
        .unwrap();
    let r1 = result.graph.build("r1").unwrap();
    assert_eq!(r1.source.git.as_ref().unwrap().uri, "https://example.com/r1.git");
    assert_eq!(r1.strategy.from().unwrap().name, "ruby-22-centos7:latest");
    let r2 = result.graph.build("r2").unwrap();
    assert_eq!(r2.strategy.from().unwrap().name, "php-56-centos7:latest");
}

#[test]
fn detected_language_drives_builder_choice() {
    let service = service_with(standard_catalog(), &[("Gemfile", ""), ("config.ru", "")]);
    let result = service
        .generate(GenerationRequest {
            arguments: vec!["https://github.com/openshift/ruby-hello-world.git".into()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(result.name, "ruby-hello-world");
    assert!(result.graph.tracker("ruby-22-centos7").is_some());
    assert!(result.graph.tracker("ruby-hello-world").is_some());
    assert_eq!(
        result.graph.deployment("ruby-hello-world").unwrap().containers[0].image,
        "ruby-hello-world:latest"
    );
    assert_eq!(result.graph.service("ruby-hello-world").unwrap().ports[0].port, 8080);
}

// ============================================================================
// Literal Dockerfiles
// ============================================================================

fn dockerfile_request(to: Option<&str>) -> GenerationRequest {
    GenerationRequest {
        dockerfile: Some("FROM centos\nRUN yum install -y httpd".into()),
        to: to.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn dockerfile_without_to_is_circular() {
    let service = service_with(catalog(vec![]), &[]);
    let err = service.generate(dockerfile_request(None)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the input and output image stream tags are identical (\"docker.io/library/centos:latest\"), please specify a different output reference with --to"
    );
}

#[test]
fn dockerfile_with_to_warns_once_and_builds() {
    let service = service_with(catalog(vec![]), &[]);
    let result = service.generate(dockerfile_request(Some("centos"))).unwrap();

    assert_eq!(result.graph.builds.len(), 1);
    assert!(result.graph.build("centos").is_some());
    assert_eq!(result.graph.image_trackers.len(), 1);
    assert!(result.graph.tracker("centos").is_some());

    let warnings: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warning)
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        warnings,
        vec!["--> WARNING: the input and output image stream tags are identical (\"docker.io/library/centos:latest\")"]
    );
}

#[test]
fn dockerfile_takes_priority_over_detected_language() {
    let service = service_with(standard_catalog(), &[("Gemfile", "")]);
    let result = service
        .generate(GenerationRequest {
            arguments: vec!["https://github.com/openshift/ruby-hello-world".into()],
            dockerfile: Some("FROM centos/ruby-22-centos7\nRUN false".into()),
            ..Default::default()
        })
        .unwrap();
    let build = result.graph.build("ruby-hello-world").unwrap();
    assert_eq!(build.source.dockerfile.as_deref(), Some("FROM centos/ruby-22-centos7\nRUN false"));
    assert_eq!(build.strategy.from().unwrap().kind, ReferenceKind::ImageStreamTag);
    assert!(matches!(
        build.strategy,
        newapp_core::domain::artifacts::BuildStrategySpec::Docker { .. }
    ));
}

#[test]
fn dockerfile_with_name_and_docker_output() {
    let service = service_with(catalog(vec![]), &[]);
    let result = service
        .generate(GenerationRequest {
            dockerfile: Some("FROM openshift/origin-base\nUSER foo".into()),
            name: Some("foobar".into()),
            to: Some("destination/reference:tag".into()),
            output_docker: true,
            ..Default::default()
        })
        .unwrap();
    let build = result.graph.build("foobar").unwrap();
    let output = build.output.as_ref().unwrap();
    assert_eq!(output.kind, ReferenceKind::DockerImage);
    assert_eq!(output.name, "destination/reference:tag");
    let trackers: Vec<_> = result.graph.image_trackers.iter().map(|t| t.meta.name.as_str()).collect();
    assert_eq!(trackers, vec!["origin-base"]);
}

// ============================================================================
// Naming, secrets and strategies
// ============================================================================

#[test]
fn colliding_names_get_numeric_suffixes() {
    let images = catalog(vec![
        ("foo", vec![image("foo", 0.0, false)]),
        ("example.com/team/foo", vec![image("example.com/team/foo", 0.0, false)]),
    ]);
    let service = service_with(images, &[]);
    let result = service
        .generate(GenerationRequest {
            arguments: vec!["foo".into(), "example.com/team/foo".into()],
            ..Default::default()
        })
        .unwrap();
    let names: Vec<_> = result.graph.deployments.iter().map(|d| d.meta.name.as_str()).collect();
    assert_eq!(names, vec!["foo", "foo-1"]);
}

#[test]
fn group_flag_joins_separately_given_components() {
    let images = || {
        catalog(vec![
            ("mysql", vec![image("mysql", 0.0, false)]),
            ("redis", vec![image("redis", 0.0, false)]),
        ])
    };
    let result = service_with(images(), &[])
        .generate(GenerationRequest {
            arguments: vec!["mysql".into(), "redis".into()],
            groups: vec!["mysql+redis".into()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(result.graph.deployments.len(), 1);
    let names: Vec<_> = result.graph.deployments[0]
        .containers
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["mysql", "redis"]);

    let err = service_with(images(), &[])
        .generate(GenerationRequest {
            arguments: vec!["mysql".into()],
            groups: vec!["mysql+nope".into()],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "no component named \"nope\" to group");
}

#[test]
fn secrets_are_parsed_regardless_of_order() {
    for order in [["foo:/var", "bar"], ["bar", "foo:/var"]] {
        let secrets = SecretMount::parse_all(&order).unwrap();
        let map: BTreeMap<_, _> = secrets
            .iter()
            .map(|s| (s.name.as_str(), s.destination_dir.as_str()))
            .collect();
        assert_eq!(map, BTreeMap::from([("foo", "/var"), ("bar", ".")]));
    }
}

#[test]
fn docker_strategy_uses_repository_dockerfile() {
    let service = service_with(
        standard_catalog(),
        &[("Gemfile", ""), ("Dockerfile", "FROM mysql\nEXPOSE 3306")],
    );
    let result = service
        .generate(GenerationRequest {
            arguments: vec!["https://example.com/app.git".into()],
            strategy: Some(BuildStrategy::Docker),
            ..Default::default()
        })
        .unwrap();
    let build = result.graph.build("app").unwrap();
    assert!(build.source.dockerfile.is_none());
    assert_eq!(build.strategy.from().unwrap().name, "mysql:latest");
}

#[test]
fn failing_searcher_is_reported_when_nothing_matches() {
    let mut broken = MockCatalog::new();
    broken.expect_search().returning(|_| {
        Err(NewAppError::Configuration {
            message: "catalog unreadable".into(),
        })
    });
    let service = service_with(broken, &[]);
    let err = service
        .generate(GenerationRequest {
            arguments: vec!["mysql".into()],
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.to_string().contains("catalog unreadable"));
}
