//! Generate Service - the engine's driving port.
//!
//! Runs one request through every stage in order:
//! 1. Parse flag values and classify free arguments
//! 2. Build component inputs and source repositories
//! 3. Resolve components (in parallel)
//! 4. Bind sources and inspect repositories (in parallel)
//! 5. Derive components for unbound repositories and resolve them
//! 6. Assemble pipelines and synthesize the object graph
//!
//! Nothing is written anywhere; the caller decides what to do with the
//! returned graph and diagnostics.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::ApplicationError;
use crate::application::ports::Searcher;
use crate::application::services::assembler::{AssemblyOptions, PipelineAssembler};
use crate::application::services::classifier::{self, ReferenceBuilder};
use crate::application::services::inspector::RepositoryInspector;
use crate::application::services::resolver::{self, ResolverSet, apply_match_semantics};
use crate::application::services::synthesizer::ObjectSynthesizer;
use crate::domain::entities::common::split_pair;
use crate::domain::pipeline::SourceImageInput;
use crate::domain::source::ImageSourcePath;
use crate::domain::{
    BuildStrategy, ComponentInput, ComponentMatch, Diagnostic, Dockerfile, DomainError,
    DomainValidator, Environment, ImageReference, Labels, ObjectGraph, ResolverKind, SecretMount,
    SourceRepository,
};
use crate::error::{NewAppError, NewAppResult};

/// Everything the user asked for, as raw strings where parsing can fail.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free arguments, classified by syntax.
    pub arguments: Vec<String>,
    /// Values from `--image` / `--docker-image`.
    pub images: Vec<String>,
    pub templates: Vec<String>,
    /// Values from `--code`.
    pub source_repositories: Vec<String>,
    /// `a+b` values from `--group`, naming components already given.
    pub groups: Vec<String>,
    pub environment: Vec<String>,
    pub build_environment: Vec<String>,
    pub template_parameters: Vec<String>,
    pub labels: Vec<String>,
    pub name: Option<String>,
    pub strategy: Option<BuildStrategy>,
    /// Literal Dockerfile content.
    pub dockerfile: Option<String>,
    pub context_dir: Option<String>,
    pub to: Option<String>,
    pub output_docker: bool,
    pub no_output: bool,
    /// `false` in build-only mode.
    pub deploy: bool,
    pub secrets: Vec<String>,
    pub source_image: Option<String>,
    pub source_image_paths: Vec<String>,
    pub insecure_registry: bool,
    pub allow_missing_images: bool,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            arguments: Vec::new(),
            images: Vec::new(),
            templates: Vec::new(),
            source_repositories: Vec::new(),
            groups: Vec::new(),
            environment: Vec::new(),
            build_environment: Vec::new(),
            template_parameters: Vec::new(),
            labels: Vec::new(),
            name: None,
            strategy: None,
            dockerfile: None,
            context_dir: None,
            to: None,
            output_docker: false,
            no_output: false,
            deploy: true,
            secrets: Vec::new(),
            source_image: None,
            source_image_paths: Vec::new(),
            insecure_registry: false,
            allow_missing_images: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub graph: ObjectGraph,
    /// Name of the primary pipeline (or template).
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Values parsed out of a [`GenerationRequest`].
struct Parsed {
    options: AssemblyOptions,
    labels: Labels,
    arguments: classifier::Classification,
}

pub struct GenerateService {
    images: Vec<Arc<dyn Searcher>>,
    templates: Vec<Arc<dyn Searcher>>,
    inspector: RepositoryInspector,
}

impl GenerateService {
    pub fn new(
        images: Vec<Arc<dyn Searcher>>,
        templates: Vec<Arc<dyn Searcher>>,
        inspector: RepositoryInspector,
    ) -> Self {
        Self {
            images,
            templates,
            inspector,
        }
    }

    /// Every candidate for `terms` from every searcher, best first.
    #[instrument(skip_all, fields(terms = ?terms))]
    pub fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        let searchers: Vec<Arc<dyn Searcher>> =
            self.images.iter().chain(self.templates.iter()).cloned().collect();
        let (matches, errors) = resolver::search_all(&searchers, terms);
        if matches.is_empty() {
            if let Some(e) = errors.into_iter().next() {
                return Err(e);
            }
        }
        Ok(resolver::dedup_by_identity(matches))
    }

    #[instrument(skip_all, fields(arguments = request.arguments.len(), deploy = request.deploy))]
    pub fn generate(&self, request: GenerationRequest) -> NewAppResult<GenerationResult> {
        let parsed = self.parse(&request)?;
        let mut options = parsed.options;
        let resolvers = ResolverSet::from_searchers(
            self.images.clone(),
            self.templates.clone(),
            request.allow_missing_images,
        );

        // Components and repositories
        let (mut components, mut repositories) = build_references(&request, &parsed.arguments)?;
        for repo in repositories.iter_mut() {
            if repo.context_dir.is_none() {
                repo.context_dir = request.context_dir.clone();
            }
            if repo.strategy.is_none() {
                repo.strategy = request.strategy;
            }
        }
        options.source_images = self.resolve_source_image(&request, &resolvers)?;
        let assembler = PipelineAssembler::new(options);
        assembler.prepare_dockerfile(&mut repositories)?;

        // Resolution
        resolvers.resolve_all(&mut components, request.strategy)?;
        apply_match_semantics(&mut components, request.strategy)?;
        if !request.deploy {
            if let Some(t) = components.iter().find(|c| c.is_template) {
                return Err(ApplicationError::StrategyConflict(format!(
                    "template \"{}\" cannot be used when only building",
                    t.value
                ))
                .into());
            }
            for c in components.iter_mut() {
                c.expect_to_build = true;
            }
        }

        // Sources
        assembler.ensure_has_source(&mut components, &repositories)?;
        let mut diagnostics: Vec<Diagnostic> = self
            .inspector
            .inspect_all(&mut repositories)
            .into_iter()
            .map(|e| Diagnostic::warning(e.to_string()))
            .collect();
        assembler.override_dockerfile(&mut repositories);

        let mut derived = assembler.derive_components(&components, &repositories)?;
        resolvers.resolve_all(&mut derived, request.strategy)?;
        components.extend(derived);

        if components.is_empty() {
            return Err(ApplicationError::NoComponents.into());
        }
        for c in &components {
            if let Some(m) = &c.resolved {
                diagnostics.push(Diagnostic::info(format!(
                    "found {} \"{}\" for \"{}\"",
                    m.kind(),
                    m.name,
                    c.value
                )));
            }
        }

        // Assembly and synthesis
        let assembly = assembler.assemble(&components, &repositories)?;
        diagnostics.extend(assembly.diagnostics);
        let synthesizer = ObjectSynthesizer::new(parsed.labels, request.insecure_registry);
        let graph = synthesizer.synthesize(&assembly.pipelines, &assembly.templates)?;

        let name = assembly
            .pipelines
            .first()
            .map(|p| p.name.clone())
            .or_else(|| assembly.templates.first().map(|t| t.template.name.clone()))
            .unwrap_or_default();
        info!(
            name = %name,
            pipelines = assembly.pipelines.len(),
            objects = graph.len(),
            "Generation completed"
        );
        Ok(GenerationResult {
            graph,
            name,
            diagnostics,
        })
    }

    fn parse(&self, request: &GenerationRequest) -> NewAppResult<Parsed> {
        let arguments =
            classifier::classify_with(&request.arguments, |t| self.inspector.is_local_directory(t));
        arguments.ensure_recognized()?;

        let mut environment = Environment::parse(&request.environment)?;
        environment.add_missing(&Environment::parse(&arguments.environment)?);
        let mut build_environment = Environment::parse(&request.build_environment)?;
        if !request.deploy {
            build_environment.add_missing(&environment);
            environment = Environment::new();
        }

        if let Some(name) = &request.name {
            DomainValidator::validate_name(name)?;
        }
        if request.no_output && (request.to.is_some() || request.output_docker) {
            return Err(ApplicationError::StrategyConflict(
                "--no-output cannot be combined with --to or --to-docker".into(),
            )
            .into());
        }

        Ok(Parsed {
            options: AssemblyOptions {
                strategy: request.strategy,
                name: request.name.clone(),
                to: request.to.as_deref().map(ImageReference::parse).transpose()?,
                output_docker: request.output_docker,
                no_output: request.no_output,
                deploy: request.deploy,
                environment,
                build_environment,
                secrets: SecretMount::parse_all(&request.secrets)?,
                source_images: Vec::new(),
                dockerfile: request.dockerfile.as_deref().map(Dockerfile::parse),
                template_parameters: parse_parameters(&request.template_parameters)?,
            },
            labels: Labels::parse(&request.labels)?,
            arguments,
        })
    }

    /// Resolve `--source-image` as an image and pair it with its paths.
    fn resolve_source_image(
        &self,
        request: &GenerationRequest,
        resolvers: &ResolverSet,
    ) -> NewAppResult<Vec<SourceImageInput>> {
        let Some(value) = &request.source_image else {
            if request.source_image_paths.is_empty() {
                return Ok(Vec::new());
            }
            return Err(ApplicationError::StrategyConflict(
                "--source-image-path requires --source-image".into(),
            )
            .into());
        };
        if request.source_image_paths.is_empty() {
            return Err(ApplicationError::StrategyConflict(
                "--source-image requires at least one --source-image-path".into(),
            )
            .into());
        }
        let paths = request
            .source_image_paths
            .iter()
            .map(|p| ImageSourcePath::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = resolvers
            .resolver_for(ResolverKind::ImageOnly, None)
            .ok_or_else(|| ApplicationError::NoResolver { value: value.clone() })?;
        let image = resolver.resolve(value, std::slice::from_ref(value))?;
        Ok(vec![SourceImageInput { image, paths }])
    }
}

fn build_references(
    request: &GenerationRequest,
    arguments: &classifier::Classification,
) -> NewAppResult<(Vec<ComponentInput>, Vec<SourceRepository>)> {
    let mut builder = ReferenceBuilder::new();
    builder.add_components(&arguments.components, |_| {})?;
    builder.add_components(&request.images, classifier::as_image)?;
    builder.add_components(&request.templates, classifier::as_template)?;
    for group in &request.groups {
        let members = group
            .split('+')
            .map(|value| {
                builder
                    .find_component(value)
                    .ok_or_else(|| ApplicationError::UnknownGroupMember { value: value.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        builder.add_group(&members);
    }
    for location in arguments.repositories.iter().chain(&request.source_repositories) {
        builder.add_source_repository(location)?;
    }
    Ok(builder.result())
}

fn parse_parameters(pairs: &[String]) -> Result<BTreeMap<String, String>, NewAppError> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        let (key, value) = split_pair(pair).ok_or_else(|| DomainError::InvalidParameter {
            pair: pair.clone(),
            reason: "expected KEY=VALUE".into(),
        })?;
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DockerfileTester, RepositoryDetector, RepositoryTree, TreeProvider};
    use crate::domain::component::{BUILDER_SCRIPTS_ENV, TemplateParameter};
    use crate::domain::{ImageMetadata, MatchPayload, PortSpec, TemplateRecord};
    use std::path::Path;

    struct Catalog(Vec<ComponentMatch>);

    impl Searcher for Catalog {
        fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
            Ok(self
                .0
                .iter()
                .filter(|m| terms.iter().any(|t| m.name == *t || m.value == *t))
                .cloned()
                .collect())
        }
    }

    struct Empty;

    impl RepositoryTree for Empty {
        fn root(&self) -> Option<&Path> {
            None
        }
        fn contains(&self, _: &str) -> bool {
            false
        }
        fn files(&self) -> Vec<String> {
            Vec::new()
        }
        fn read_to_string(&self, relative: &str) -> NewAppResult<String> {
            Err(NewAppError::Internal {
                message: relative.to_string(),
            })
        }
    }

    struct Trees;

    impl TreeProvider for Trees {
        fn open(&self, _: &SourceRepository) -> NewAppResult<Box<dyn RepositoryTree>> {
            Ok(Box::new(Empty))
        }
    }

    struct Ruby;

    impl RepositoryDetector for Ruby {
        fn name(&self) -> &str {
            "ruby"
        }
        fn detect(&self, _: &dyn RepositoryTree) -> Option<Vec<String>> {
            Some(vec!["ruby".into()])
        }
    }

    struct NoDockerfile;

    impl DockerfileTester for NoDockerfile {
        fn test(&self, _: &dyn RepositoryTree) -> NewAppResult<Option<String>> {
            Ok(None)
        }
    }

    fn image(reference: &str, builder: bool, ports: &[u16]) -> ComponentMatch {
        let mut metadata = ImageMetadata {
            exposed_ports: ports.iter().map(|p| PortSpec::tcp(*p)).collect(),
            ..Default::default()
        };
        if builder {
            metadata.env.insert(BUILDER_SCRIPTS_ENV, "image:///usr/libexec/s2i");
            metadata.supports.push("ruby".into());
        }
        ComponentMatch {
            value: reference.into(),
            name: reference.into(),
            argument: format!("--image={reference}"),
            description: String::new(),
            score: 0.0,
            insecure: false,
            local_only: false,
            payload: MatchPayload::DockerImage {
                reference: ImageReference::parse(reference).unwrap(),
                metadata: Some(metadata),
            },
        }
    }

    fn service() -> GenerateService {
        let images: Vec<Arc<dyn Searcher>> = vec![Arc::new(Catalog(vec![
            image("ruby", true, &[8080]),
            image("mysql", false, &[3306]),
            image("php", false, &[8080]),
        ]))];
        let mut template = image("mysql-ephemeral", false, &[]);
        template.payload = MatchPayload::Template(TemplateRecord {
            name: "mysql-ephemeral".into(),
            description: String::new(),
            parameters: vec![TemplateParameter {
                name: "MYSQL_USER".into(),
                value: Some("user".into()),
                required: false,
                description: None,
            }],
        });
        template.argument = "--template=mysql-ephemeral".into();
        let templates: Vec<Arc<dyn Searcher>> = vec![Arc::new(Catalog(vec![template]))];
        let inspector =
            RepositoryInspector::new(Arc::new(Trees), vec![Arc::new(Ruby)], Arc::new(NoDockerfile));
        GenerateService::new(images, templates, inspector)
    }

    fn args(values: &[&str]) -> GenerationRequest {
        GenerationRequest {
            arguments: values.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn image_only_request_deploys() {
        let result = service().generate(args(&["mysql", "A=1"])).unwrap();
        assert_eq!(result.name, "mysql");
        let deploy = result.graph.deployment("mysql").unwrap();
        assert_eq!(deploy.containers[0].env.get("A"), Some("1"));
        assert!(result.graph.builds.is_empty());
        assert!(result.graph.service("mysql").is_some());
    }

    #[test]
    fn repository_derives_builder() {
        let result = service()
            .generate(args(&["https://github.com/openshift/ruby-hello-world.git"]))
            .unwrap();
        assert_eq!(result.name, "ruby-hello-world");
        let build = result.graph.build("ruby-hello-world").unwrap();
        assert_eq!(build.strategy.from().unwrap().name, "ruby:latest");
    }

    #[test]
    fn build_mode_moves_environment_to_build() {
        let mut request = args(&["ruby~https://example.com/app.git", "A=1"]);
        request.deploy = false;
        let result = service().generate(request).unwrap();
        assert!(result.graph.deployments.is_empty());
        assert_eq!(result.graph.build("app").unwrap().strategy.env().get("A"), Some("1"));
    }

    #[test]
    fn no_components_is_an_error() {
        let err = service().generate(args(&[])).unwrap_err();
        assert_eq!(err.to_string(), "no components were provided or could be derived");
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let err = service().generate(args(&["Not Valid"])).unwrap_err();
        assert_eq!(err.to_string(), "did not recognize the following arguments: Not Valid");
    }

    #[test]
    fn templates_instantiate_with_declared_parameters() {
        let mut request = args(&[]);
        request.templates = vec!["mysql-ephemeral".into()];
        request.template_parameters = vec!["MYSQL_USER=me".into()];
        let result = service().generate(request).unwrap();
        assert_eq!(result.graph.template_instantiations[0].parameters["MYSQL_USER"], "me");
    }

    #[test]
    fn template_with_source_is_rejected() {
        let err = service()
            .generate(args(&["mysql-ephemeral~https://example.com/app.git"]))
            .unwrap_err();
        assert!(err.to_string().starts_with("template with source code explicitly attached"));
    }

    #[test]
    fn source_image_feeds_builds() {
        let mut request = args(&["ruby"]);
        request.name = Some("app".into());
        request.source_image = Some("mysql".into());
        request.source_image_paths = vec!["/var/lib:data".into()];
        let result = service().generate(request).unwrap();
        let build = &result.graph.builds[0];
        assert!(build.source.git.is_none());
        assert_eq!(build.source.images[0].paths[0].destination_dir, "data");
    }

    #[test]
    fn search_merges_all_sources() {
        let found = service().search(&["mysql".into(), "mysql-ephemeral".into()]).unwrap();
        assert_eq!(found.len(), 2);
    }
}
