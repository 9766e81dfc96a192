//! Pipeline Assembler.
//!
//! Binds components to repositories, picks one build strategy per
//! component, names pipelines and decides where builds push. The result is
//! an ordered list of [`Pipeline`]s; names are suffixed `-1`, `-2`, ... in
//! assembly order when they collide.

use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::domain::pipeline::SourceImageInput;
use crate::domain::{
    BuildPlan, BuildStrategy, ComponentInput, ComponentMatch, Diagnostic, Dockerfile, DomainValidator,
    Environment, ImageMetadata, ImageReference, OutputTarget, Pipeline, PipelineStrategy,
    ResolverKind, SecretMount, SourceRepository, SourceRepositoryInfo, TemplatePlan,
    image_ref::DEFAULT_TAG,
};
use crate::error::{NewAppError, NewAppResult};

/// Request-wide settings that shape every pipeline.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub strategy: Option<BuildStrategy>,
    pub name: Option<String>,
    pub to: Option<ImageReference>,
    /// Push to a raw image reference instead of a tracker tag.
    pub output_docker: bool,
    pub no_output: bool,
    pub deploy: bool,
    pub environment: Environment,
    pub build_environment: Environment,
    pub secrets: Vec<SecretMount>,
    pub source_images: Vec<SourceImageInput>,
    /// Dockerfile content supplied directly rather than from a repository.
    pub dockerfile: Option<Dockerfile>,
    pub template_parameters: BTreeMap<String, String>,
}

/// Output of [`PipelineAssembler::assemble`].
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub pipelines: Vec<Pipeline>,
    pub templates: Vec<TemplatePlan>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct PipelineAssembler {
    options: AssemblyOptions,
}

impl PipelineAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    // ── Literal Dockerfile ────────────────────────────────────────────────────

    /// Check a literal Dockerfile against the request, and give it a
    /// synthetic repository when no repository was named.
    pub fn prepare_dockerfile(&self, repositories: &mut Vec<SourceRepository>) -> NewAppResult<()> {
        let Some(dockerfile) = &self.options.dockerfile else {
            return Ok(());
        };
        if self.options.strategy.is_some_and(|s| s != BuildStrategy::Docker) {
            return Err(ApplicationError::StrategyConflict(
                "when directly referencing a Dockerfile, the strategy must be 'docker'".into(),
            )
            .into());
        }
        if repositories.len() > 1 {
            return Err(ApplicationError::StrategyConflict(
                "--dockerfile cannot be used with multiple source repositories".into(),
            )
            .into());
        }
        let owner = repositories.first().map(|r| r.to_string()).unwrap_or_default();
        dockerfile.require_base_image(&owner)?;

        match repositories.first_mut() {
            Some(repo) => repo.strategy = Some(BuildStrategy::Docker),
            None => repositories.push(SourceRepository::for_dockerfile(dockerfile.clone())),
        }
        Ok(())
    }

    /// After inspection, let the literal Dockerfile replace the one found in
    /// the repository.
    pub fn override_dockerfile(&self, repositories: &mut [SourceRepository]) {
        let Some(dockerfile) = &self.options.dockerfile else {
            return;
        };
        for repo in repositories.iter_mut().filter(|r| !r.is_synthetic()) {
            repo.info
                .get_or_insert_with(SourceRepositoryInfo::default)
                .dockerfile = Some(dockerfile.clone());
        }
    }

    // ── Source attachment ─────────────────────────────────────────────────────

    /// Bind repositories to components that expect to build.
    ///
    /// One component and one free repository are paired. Any other
    /// combination with free repositories needs explicit `image~repo`.
    /// Without free repositories the component degrades to an image
    /// deployment, unless source images give it something to build from.
    #[instrument(skip_all)]
    pub fn ensure_has_source(
        &self,
        components: &mut [ComponentInput],
        repositories: &[SourceRepository],
    ) -> NewAppResult<()> {
        let needing: Vec<usize> = components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.needs_source() && !c.is_template)
            .map(|(i, _)| i)
            .collect();
        let unbound = unbound_repositories(components, repositories);

        match (needing.len(), unbound.len()) {
            (0, _) => {}
            (_, 0) => {
                if self.options.source_images.is_empty() {
                    for &i in &needing {
                        debug!(component = %components[i], "No source available, deploying image directly");
                        components[i].expect_to_build = false;
                    }
                }
            }
            (1, 1) => {
                components[needing[0]].uses = Some(unbound[0]);
            }
            (1, _) => {
                let component = &components[needing[0]].value;
                let suggestions: Vec<String> = unbound
                    .iter()
                    .map(|&r| format!("  {component}~{}", repositories[r]))
                    .collect();
                return Err(ApplicationError::SourceAssociation {
                    message: format!(
                        "there are multiple code locations provided - use one of the following suggestions to declare which code goes with the image:\n{}",
                        suggestions.join("\n")
                    ),
                }
                .into());
            }
            _ => {
                return Err(ApplicationError::SourceAssociation {
                    message: "Use '[image]~[repo]' to declare which code goes with which image".into(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Components for repositories nothing is bound to: the Dockerfile's
    /// base image for docker builds, otherwise the detected language.
    pub fn derive_components(
        &self,
        components: &[ComponentInput],
        repositories: &[SourceRepository],
    ) -> NewAppResult<Vec<ComponentInput>> {
        let mut next_group = components.iter().map(|c| c.group + 1).max().unwrap_or(0);
        let mut derived = Vec::new();

        for idx in unbound_repositories(components, repositories) {
            let repo = &repositories[idx];
            let docker = self.options.strategy == Some(BuildStrategy::Docker)
                || repo.strategy == Some(BuildStrategy::Docker)
                || self.options.dockerfile.is_some();

            let mut input = if !docker && !repo.terms().is_empty() {
                ComponentInput::new(repo.terms().join(","))
                    .with_terms(repo.terms().to_vec())
                    .with_resolver(Some(ResolverKind::SourceLanguage))
            } else if let Some(dockerfile) = repo.dockerfile() {
                let base = dockerfile.require_base_image(&repo.to_string())?;
                ComponentInput::new(base).with_resolver(Some(ResolverKind::DockerfileBase))
            } else {
                return Err(ApplicationError::NoLanguageDetected {
                    repository: repo.to_string(),
                }
                .into());
            };

            input.uses = Some(idx);
            input.expect_to_build = true;
            input.derived = true;
            input.group = next_group;
            next_group += 1;
            debug!(repository = %repo, component = %input.value, "Derived component");
            derived.push(input);
        }
        Ok(derived)
    }

    // ── Assembly ──────────────────────────────────────────────────────────────

    #[instrument(skip_all, fields(components = components.len()))]
    pub fn assemble(
        &self,
        components: &[ComponentInput],
        repositories: &[SourceRepository],
    ) -> NewAppResult<Assembly> {
        let mut assembly = Assembly::default();
        let mut names = NameRegistry::default();

        for (idx, input) in components.iter().enumerate() {
            let resolved = input.resolved.as_ref().ok_or_else(|| NewAppError::Internal {
                message: format!("component \"{}\" reached assembly unresolved", input.value),
            })?;

            if resolved.is_template() {
                assembly.templates.push(TemplatePlan {
                    component: idx,
                    template: resolved.clone(),
                    parameters: self.options.template_parameters.clone(),
                });
                continue;
            }

            let repository = input.uses.and_then(|i| repositories.get(i));
            let name = names.claim(&self.base_name(input, resolved, repository));
            let mut pipeline = Pipeline {
                name,
                component: idx,
                group: input.group,
                input: resolved.clone(),
                build: None,
                deploy: self.options.deploy,
                environment: self.options.environment.clone(),
            };

            if input.expect_to_build {
                let strategy = self.select_strategy(input, resolved, repository)?;
                if strategy != PipelineStrategy::SourceBuild {
                    fill_metadata_from_dockerfile(&mut pipeline.input, repository);
                }
                self.check_secrets(strategy)?;
                let output = self.output_target(&pipeline.name);
                if let Some(output) = &output {
                    if let Some(d) = self.check_circular(&pipeline.input, output)? {
                        assembly.diagnostics.push(d);
                    }
                }
                pipeline.build = Some(BuildPlan {
                    strategy,
                    repository: repository.cloned(),
                    dockerfile: (strategy == PipelineStrategy::DockerBuildFromDockerfile)
                        .then(|| self.options.dockerfile.clone())
                        .flatten(),
                    source_images: self.options.source_images.clone(),
                    output,
                    environment: self.options.build_environment.clone(),
                    secrets: self.options.secrets.clone(),
                });
            }

            debug!(name = %pipeline.name, strategy = %pipeline.strategy(), "Pipeline assembled");
            assembly.pipelines.push(pipeline);
        }

        if !self.options.template_parameters.is_empty() && assembly.templates.is_empty() {
            return Err(ApplicationError::TemplateParameter {
                reason: "template parameters were provided, but no template was found".into(),
            }
            .into());
        }
        Ok(assembly)
    }

    /// Explicit name, then repository name, then `--to`, then the image.
    fn base_name(
        &self,
        input: &ComponentInput,
        resolved: &ComponentMatch,
        repository: Option<&SourceRepository>,
    ) -> String {
        if let Some(name) = &self.options.name {
            return name.clone();
        }
        let building = input.expect_to_build;
        let from_repo = repository
            .filter(|_| building)
            .and_then(SourceRepository::name)
            .and_then(|n| DomainValidator::sanitize_name(&n));
        let from_to = self
            .options
            .to
            .as_ref()
            .filter(|_| building)
            .and_then(|t| DomainValidator::sanitize_name(&t.name));
        let from_image = resolved
            .image()
            .and_then(|r| DomainValidator::sanitize_name(&r.name));

        from_repo
            .or(from_to)
            .or(from_image)
            .or_else(|| DomainValidator::sanitize_name(&input.value))
            .unwrap_or_else(|| "app".to_string())
    }

    fn select_strategy(
        &self,
        input: &ComponentInput,
        resolved: &ComponentMatch,
        repository: Option<&SourceRepository>,
    ) -> NewAppResult<PipelineStrategy> {
        if self.options.dockerfile.is_some() && repository.is_some() {
            return Ok(PipelineStrategy::DockerBuildFromDockerfile);
        }

        let explicit = repository
            .and_then(|r| r.strategy)
            .or(self.options.strategy)
            .or((input.resolver == Some(ResolverKind::DockerfileBase)).then_some(BuildStrategy::Docker));

        match explicit {
            Some(BuildStrategy::Source) => Ok(PipelineStrategy::SourceBuild),
            Some(BuildStrategy::Docker) if repository.is_some() => {
                Ok(PipelineStrategy::DockerBuildFromRepository)
            }
            Some(BuildStrategy::Docker) => Err(ApplicationError::StrategyConflict(format!(
                "a docker build of \"{}\" requires a source repository or --dockerfile",
                input.value
            ))
            .into()),
            None if resolved.is_builder() => Ok(PipelineStrategy::SourceBuild),
            None if repository.and_then(SourceRepository::dockerfile).is_some() => {
                Ok(PipelineStrategy::DockerBuildFromRepository)
            }
            None => Err(ApplicationError::CannotBuildSource {
                value: input.value.clone(),
            }
            .into()),
        }
    }

    fn check_secrets(&self, strategy: PipelineStrategy) -> NewAppResult<()> {
        if strategy == PipelineStrategy::SourceBuild {
            return Ok(());
        }
        match self.options.secrets.iter().find(|s| s.destination_dir.starts_with('/')) {
            Some(s) => Err(ApplicationError::StrategyConflict(format!(
                "for the docker strategy, the secret destination directory \"{}\" must be a relative path",
                s.destination_dir
            ))
            .into()),
            None => Ok(()),
        }
    }

    fn output_target(&self, name: &str) -> Option<OutputTarget> {
        if self.options.no_output {
            return None;
        }
        let to = self.options.to.as_ref();
        if self.options.output_docker {
            return Some(OutputTarget::DockerImage(
                to.cloned().unwrap_or_else(|| ImageReference::named(name)),
            ));
        }
        Some(OutputTarget::Tracker {
            name: to
                .and_then(|t| DomainValidator::sanitize_name(&t.name))
                .unwrap_or_else(|| name.to_string()),
            tag: to
                .and_then(|t| t.tag.clone())
                .unwrap_or_else(|| DEFAULT_TAG.to_string()),
        })
    }

    /// Compare default-completed input and output references. Identical
    /// references are fatal unless the output was named explicitly.
    fn check_circular(
        &self,
        input: &ComponentMatch,
        output: &OutputTarget,
    ) -> NewAppResult<Option<Diagnostic>> {
        let Some(input_ref) = input.image() else {
            return Ok(None);
        };
        let output_ref = match output {
            OutputTarget::Tracker { name, tag } => ImageReference::named(name.clone()).with_tag(tag.clone()),
            OutputTarget::DockerImage(r) => r.clone(),
        };
        let reference = input_ref.identity();
        if reference != output_ref.identity() {
            return Ok(None);
        }
        if self.options.to.is_some() || self.options.output_docker {
            return Ok(Some(Diagnostic::warning(format!(
                "the input and output image stream tags are identical (\"{reference}\")"
            ))));
        }
        Err(ApplicationError::CircularOutputReference { reference }.into())
    }
}

fn unbound_repositories(components: &[ComponentInput], repositories: &[SourceRepository]) -> Vec<usize> {
    (0..repositories.len())
        .filter(|i| !components.iter().any(|c| c.uses == Some(*i)))
        .collect()
}

/// A docker build whose base image is unknown still exposes what its
/// Dockerfile declares.
fn fill_metadata_from_dockerfile(input: &mut ComponentMatch, repository: Option<&SourceRepository>) {
    let Some(dockerfile) = repository.and_then(SourceRepository::dockerfile) else {
        return;
    };
    if let Some(slot) = input.metadata_mut() {
        if slot.is_none() {
            *slot = Some(ImageMetadata {
                exposed_ports: dockerfile.exposed_ports(),
                ..Default::default()
            });
        }
    }
}

/// Hands out unique names in request order.
#[derive(Debug, Default)]
struct NameRegistry {
    used: Vec<String>,
}

impl NameRegistry {
    fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.used.push(candidate.clone());
        candidate
    }
}
