//! Object Synthesizer.
//!
//! Turns assembled pipelines into the platform object graph: image
//! trackers, build definitions, deploy definitions, network exposures and
//! template instantiations. Upstream images get one tracker per image
//! repository; a build output and a deploy trigger share a tracker by name.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::domain::artifacts::{
    BuildDefinition, BuildSource, BuildStrategySpec, BuildTrigger, Container, DeployDefinition,
    DeployTrigger, GitSource, INSECURE_REPOSITORY_ANNOTATION, ImageSource, ImageTracker,
    NetworkExposure, ObjectMeta, ObjectRef, ServicePort, TemplateInstantiation, TrackerTag, Volume,
    VolumeMount, VolumeSource,
};
use crate::domain::{
    BuildPlan, ComponentMatch, DomainValidator, ImageReference, Labels, MatchPayload, ObjectGraph,
    OutputTarget, Pipeline, PipelineStrategy, PortSpec, ReferenceKind, TemplatePlan,
};
use crate::error::NewAppResult;

/// Selector key tying a deploy definition to its pods.
pub const DEPLOY_SELECTOR_KEY: &str = "deploymentconfig";

pub struct ObjectSynthesizer {
    labels: Labels,
    insecure_registry: bool,
}

impl ObjectSynthesizer {
    pub fn new(labels: Labels, insecure_registry: bool) -> Self {
        Self {
            labels,
            insecure_registry,
        }
    }

    #[instrument(skip_all, fields(pipelines = pipelines.len(), templates = templates.len()))]
    pub fn synthesize(&self, pipelines: &[Pipeline], templates: &[TemplatePlan]) -> NewAppResult<ObjectGraph> {
        let labels = self.effective_labels(pipelines, templates);
        let mut graph = Graph {
            labels,
            out: ObjectGraph::default(),
            upstream: BTreeMap::new(),
            outputs: pipelines
                .iter()
                .filter_map(|p| match p.output()? {
                    OutputTarget::Tracker { name, .. } => Some(name.clone()),
                    OutputTarget::DockerImage(_) => None,
                })
                .collect(),
        };

        let mut images = Vec::with_capacity(pipelines.len());
        for pipeline in pipelines {
            let input = self.track_input(&mut graph, pipeline);
            let deployed = match &pipeline.build {
                Some(plan) => {
                    let output = graph.track_output(plan.output.as_ref());
                    let build = self.build_definition(&mut graph, pipeline, plan, input);
                    graph.out.builds.push(build);
                    output
                }
                None => Some(input),
            };
            images.push(deployed);
        }

        for members in deploy_groups(pipelines) {
            let deploy = graph.deploy_definition(pipelines, &images, &members);
            if let Some(deploy) = deploy {
                let port = members
                    .iter()
                    .filter(|&&idx| images[idx].is_some())
                    .filter_map(|&idx| pipelines[idx].input.metadata()?.primary_port())
                    .min();
                if let Some(service) = graph.network_exposure(&deploy, port) {
                    graph.out.services.push(service);
                }
                graph.out.deployments.push(deploy);
            }
        }

        for plan in templates {
            let instantiation = graph.template_instantiation(plan)?;
            graph.out.template_instantiations.push(instantiation);
        }

        debug!(objects = graph.out.len(), "Object graph synthesized");
        Ok(graph.out)
    }

    /// User labels, or `app=<first name>` when none were given.
    fn effective_labels(&self, pipelines: &[Pipeline], templates: &[TemplatePlan]) -> BTreeMap<String, String> {
        if !self.labels.is_empty() {
            return self.labels.as_map().clone();
        }
        let primary = pipelines
            .first()
            .map(|p| p.name.clone())
            .or_else(|| templates.first().map(|t| t.template.name.clone()));
        primary
            .map(|name| BTreeMap::from([("app".to_string(), name)]))
            .unwrap_or_default()
    }

    /// Create (or reuse) the tracker an input image is read through and
    /// return the reference builds and deploys should use. Builds name it
    /// after the image, direct deploys after the pipeline.
    fn track_input(&self, graph: &mut Graph, pipeline: &Pipeline) -> ObjectRef {
        let name = if pipeline.build.is_some() {
            pipeline
                .input
                .image()
                .and_then(|r| DomainValidator::sanitize_name(&r.name))
                .unwrap_or_else(|| pipeline.name.clone())
        } else {
            pipeline.name.clone()
        };
        self.track_image(graph, &pipeline.input, &name, pipeline.output())
    }

    /// `own_output` is the only output tracker this image may share a name
    /// with.
    fn track_image(
        &self,
        graph: &mut Graph,
        image: &ComponentMatch,
        preferred: &str,
        own_output: Option<&OutputTarget>,
    ) -> ObjectRef {
        match &image.payload {
            MatchPayload::ImageStream { stream, tag, .. } => ObjectRef::stream_tag(stream, tag),
            MatchPayload::DockerImage { reference, .. } if image.local_only => {
                ObjectRef::docker_image(reference.exact())
            }
            MatchPayload::DockerImage { reference, .. } => {
                let tag = reference.tag_or_default().to_string();
                let name = graph.upstream_tracker(reference, preferred, own_output);
                let tracker_tag = TrackerTag {
                    name: tag.clone(),
                    from: Some(ObjectRef::docker_image(reference.exact())),
                };
                let insecure = image.insecure || self.insecure_registry;
                graph.add_tracker(&name, Some(reference.repository()), tracker_tag, insecure);
                ObjectRef::stream_tag(&name, &tag)
            }
            // Templates never reach here; fall back to the raw value.
            MatchPayload::Template(_) => ObjectRef::docker_image(image.value.clone()),
        }
    }

    fn build_definition(
        &self,
        graph: &mut Graph,
        pipeline: &Pipeline,
        plan: &BuildPlan,
        input: ObjectRef,
    ) -> BuildDefinition {
        let mut source = BuildSource::default();
        if let Some(repo) = plan.repository.as_ref().filter(|r| !r.is_synthetic()) {
            source.git = Some(GitSource {
                uri: repo.uri(),
                reference: repo.git_ref().map(str::to_string),
            });
            source.context_dir = repo.context_dir.clone();
        }
        source.dockerfile = plan.dockerfile.as_ref().map(|d| d.content().to_string());
        for image in &plan.source_images {
            let name = image
                .image
                .image()
                .and_then(|r| DomainValidator::sanitize_name(&r.name))
                .unwrap_or_else(|| image.image.name.clone());
            source.images.push(ImageSource {
                from: self.track_image(graph, &image.image, &name, None),
                paths: image.paths.clone(),
            });
        }
        source.secrets = plan.secrets.clone();

        let env = plan.environment.clone();
        let strategy = match plan.strategy {
            PipelineStrategy::DockerBuildFromRepository | PipelineStrategy::DockerBuildFromDockerfile => {
                BuildStrategySpec::Docker { from: Some(input), env }
            }
            PipelineStrategy::SourceBuild | PipelineStrategy::DirectImage => {
                BuildStrategySpec::Source { from: input, env }
            }
        };

        BuildDefinition {
            meta: ObjectMeta::new(pipeline.name.clone(), graph.labels.clone()),
            source,
            strategy,
            output: plan.output.as_ref().map(output_ref),
            triggers: vec![BuildTrigger::ConfigChange, BuildTrigger::ImageChange],
        }
    }
}

fn output_ref(target: &OutputTarget) -> ObjectRef {
    match target {
        OutputTarget::Tracker { name, tag } => ObjectRef::stream_tag(name, tag),
        OutputTarget::DockerImage(r) => ObjectRef::docker_image(r.exact()),
    }
}

/// Indices of deploying pipelines, grouped by deployment group in order of
/// first appearance.
fn deploy_groups(pipelines: &[Pipeline]) -> Vec<Vec<usize>> {
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for (idx, p) in pipelines.iter().enumerate().filter(|(_, p)| p.deploy) {
        match groups.iter_mut().find(|(g, _)| *g == p.group) {
            Some((_, members)) => members.push(idx),
            None => groups.push((p.group, vec![idx])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

// ── Graph builder ─────────────────────────────────────────────────────────────

struct Graph {
    labels: BTreeMap<String, String>,
    out: ObjectGraph,
    /// Upstream image repository -> tracker name.
    upstream: BTreeMap<String, String>,
    /// Tracker names builds push into.
    outputs: BTreeSet<String>,
}

impl Graph {
    /// Tracker name for an upstream image. A name held by another upstream
    /// image, or by an output other than `own_output`, gets a numeric suffix.
    fn upstream_tracker(
        &mut self,
        reference: &ImageReference,
        preferred: &str,
        own_output: Option<&OutputTarget>,
    ) -> String {
        let key = reference.docker_client_defaults().repository();
        if let Some(name) = self.upstream.get(&key) {
            return name.clone();
        }
        let own = match own_output {
            Some(OutputTarget::Tracker { name, .. }) => Some(name.as_str()),
            _ => None,
        };
        let taken = |candidate: &str| {
            self.upstream.values().any(|t| t == candidate)
                || (self.outputs.contains(candidate) && own != Some(candidate))
        };
        let mut name = preferred.to_string();
        let mut n = 0;
        while taken(&name) {
            n += 1;
            name = format!("{preferred}-{n}");
        }
        debug!(image = %key, tracker = %name, "Upstream tracker assigned");
        self.upstream.insert(key, name.clone());
        name
    }

    fn add_tracker(&mut self, name: &str, repository: Option<String>, tag: TrackerTag, insecure: bool) {
        let tracker = match self.out.image_trackers.iter_mut().position(|t| t.meta.name == name) {
            Some(i) => &mut self.out.image_trackers[i],
            None => {
                self.out.image_trackers.push(ImageTracker {
                    meta: ObjectMeta::new(name, self.labels.clone()),
                    docker_image_repository: None,
                    tags: Vec::new(),
                });
                let last = self.out.image_trackers.len() - 1;
                &mut self.out.image_trackers[last]
            }
        };
        if tracker.docker_image_repository.is_none() && tag.from.is_some() {
            tracker.docker_image_repository = repository;
        }
        if insecure {
            tracker
                .meta
                .annotations
                .insert(INSECURE_REPOSITORY_ANNOTATION.to_string(), "true".to_string());
        }
        if !tracker.tags.iter().any(|t| t.name == tag.name) {
            tracker.tags.push(tag);
        }
    }

    /// Output trackers have no upstream; the build pushes into them.
    fn track_output(&mut self, output: Option<&OutputTarget>) -> Option<ObjectRef> {
        let output = output?;
        if let OutputTarget::Tracker { name, tag } = output {
            self.add_tracker(
                name,
                None,
                TrackerTag {
                    name: tag.clone(),
                    from: None,
                },
                false,
            );
        }
        Some(output_ref(output))
    }

    fn deploy_definition(
        &self,
        pipelines: &[Pipeline],
        images: &[Option<ObjectRef>],
        members: &[usize],
    ) -> Option<DeployDefinition> {
        let mut containers = Vec::new();
        let mut volumes = Vec::new();
        let mut triggers = vec![DeployTrigger::ConfigChange];

        for &idx in members {
            let pipeline = &pipelines[idx];
            // A build with no output has nothing to deploy.
            let Some(image) = &images[idx] else { continue };
            let metadata = pipeline.input.metadata();

            let mut mounts = Vec::new();
            for (n, path) in metadata.map(|m| m.volumes.as_slice()).unwrap_or_default().iter().enumerate() {
                let name = format!("{}-volume-{}", pipeline.name, n + 1);
                mounts.push(VolumeMount {
                    name: name.clone(),
                    mount_path: path.clone(),
                });
                volumes.push(Volume {
                    name,
                    source: VolumeSource::EmptyDir,
                });
            }

            if image.kind == ReferenceKind::ImageStreamTag {
                triggers.push(DeployTrigger::ImageChange {
                    container_names: vec![pipeline.name.clone()],
                    from: image.clone(),
                });
            }
            containers.push(Container {
                name: pipeline.name.clone(),
                image: image.name.clone(),
                ports: metadata.map(|m| m.sorted_ports()).unwrap_or_default(),
                env: pipeline.environment.clone(),
                volume_mounts: mounts,
            });
        }

        let name = containers.first()?.name.clone();
        let mut selector = self.labels.clone();
        selector.insert(DEPLOY_SELECTOR_KEY.to_string(), name.clone());
        Some(DeployDefinition {
            meta: ObjectMeta::new(name, self.labels.clone()),
            replicas: 1,
            selector,
            containers,
            volumes,
            triggers,
        })
    }

    /// One exposure on the primary port of the deployment, if any.
    fn network_exposure(&self, deploy: &DeployDefinition, port: Option<PortSpec>) -> Option<NetworkExposure> {
        let port = port?;
        Some(NetworkExposure {
            meta: ObjectMeta::new(deploy.meta.name.clone(), self.labels.clone()),
            selector: deploy.selector.clone(),
            ports: vec![ServicePort {
                name: format!("{}-{}", port.port, port.protocol),
                port: port.port,
                target_port: port.port,
                protocol: port.protocol,
            }],
        })
    }

    fn template_instantiation(&self, plan: &TemplatePlan) -> NewAppResult<TemplateInstantiation> {
        let Some(template) = plan.template.template() else {
            return Err(ApplicationError::TemplateParameter {
                reason: format!("\"{}\" is not a template", plan.template.name),
            }
            .into());
        };
        for key in plan.parameters.keys() {
            if template.parameter(key).is_none() {
                return Err(ApplicationError::TemplateParameter {
                    reason: format!("unexpected parameter name \"{key}\" for template \"{}\"", template.name),
                }
                .into());
            }
        }
        if let Some(missing) = template
            .parameters
            .iter()
            .find(|p| p.required && p.value.is_none() && !plan.parameters.contains_key(&p.name))
        {
            return Err(ApplicationError::TemplateParameter {
                reason: format!(
                    "template \"{}\" requires a value for parameter \"{}\"",
                    template.name, missing.name
                ),
            }
            .into());
        }

        let mut name = template.name.clone();
        let mut n = 0;
        while self.out.template_instantiations.iter().any(|t| t.meta.name == name) {
            n += 1;
            name = format!("{}-{n}", template.name);
        }
        Ok(TemplateInstantiation {
            meta: ObjectMeta::new(name, self.labels.clone()),
            template: template.name.clone(),
            parameters: plan.parameters.clone(),
        })
    }
}
