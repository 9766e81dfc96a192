//! `newapp generate` - resolve arguments into build and deploy artifacts.

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, instrument};

use newapp_core::prelude::{BuildStrategy, GenerationRequest, GenerationResult};

use crate::{
    cli::{GenerateArgs, GlobalArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Generate artifacts for both building and deploying.
pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    run(args, true, &global, &config, &output)
}

/// Shared by `generate` and `build`; `deploy` is `false` for the latter.
#[instrument(skip_all, fields(deploy = deploy, arguments = args.arguments.len()))]
pub(crate) fn run(
    args: GenerateArgs,
    deploy: bool,
    global: &GlobalArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let request = to_request(args, deploy, config)?;
    let service = super::build_service(global, config, request.insecure_registry)?;

    let spinner = output.spinner("Resolving components...");
    let result = service.generate(request);
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let result = result?;

    info!(
        name = %result.name,
        artifacts = result.graph.len(),
        diagnostics = result.diagnostics.len(),
        "generation complete"
    );
    for diagnostic in &result.diagnostics {
        output.diagnostic(diagnostic)?;
    }
    render(&result, output)
}

/// Merge flags with config defaults into an engine request.
fn to_request(args: GenerateArgs, deploy: bool, config: &AppConfig) -> CliResult<GenerationRequest> {
    let strategy = match (args.strategy, config.defaults.strategy.as_deref()) {
        (Some(flag), _) => Some(BuildStrategy::from(flag)),
        (None, Some(default)) if !default.is_empty() => {
            Some(default.parse::<BuildStrategy>().map_err(|e| CliError::ConfigError {
                message: format!("defaults.strategy: {e}"),
                source: Some(Box::new(e)),
            })?)
        }
        _ => None,
    };

    let dockerfile = match args.dockerfile.as_deref() {
        Some("-") => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .with_cli_context(|| "Failed to read Dockerfile from stdin")?;
            Some(content)
        }
        other => other.map(str::to_owned),
    };

    let mut labels = config.defaults.labels.clone();
    labels.extend(args.labels);

    Ok(GenerationRequest {
        arguments: args.arguments.iter().map(|a| canonicalize_local(a)).collect(),
        images: args.images,
        templates: args.templates,
        source_repositories: args.code.iter().map(|c| canonicalize_local(c)).collect(),
        groups: args.groups,
        environment: args.env,
        build_environment: args.build_env,
        template_parameters: args.params,
        labels,
        name: args.name,
        strategy,
        dockerfile,
        context_dir: args.context_dir,
        to: args.to,
        output_docker: args.to_docker,
        no_output: args.no_output,
        deploy,
        secrets: args.build_secrets,
        source_image: args.source_image,
        source_image_paths: args.source_image_paths,
        insecure_registry: args.insecure_registry || config.defaults.insecure_registry,
        allow_missing_images: args.allow_missing_images || config.defaults.allow_missing_images,
    })
}

/// Replace a local directory (optionally behind `image~` or before `#ref`)
/// with its absolute path, so `.` gets a usable name.
fn canonicalize_local(token: &str) -> String {
    if token.contains('=') || token.contains("://") {
        return token.to_owned();
    }
    let (prefix, rest) = match token.split_once('~') {
        Some((image, code)) if !image.is_empty() => (Some(image), code),
        _ => (None, token),
    };
    let (location, git_ref) = match rest.split_once('#') {
        Some((location, r)) => (location, Some(r)),
        None => (rest, None),
    };

    let path = Path::new(location);
    if location.is_empty() || !path.is_dir() {
        return token.to_owned();
    }
    let Ok(absolute) = path.canonicalize() else {
        return token.to_owned();
    };
    debug!(from = location, to = %absolute.display(), "canonicalized local source");

    let mut out = String::new();
    if let Some(image) = prefix {
        out.push_str(image);
        out.push('~');
    }
    out.push_str(&absolute.to_string_lossy());
    if let Some(r) = git_ref {
        out.push('#');
        out.push_str(r);
    }
    out
}

fn render(result: &GenerationResult, output: &OutputManager) -> CliResult<()> {
    match output.format() {
        OutputFormat::Json => output.data(&serde_json::to_string_pretty(result)?)?,
        OutputFormat::Compact => output.data(&serde_json::to_string(result)?)?,
        OutputFormat::Human | OutputFormat::Plain | OutputFormat::Auto => {
            let graph = &result.graph;
            output.header(&format!("Artifacts for \"{}\":", result.name))?;
            let lines = graph
                .image_trackers
                .iter()
                .map(|o| format!("imagestream/{}", o.meta.name))
                .chain(graph.builds.iter().map(|o| format!("build/{}", o.meta.name)))
                .chain(graph.deployments.iter().map(|o| format!("deployment/{}", o.meta.name)))
                .chain(graph.services.iter().map(|o| format!("service/{}", o.meta.name)))
                .chain(
                    graph
                        .template_instantiations
                        .iter()
                        .map(|o| format!("template/{} ({})", o.meta.name, o.template)),
                );
            for line in lines {
                output.data(&format!("  {line}"))?;
            }
            output.success(&format!("Generated {} artifacts", graph.len()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["newapp", "generate"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Generate(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flag_strategy_beats_config_default() {
        let mut config = AppConfig::default();
        config.defaults.strategy = Some("source".into());
        let request = to_request(generate_args(&["--strategy", "docker", "x"]), true, &config).unwrap();
        assert_eq!(request.strategy, Some(BuildStrategy::Docker));
    }

    #[test]
    fn config_strategy_applies_without_flag() {
        let mut config = AppConfig::default();
        config.defaults.strategy = Some("s2i".into());
        let request = to_request(generate_args(&["x"]), false, &config).unwrap();
        assert_eq!(request.strategy, Some(BuildStrategy::Source));
        assert!(!request.deploy);
    }

    #[test]
    fn bad_config_strategy_is_configuration_error() {
        let mut config = AppConfig::default();
        config.defaults.strategy = Some("custom".into());
        let err = to_request(generate_args(&["x"]), true, &config).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn config_labels_come_first() {
        let mut config = AppConfig::default();
        config.defaults.labels = vec!["team=core".into()];
        let request = to_request(generate_args(&["-l", "app=web", "x"]), true, &config).unwrap();
        assert_eq!(request.labels, vec!["team=core".to_string(), "app=web".to_string()]);
    }

    #[test]
    fn local_directories_become_absolute() {
        let dir = tempfile::TempDir::new().unwrap();
        let abs = dir.path().canonicalize().unwrap();
        let raw = dir.path().to_string_lossy().into_owned();

        assert_eq!(canonicalize_local(&raw), abs.to_string_lossy());
        assert_eq!(
            canonicalize_local(&format!("ruby~{raw}#main")),
            format!("ruby~{}#main", abs.to_string_lossy())
        );
    }

    #[test]
    fn non_directories_are_untouched() {
        assert_eq!(canonicalize_local("mysql"), "mysql");
        assert_eq!(canonicalize_local("A=B"), "A=B");
        assert_eq!(
            canonicalize_local("https://github.com/openshift/ruby-hello-world.git"),
            "https://github.com/openshift/ruby-hello-world.git"
        );
    }
}
