//! Command handlers.
//!
//! Each submodule exposes an `execute` function taking its parsed args, the
//! global flags, the loaded config and the output manager.

pub mod build;
pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use newapp_adapters::{
    DaemonSearcher, DockerfileFileTester, ImageStreamSearcher, LocalTreeProvider,
    RegistrySearcher, TemplateSearcher, default_detectors, detectors_by_name, resolve_catalog,
};
use newapp_core::application::ports::Searcher;
use newapp_core::prelude::{GenerateService, RepositoryInspector};

use crate::{cli::GlobalArgs, config::AppConfig, error::CliResult};

/// Wire the engine to the catalog searchers, detectors and local trees
/// selected by flags and config.
#[instrument(skip_all)]
pub fn build_service(
    global: &GlobalArgs,
    config: &AppConfig,
    insecure_registry: bool,
) -> CliResult<GenerateService> {
    let paths: Vec<PathBuf> = if global.catalog.is_empty() {
        config.catalog.path.iter().cloned().collect()
    } else {
        global.catalog.clone()
    };
    let include_builtin = config.catalog.builtin && !global.no_builtin_catalog;
    let catalog = Arc::new(resolve_catalog(&paths, include_builtin)?);
    debug!(entries = catalog.len(), "catalog ready");

    // Image streams first so platform-tracked images win over raw registry hits.
    let images: Vec<Arc<dyn Searcher>> = vec![
        Arc::new(
            ImageStreamSearcher::new(Arc::clone(&catalog))
                .with_namespaces(config.catalog.namespaces.clone()),
        ),
        Arc::new(RegistrySearcher::new(Arc::clone(&catalog))),
        Arc::new(DaemonSearcher::new(Arc::clone(&catalog)).insecure(insecure_registry)),
    ];
    let templates: Vec<Arc<dyn Searcher>> = vec![Arc::new(TemplateSearcher::new(catalog))];

    let detectors = if config.detectors.order.is_empty() {
        default_detectors()
    } else {
        detectors_by_name(&config.detectors.order)?
    };
    let inspector = RepositoryInspector::new(
        Arc::new(LocalTreeProvider::new()),
        detectors,
        Arc::new(DockerfileFileTester::new()),
    );

    Ok(GenerateService::new(images, templates, inspector))
}
