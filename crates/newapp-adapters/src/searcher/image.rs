//! Searchers over catalogued images: the registry and the local daemon.

use std::sync::Arc;

use tracing::{debug, instrument};

use newapp_core::application::ports::Searcher;
use newapp_core::domain::{ComponentMatch, MatchPayload};
use newapp_core::error::NewAppResult;

use super::{best_term, score_image};
use crate::catalog::{Catalog, CatalogImage};

/// Images that can be pulled from a registry.
pub struct RegistrySearcher {
    catalog: Arc<Catalog>,
}

impl RegistrySearcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Searcher for RegistrySearcher {
    fn name(&self) -> &'static str {
        "registry"
    }

    #[instrument(skip_all, fields(searcher = "registry", terms = ?terms))]
    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        let mut matches = Vec::new();
        for image in self.catalog.images.iter().filter(|i| i.registry) {
            if let Some(m) = image_match(image, terms, false, false)? {
                matches.push(m);
            }
        }
        debug!(matches = matches.len(), "registry search complete");
        Ok(matches)
    }
}

/// Images present in the local container daemon.
///
/// An image that is in the daemon but not in any registry is marked
/// `local_only`: it can be used as is but never imported into a tracker.
pub struct DaemonSearcher {
    catalog: Arc<Catalog>,
    insecure: bool,
}

impl DaemonSearcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            insecure: false,
        }
    }

    /// Mark every match as coming from an insecure registry.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

impl Searcher for DaemonSearcher {
    fn name(&self) -> &'static str {
        "daemon"
    }

    #[instrument(skip_all, fields(searcher = "daemon", terms = ?terms))]
    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        let mut matches = Vec::new();
        for image in self.catalog.images.iter().filter(|i| i.daemon) {
            if let Some(m) = image_match(image, terms, !image.registry, self.insecure)? {
                matches.push(m);
            }
        }
        debug!(matches = matches.len(), "daemon search complete");
        Ok(matches)
    }
}

fn image_match(
    image: &CatalogImage,
    terms: &[String],
    local_only: bool,
    insecure: bool,
) -> NewAppResult<Option<ComponentMatch>> {
    let reference = image.image_reference()?;
    let Some((term, score)) = best_term(terms, |t| {
        score_image(t, &reference, &image.metadata.supports)
    }) else {
        return Ok(None);
    };

    Ok(Some(ComponentMatch {
        value: term.to_string(),
        name: reference.exact(),
        argument: format!("--image={}", reference.exact()),
        description: image.metadata.description.clone(),
        score,
        insecure,
        local_only,
        payload: MatchPayload::DockerImage {
            metadata: Some(image.metadata.to_image_metadata()?),
            reference,
        },
    }))
}
