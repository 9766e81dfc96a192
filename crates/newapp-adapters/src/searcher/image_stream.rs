//! Searcher over image trackers that already exist on the platform.

use std::sync::Arc;

use tracing::{debug, instrument};

use newapp_core::application::ports::Searcher;
use newapp_core::domain::{ComponentMatch, ImageReference, MatchPayload};
use newapp_core::error::NewAppResult;

use super::{EXACT_SCORE, NAME_SCORE, SUPPORTS_SCORE, best_term, fuzzy, supports};
use crate::catalog::{Catalog, CatalogImageStream};

/// Searches image stream tags, optionally limited to some namespaces.
pub struct ImageStreamSearcher {
    catalog: Arc<Catalog>,
    namespaces: Vec<String>,
}

impl ImageStreamSearcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            namespaces: Vec::new(),
        }
    }

    /// Only search these namespaces; empty searches all of them.
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces = namespaces;
        self
    }

    fn in_scope(&self, stream: &CatalogImageStream) -> bool {
        self.namespaces.is_empty() || self.namespaces.contains(&stream.namespace)
    }
}

/// `ruby` and `ruby:latest` name the `latest` tag exactly; `ruby` against
/// any other tag of the same stream is a partial match.
fn score_stream(term: &str, stream: &CatalogImageStream) -> Option<f32> {
    if let Ok(wanted) = ImageReference::parse(term) {
        let namespace_fits = wanted.namespace.as_deref().is_none_or(|ns| ns == stream.namespace);
        if wanted.registry.is_none() && namespace_fits && wanted.name == stream.name {
            return match wanted.tag.as_deref() {
                Some(tag) if tag == stream.tag => Some(EXACT_SCORE),
                Some(_) => None,
                None if stream.tag == "latest" => Some(EXACT_SCORE),
                None => Some(NAME_SCORE),
            };
        }
    }
    if supports(&stream.metadata.supports, term) {
        return Some(SUPPORTS_SCORE);
    }
    fuzzy(term, &stream.name)
}

impl Searcher for ImageStreamSearcher {
    fn name(&self) -> &'static str {
        "imagestream"
    }

    #[instrument(skip_all, fields(searcher = "imagestream", terms = ?terms))]
    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        let mut matches = Vec::new();
        for stream in self.catalog.image_streams.iter().filter(|s| self.in_scope(s)) {
            let Some((term, score)) = best_term(terms, |t| score_stream(t, stream)) else {
                continue;
            };
            let display = stream.display_name();
            matches.push(ComponentMatch {
                value: term.to_string(),
                name: display.clone(),
                argument: format!("--image={display}"),
                description: stream.metadata.description.clone(),
                score,
                insecure: false,
                local_only: false,
                payload: MatchPayload::ImageStream {
                    reference: stream.image_reference()?,
                    stream: stream.name.clone(),
                    tag: stream.tag.clone(),
                    metadata: Some(stream.metadata.to_image_metadata()?),
                },
            });
        }
        debug!(matches = matches.len(), "image stream search complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogMetadata;
    use newapp_core::domain::MatchKind;

    fn stream(namespace: &str, name: &str, tag: &str) -> CatalogImageStream {
        CatalogImageStream {
            name: name.into(),
            namespace: namespace.into(),
            tag: tag.into(),
            image: format!("centos/{name}"),
            metadata: CatalogMetadata {
                supports: vec![name.to_string()],
                builder: true,
                ..Default::default()
            },
        }
    }

    fn searcher() -> ImageStreamSearcher {
        ImageStreamSearcher::new(Arc::new(Catalog {
            image_streams: vec![
                stream("openshift", "ruby", "latest"),
                stream("openshift", "ruby", "2.2"),
                stream("other", "python", "3.5"),
            ],
            ..Default::default()
        }))
    }

    #[test]
    fn untagged_term_is_exact_for_latest_only() {
        let found = searcher().search(&["ruby".to_string()]).unwrap();
        assert_eq!(found.len(), 2);
        let latest = found.iter().find(|m| m.name == "openshift/ruby:latest").unwrap();
        let older = found.iter().find(|m| m.name == "openshift/ruby:2.2").unwrap();
        assert!(latest.is_exact());
        assert_eq!(older.score, NAME_SCORE);
        assert_eq!(latest.kind(), MatchKind::BuilderImage);
    }

    #[test]
    fn explicit_tag_selects_one_stream_tag() {
        let found = searcher().search(&["openshift/ruby:2.2".to_string()]).unwrap();
        let exact: Vec<_> = found.iter().filter(|m| m.is_exact()).collect();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].argument, "--image=openshift/ruby:2.2");
    }

    #[test]
    fn namespaces_limit_the_search() {
        let limited = searcher().with_namespaces(vec!["openshift".into()]);
        assert!(limited.search(&["python".to_string()]).unwrap().is_empty());
        assert_eq!(searcher().search(&["python".to_string()]).unwrap().len(), 1);
    }
}
