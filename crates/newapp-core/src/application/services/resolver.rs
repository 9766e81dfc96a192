//! Searcher & Resolver Framework.
//!
//! Searchers produce scored candidates; resolvers apply a policy to pick
//! exactly one. A [`ResolverSet`] maps each [`ResolverKind`] to the
//! resolver that serves it and resolves a whole request in parallel.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::application::ApplicationError;
use crate::application::services::fanout;
use crate::application::ports::Searcher;
use crate::domain::{BuildStrategy, ComponentInput, ComponentMatch, ImageReference, ResolverKind};
use crate::error::{NewAppError, NewAppResult};

/// Picks one match for a component value.
pub trait Resolver: Send + Sync {
    /// Resolve `value` by searching for `terms`.
    fn resolve(&self, value: &str, terms: &[String]) -> NewAppResult<ComponentMatch>;
}

/// Run every searcher, merging their results. Failures are logged and
/// returned separately so a single unreachable source does not mask
/// matches from the others.
pub(crate) fn search_all(
    searchers: &[Arc<dyn Searcher>],
    terms: &[String],
) -> (Vec<ComponentMatch>, Vec<NewAppError>) {
    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for searcher in searchers {
        match searcher.search(terms) {
            Ok(found) => {
                debug!(searcher = searcher.name(), count = found.len(), "Search completed");
                matches.extend(found);
            }
            Err(e) => {
                warn!(searcher = searcher.name(), error = %e, "Search failed");
                errors.push(e);
            }
        }
    }
    (matches, errors)
}

/// Keep the best-scored match per identity, best first. Ties keep
/// searcher order.
pub(crate) fn dedup_by_identity(mut matches: Vec<ComponentMatch>) -> Vec<ComponentMatch> {
    matches.sort_by(|a, b| a.score.total_cmp(&b.score));
    let mut seen = Vec::new();
    matches.retain(|m| {
        let id = m.identity();
        if seen.contains(&id) {
            false
        } else {
            seen.push(id);
            true
        }
    });
    matches
}

fn no_match_or_error(value: &str, errors: Vec<NewAppError>) -> NewAppError {
    errors.into_iter().next().unwrap_or_else(|| {
        ApplicationError::NoMatch {
            value: value.to_string(),
        }
        .into()
    })
}

fn ambiguous(value: &str, candidates: &[ComponentMatch]) -> NewAppError {
    ApplicationError::Ambiguous {
        value: value.to_string(),
        candidates: candidates.iter().map(|m| m.argument.clone()).collect(),
    }
    .into()
}

// ── UniqueExactOrInexactMatchResolver ─────────────────────────────────────────

/// The default policy.
///
/// 1. Exact matches that all share one identity win.
/// 2. Otherwise a single inexact candidate wins.
/// 3. Otherwise the value is unmatched or ambiguous.
pub struct UniqueExactOrInexactMatchResolver {
    searchers: Vec<Arc<dyn Searcher>>,
    /// Consulted only when no searcher produced a candidate.
    fallback: Option<Arc<dyn Searcher>>,
}

impl UniqueExactOrInexactMatchResolver {
    pub fn new(searchers: Vec<Arc<dyn Searcher>>) -> Self {
        Self {
            searchers,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn Searcher>>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Resolver for UniqueExactOrInexactMatchResolver {
    fn resolve(&self, value: &str, terms: &[String]) -> NewAppResult<ComponentMatch> {
        let (mut matches, errors) = search_all(&self.searchers, terms);
        if matches.is_empty() {
            if let Some(fallback) = &self.fallback {
                matches = fallback.search(terms)?;
            }
        }
        if matches.is_empty() {
            return Err(no_match_or_error(value, errors));
        }

        let (exact, inexact): (Vec<_>, Vec<_>) = matches.into_iter().partition(|m| m.is_exact());

        if let Some(first) = exact.first() {
            let id = first.identity();
            if exact.iter().all(|m| m.identity() == id) {
                return Ok(first.clone());
            }
            return Err(ambiguous(value, &dedup_by_identity(exact)));
        }

        let mut candidates = dedup_by_identity(inexact);
        match candidates.len() {
            0 => Err(no_match_or_error(value, errors)),
            1 => Ok(candidates.remove(0)),
            _ => Err(ambiguous(value, &candidates)),
        }
    }
}

// ── FirstMatchResolver ────────────────────────────────────────────────────────

/// Takes the best candidate without any ambiguity check.
///
/// Used for detected language terms, where several builders may serve a
/// language and any of them will do, and for Dockerfile base images.
pub struct FirstMatchResolver {
    searchers: Vec<Arc<dyn Searcher>>,
    builders_only: bool,
    exact_only: bool,
    fallback: Option<Arc<dyn Searcher>>,
}

impl FirstMatchResolver {
    pub fn new(searchers: Vec<Arc<dyn Searcher>>) -> Self {
        Self {
            searchers,
            builders_only: false,
            exact_only: false,
            fallback: None,
        }
    }

    pub fn builders_only(mut self) -> Self {
        self.builders_only = true;
        self
    }

    pub fn exact_only(mut self) -> Self {
        self.exact_only = true;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn Searcher>>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Resolver for FirstMatchResolver {
    fn resolve(&self, value: &str, terms: &[String]) -> NewAppResult<ComponentMatch> {
        let (matches, errors) = search_all(&self.searchers, terms);
        let mut candidates: Vec<ComponentMatch> = matches
            .into_iter()
            .filter(|m| !self.builders_only || m.is_builder())
            .filter(|m| !self.exact_only || m.is_exact())
            .collect();
        candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

        if let Some(best) = candidates.into_iter().next() {
            return Ok(best);
        }
        if let Some(fallback) = &self.fallback {
            if let Some(m) = fallback.search(terms)?.into_iter().next() {
                return Ok(m);
            }
        }
        Err(no_match_or_error(value, errors))
    }
}

// ── MissingImageSearcher ──────────────────────────────────────────────────────

/// Treats every syntactically valid image reference as an exact match
/// without metadata. Sits at the tail of an image chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingImageSearcher;

impl Searcher for MissingImageSearcher {
    fn name(&self) -> &'static str {
        "missing-image"
    }

    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        Ok(terms
            .iter()
            .filter_map(|t| ImageReference::parse(t).ok().map(|r| (t, r)))
            .map(|(t, r)| ComponentMatch::unresolved(t, r))
            .collect())
    }
}

// ── ResolverSet ───────────────────────────────────────────────────────────────

/// One optional resolver per [`ResolverKind`].
#[derive(Default, Clone)]
pub struct ResolverSet {
    pub default: Option<Arc<dyn Resolver>>,
    pub image_only: Option<Arc<dyn Resolver>>,
    pub template_only: Option<Arc<dyn Resolver>>,
    pub source_language: Option<Arc<dyn Resolver>>,
    pub dockerfile_base: Option<Arc<dyn Resolver>>,
}

impl ResolverSet {
    /// Wire the standard resolvers from image and template searchers.
    ///
    /// With `allow_missing_images` an image no source knows becomes an
    /// unresolved exact match. Dockerfile base images always get that
    /// fallback.
    pub fn from_searchers(
        images: Vec<Arc<dyn Searcher>>,
        templates: Vec<Arc<dyn Searcher>>,
        allow_missing_images: bool,
    ) -> Self {
        let missing: Arc<dyn Searcher> = Arc::new(MissingImageSearcher);
        let image_fallback = allow_missing_images.then(|| missing.clone());
        let has_images = !images.is_empty() || allow_missing_images;

        let mut all = images.clone();
        all.extend(templates.iter().cloned());

        Self {
            default: (has_images || !templates.is_empty()).then(|| {
                Arc::new(
                    UniqueExactOrInexactMatchResolver::new(all)
                        .with_fallback(image_fallback.clone()),
                ) as Arc<dyn Resolver>
            }),
            image_only: has_images.then(|| {
                Arc::new(
                    UniqueExactOrInexactMatchResolver::new(images.clone())
                        .with_fallback(image_fallback.clone()),
                ) as Arc<dyn Resolver>
            }),
            template_only: (!templates.is_empty()).then(|| {
                Arc::new(UniqueExactOrInexactMatchResolver::new(templates)) as Arc<dyn Resolver>
            }),
            source_language: (!images.is_empty()).then(|| {
                Arc::new(FirstMatchResolver::new(images.clone()).builders_only()) as Arc<dyn Resolver>
            }),
            dockerfile_base: Some(Arc::new(
                FirstMatchResolver::new(images)
                    .exact_only()
                    .with_fallback(Some(missing)),
            )),
        }
    }

    /// The resolver for `kind`. A forced docker strategy narrows the
    /// default resolver to images only.
    pub fn resolver_for(
        &self,
        kind: ResolverKind,
        strategy: Option<BuildStrategy>,
    ) -> Option<&Arc<dyn Resolver>> {
        let slot = match kind {
            ResolverKind::Default if strategy == Some(BuildStrategy::Docker) => &self.image_only,
            ResolverKind::Default => &self.default,
            ResolverKind::ImageOnly => &self.image_only,
            ResolverKind::TemplateOnly => &self.template_only,
            ResolverKind::SourceLanguage => &self.source_language,
            ResolverKind::DockerfileBase => &self.dockerfile_base,
        };
        slot.as_ref()
    }

    /// Resolve every unresolved component on a bounded set of threads, one
    /// result slot per component. The first error in request order is returned.
    #[instrument(skip_all, fields(components = components.len()))]
    pub fn resolve_all(
        &self,
        components: &mut [ComponentInput],
        strategy: Option<BuildStrategy>,
    ) -> NewAppResult<()> {
        let pending: Vec<usize> = components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.resolved.is_none())
            .map(|(i, _)| i)
            .collect();

        let results = {
            let inputs: Vec<&ComponentInput> = pending.iter().map(|&idx| &components[idx]).collect();
            fanout::map_bounded(
                &inputs,
                |input| self.resolve_one(input, strategy),
                |n| {
                    Err(NewAppError::Internal {
                        message: format!("resolver for component {} panicked", pending[n]),
                    })
                },
            )
        };

        for (idx, result) in pending.into_iter().zip(results) {
            let found = result?;
            debug!(value = %components[idx].value, name = %found.name, score = found.score, "Resolved component");
            components[idx].resolved = Some(found);
        }
        Ok(())
    }

    fn resolve_one(
        &self,
        input: &ComponentInput,
        strategy: Option<BuildStrategy>,
    ) -> NewAppResult<ComponentMatch> {
        let resolver = input.resolver.and_then(|kind| self.resolver_for(kind, strategy));
        match resolver {
            Some(r) => r.resolve(&input.value, &input.terms),
            // A docker build can proceed without knowing anything about
            // its base image.
            None if strategy == Some(BuildStrategy::Docker) && input.expect_to_build => {
                let reference = ImageReference::parse(&input.value)?;
                Ok(ComponentMatch::unresolved(&input.value, reference))
            }
            None => Err(ApplicationError::NoResolver {
                value: input.value.clone(),
            }
            .into()),
        }
    }
}

/// Apply what a resolved match implies about its component.
///
/// Builder images expect to build unless the strategy is forced to docker.
/// Templates cannot carry explicitly attached source.
pub fn apply_match_semantics(
    components: &mut [ComponentInput],
    strategy: Option<BuildStrategy>,
) -> NewAppResult<()> {
    for input in components.iter_mut() {
        let Some(found) = &input.resolved else { continue };
        if found.is_template() {
            if input.uses.is_some() {
                return Err(ApplicationError::TemplateWithSource {
                    value: input.value.clone(),
                }
                .into());
            }
            input.is_template = true;
            continue;
        }
        if found.is_builder() && strategy != Some(BuildStrategy::Docker) {
            input.expect_to_build = true;
        }
    }
    Ok(())
}
