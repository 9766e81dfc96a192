//! Catalog-backed [`Searcher`](newapp_core::application::ports::Searcher)
//! implementations.
//!
//! Every searcher scores candidates the same way, lower is better:
//!
//! | score        | meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `0.0`        | the term names exactly this image, tag or template   |
//! | `0.25`       | same name, but the term leaves registry or tag open  |
//! | `0.5`        | the candidate declares it supports the term          |
//! | `0.6`..`0.7` | the name is close to the term (edit distance)        |
//!
//! Only candidates scoring under `1.0` are returned.

mod image;
mod image_stream;
mod template;

pub use image::{DaemonSearcher, RegistrySearcher};
pub use image_stream::ImageStreamSearcher;
pub use template::TemplateSearcher;

use newapp_core::domain::ImageReference;

pub const EXACT_SCORE: f32 = 0.0;
pub const NAME_SCORE: f32 = 0.25;
pub const SUPPORTS_SCORE: f32 = 0.5;

/// Minimum normalized similarity for a fuzzy name match.
const FUZZY_THRESHOLD: f64 = 0.75;
const FUZZY_BASE: f64 = 0.6;
const FUZZY_SPREAD: f64 = 0.4;

/// Best `(term, score)` over `terms`, ties keep the earlier term.
pub(crate) fn best_term<'a>(
    terms: &'a [String],
    score: impl Fn(&str) -> Option<f32>,
) -> Option<(&'a str, f32)> {
    terms
        .iter()
        .filter_map(|t| score(t).map(|s| (t.as_str(), s)))
        .fold(None, |best, (term, s)| match best {
            Some((_, b)) if b <= s => best,
            _ => Some((term, s)),
        })
}

/// `true` if `supports` lists `term`, or lists it with a version
/// (`ruby:2.2` supports `ruby`).
pub(crate) fn supports(supports: &[String], term: &str) -> bool {
    supports.iter().any(|s| {
        s.eq_ignore_ascii_case(term)
            || s.split_once(':')
                .is_some_and(|(base, _)| base.eq_ignore_ascii_case(term))
    })
}

/// Fuzzy score for two names, `None` below the similarity threshold.
pub(crate) fn fuzzy(term: &str, candidate: &str) -> Option<f32> {
    let sim = strsim::normalized_levenshtein(&term.to_ascii_lowercase(), &candidate.to_ascii_lowercase());
    (sim >= FUZZY_THRESHOLD).then(|| (FUZZY_BASE + (1.0 - sim) * FUZZY_SPREAD) as f32)
}

/// Score an image reference against one search term.
pub(crate) fn score_image(term: &str, candidate: &ImageReference, declared: &[String]) -> Option<f32> {
    let Ok(wanted) = ImageReference::parse(term) else {
        return supports(declared, term).then_some(SUPPORTS_SCORE);
    };
    if wanted.same_image(candidate) {
        return Some(EXACT_SCORE);
    }

    let tag_fits = wanted.tag.is_none() || wanted.tag_or_default() == candidate.tag_or_default();
    let namespace_fits = wanted.namespace.is_none() || wanted.namespace == candidate.namespace;
    if wanted.name == candidate.name && tag_fits && namespace_fits {
        return Some(NAME_SCORE);
    }
    if supports(declared, term) {
        return Some(SUPPORTS_SCORE);
    }
    if tag_fits && namespace_fits {
        return fuzzy(&wanted.name, &candidate.name);
    }
    None
}
