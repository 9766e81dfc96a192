//! Searcher over the template catalog.

use std::sync::Arc;

use tracing::{debug, instrument};

use newapp_core::application::ports::Searcher;
use newapp_core::domain::{ComponentMatch, MatchPayload, TemplateRecord};
use newapp_core::error::NewAppResult;

use super::{EXACT_SCORE, best_term, fuzzy};
use crate::catalog::Catalog;

pub struct TemplateSearcher {
    catalog: Arc<Catalog>,
}

impl TemplateSearcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

fn score_template(term: &str, template: &TemplateRecord) -> Option<f32> {
    if term == template.name {
        return Some(EXACT_SCORE);
    }
    fuzzy(term, &template.name)
}

impl Searcher for TemplateSearcher {
    fn name(&self) -> &'static str {
        "template"
    }

    #[instrument(skip_all, fields(searcher = "template", terms = ?terms))]
    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>> {
        let matches: Vec<ComponentMatch> = self
            .catalog
            .templates
            .iter()
            .filter_map(|template| {
                let (term, score) = best_term(terms, |t| score_template(t, template))?;
                Some(ComponentMatch {
                    value: term.to_string(),
                    name: template.name.clone(),
                    argument: format!("--template={}", template.name),
                    description: template.description.clone(),
                    score,
                    insecure: false,
                    local_only: false,
                    payload: MatchPayload::Template(template.clone()),
                })
            })
            .collect();
        debug!(matches = matches.len(), "template search complete");
        Ok(matches)
    }
}
