//! Repository Inspector.
//!
//! Runs an ordered list of detectors plus a Dockerfile tester over each
//! repository's tree. The first detector that matches supplies the terms;
//! the Dockerfile is attached whether or not a language was detected.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::application::ApplicationError;
use crate::application::services::fanout;
use crate::application::ports::{DockerfileTester, RepositoryDetector, RepositoryTree, TreeProvider};
use crate::domain::{Dockerfile, SourceRepository, SourceRepositoryInfo};
use crate::error::{NewAppError, NewAppResult};

pub struct RepositoryInspector {
    trees: Arc<dyn TreeProvider>,
    /// Priority order: the first match wins.
    detectors: Vec<Arc<dyn RepositoryDetector>>,
    dockerfile: Arc<dyn DockerfileTester>,
}

impl RepositoryInspector {
    pub fn new(
        trees: Arc<dyn TreeProvider>,
        detectors: Vec<Arc<dyn RepositoryDetector>>,
        dockerfile: Arc<dyn DockerfileTester>,
    ) -> Self {
        Self {
            trees,
            detectors,
            dockerfile,
        }
    }

    pub fn is_local_directory(&self, token: &str) -> bool {
        self.trees.is_local_directory(token)
    }

    /// Inspect one repository.
    #[instrument(skip_all, fields(repository = %repository))]
    pub fn inspect(&self, repository: &SourceRepository) -> NewAppResult<SourceRepositoryInfo> {
        let failed = |e: NewAppError| -> NewAppError {
            ApplicationError::Inspection {
                repository: repository.to_string(),
                reason: e.to_string(),
            }
            .into()
        };

        let tree = self.trees.open(repository).map_err(failed)?;
        let terms = self.detect(tree.as_ref());
        let dockerfile = self
            .dockerfile
            .test(tree.as_ref())
            .map_err(failed)?
            .map(Dockerfile::parse);

        debug!(
            terms = ?terms,
            dockerfile = dockerfile.is_some(),
            "Repository inspected"
        );
        Ok(SourceRepositoryInfo {
            terms: terms.unwrap_or_default(),
            dockerfile,
        })
    }

    fn detect(&self, tree: &dyn RepositoryTree) -> Option<Vec<String>> {
        self.detectors.iter().find_map(|d| {
            let terms = d.detect(tree)?;
            debug!(detector = d.name(), ?terms, "Detector matched");
            Some(terms)
        })
    }

    /// Inspect every repository that has not been inspected yet, on a
    /// bounded set of threads. Failures are returned per repository; the
    /// others are still inspected and updated in place.
    #[instrument(skip_all, fields(repositories = repositories.len()))]
    pub fn inspect_all(&self, repositories: &mut [SourceRepository]) -> Vec<NewAppError> {
        let pending: Vec<usize> = repositories
            .iter()
            .enumerate()
            .filter(|(_, r)| r.info.is_none() && !r.is_synthetic())
            .map(|(i, _)| i)
            .collect();

        let results = {
            let targets: Vec<&SourceRepository> = pending.iter().map(|&idx| &repositories[idx]).collect();
            fanout::map_bounded(
                &targets,
                |repo| self.inspect(repo),
                |n| {
                    Err(NewAppError::Internal {
                        message: format!("inspection of repository {} panicked", pending[n]),
                    })
                },
            )
        };

        let mut failures = Vec::new();
        for (&idx, result) in pending.iter().zip(results) {
            match result {
                Ok(found) => repositories[idx].info = Some(found),
                Err(e) => {
                    warn!(repository = %repositories[idx], error = %e, "Inspection failed");
                    failures.push(e);
                }
            }
        }
        info!(
            inspected = pending.len() - failures.len(),
            failed = failures.len(),
            "Repositories inspected"
        );
        failures
    }
}
