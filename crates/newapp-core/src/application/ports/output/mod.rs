//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the engine needs from external systems.
//! The `newapp-adapters` crate provides implementations.

use std::path::Path;

use crate::domain::{ComponentMatch, SourceRepository};
use crate::error::NewAppResult;

/// Port for scored lookup of component values.
///
/// Implemented by:
/// - `newapp_adapters::searcher::RegistrySearcher` (catalogued registry images)
/// - `newapp_adapters::searcher::DaemonSearcher` (images in the local daemon)
/// - `newapp_adapters::searcher::ImageStreamSearcher` (existing trackers)
/// - `newapp_adapters::searcher::TemplateSearcher` (template catalog)
///
/// ## Contract
///
/// - "No match" is `Ok(vec![])`, never an error
/// - Errors mean the backing source is unreachable or malformed
/// - Must not mutate shared state
pub trait Searcher: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str {
        "searcher"
    }

    /// Search for all of `terms`, returning every candidate with its score.
    fn search(&self, terms: &[String]) -> NewAppResult<Vec<ComponentMatch>>;
}

/// Read-only view of a repository's (context-dir scoped) file tree.
pub trait RepositoryTree: Send + Sync {
    /// Root on disk, if the tree is backed by one.
    fn root(&self) -> Option<&Path>;

    /// `true` if the relative path exists as a file.
    fn contains(&self, relative: &str) -> bool;

    /// Relative, `/`-separated paths of every file in the tree.
    fn files(&self) -> Vec<String>;

    fn read_to_string(&self, relative: &str) -> NewAppResult<String>;
}

/// Port for opening a repository's tree.
///
/// Implemented by:
/// - `newapp_adapters::tree::LocalTreeProvider` (directories on disk)
/// - `newapp_adapters::tree::MemoryTreeProvider` (testing)
pub trait TreeProvider: Send + Sync {
    /// Open the tree, scoped to the repository's context dir when set.
    fn open(&self, repository: &SourceRepository) -> NewAppResult<Box<dyn RepositoryTree>>;

    /// Whether a bare argument such as `myapp` names a local directory.
    fn is_local_directory(&self, _token: &str) -> bool {
        false
    }
}

/// Port for language and platform classification.
///
/// Pure: looks at the tree and answers, never writes.
pub trait RepositoryDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Terms describing the tree, or `None` if this detector does not match.
    fn detect(&self, tree: &dyn RepositoryTree) -> Option<Vec<String>>;
}

/// Port for finding a Dockerfile in a tree.
pub trait DockerfileTester: Send + Sync {
    /// The Dockerfile content, `Ok(None)` if there is none.
    fn test(&self, tree: &dyn RepositoryTree) -> NewAppResult<Option<String>>;
}
