//! Local directory trees using `std::fs` and `walkdir`.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use newapp_core::application::ports::{RepositoryTree, TreeProvider};
use newapp_core::domain::SourceRepository;
use newapp_core::domain::source::SourceLocation;
use newapp_core::error::{NewAppError, NewAppResult};

use super::tree_error;

/// How deep [`LocalTree::files`] descends by default.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// A directory on disk, scoped to the repository's context dir.
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
    max_depth: usize,
}

impl LocalTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Hidden directories such as `.git` are never listed.
fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

impl RepositoryTree for LocalTree {
    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn contains(&self, relative: &str) -> bool {
        self.root.join(relative).is_file()
    }

    fn files(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(root = %self.root.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&self.root).ok()?;
                let parts: Vec<_> = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect();
                Some(parts.join("/"))
            })
            .collect()
    }

    fn read_to_string(&self, relative: &str) -> NewAppResult<String> {
        let path = self.root.join(relative);
        std::fs::read_to_string(&path).map_err(|e| map_io_error(&path, e, "read file"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> NewAppError {
    tree_error("local-tree", format!("failed to {operation} {}: {e}", path.display()))
}

/// Opens local directories and `file://` URLs.
///
/// Remote repositories are not cloned; inspecting one fails and the caller
/// reports it as a warning.
#[derive(Debug, Clone, Copy)]
pub struct LocalTreeProvider {
    max_depth: usize,
}

impl LocalTreeProvider {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn local_root(repository: &SourceRepository) -> NewAppResult<PathBuf> {
        match repository.location() {
            SourceLocation::Local(path) => Ok(path.clone()),
            SourceLocation::Remote(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| tree_error("local-tree", format!("{url} is not a usable file path"))),
            SourceLocation::Remote(url) => Err(tree_error(
                "local-tree",
                format!("{url} is remote; clone it and pass the local directory to inspect it"),
            )),
            SourceLocation::Synthetic => Err(tree_error(
                "local-tree",
                "a repository created for a literal Dockerfile has no tree",
            )),
        }
    }
}

impl Default for LocalTreeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeProvider for LocalTreeProvider {
    #[instrument(skip_all, fields(repository = %repository))]
    fn open(&self, repository: &SourceRepository) -> NewAppResult<Box<dyn RepositoryTree>> {
        let mut root = Self::local_root(repository)?;
        if let Some(dir) = repository.context_dir.as_deref() {
            root = root.join(dir);
        }
        if !root.is_dir() {
            return Err(tree_error(
                "local-tree",
                format!("{} is not a directory", root.display()),
            ));
        }
        debug!(root = %root.display(), "opened local tree");
        Ok(Box::new(LocalTree::new(root).with_max_depth(self.max_depth)))
    }

    fn is_local_directory(&self, token: &str) -> bool {
        Path::new(token).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Gemfile"), "source 'https://rubygems.org'").unwrap();
        fs::create_dir_all(dir.path().join("app/models")).unwrap();
        fs::write(dir.path().join("app/models/user.rb"), "class User; end").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        dir
    }

    fn repository(path: &Path) -> SourceRepository {
        SourceRepository::parse(&path.display().to_string()).unwrap()
    }

    #[test]
    fn lists_relative_files_without_hidden_dirs() {
        let dir = repo_dir();
        let tree = LocalTreeProvider::new().open(&repository(dir.path())).unwrap();
        let files = tree.files();
        assert!(files.contains(&"Gemfile".to_string()));
        assert!(files.contains(&"app/models/user.rb".to_string()));
        assert!(!files.iter().any(|f| f.starts_with(".git")));
        assert!(tree.contains("Gemfile"));
        assert!(!tree.contains("app"));
    }

    #[test]
    fn context_dir_scopes_the_tree() {
        let dir = repo_dir();
        let mut repo = repository(dir.path());
        repo.context_dir = Some("app".into());
        let tree = LocalTreeProvider::new().open(&repo).unwrap();
        assert_eq!(tree.files(), vec!["models/user.rb".to_string()]);
    }

    #[test]
    fn max_depth_limits_listing() {
        let dir = repo_dir();
        let tree = LocalTreeProvider::new()
            .with_max_depth(1)
            .open(&repository(dir.path()))
            .unwrap();
        assert_eq!(tree.files(), vec!["Gemfile".to_string()]);
    }

    #[test]
    fn remote_and_missing_repositories_fail() {
        let provider = LocalTreeProvider::new();
        let remote = SourceRepository::parse("https://github.com/openshift/ruby-hello-world.git").unwrap();
        assert!(provider.open(&remote).is_err());

        let missing = SourceRepository::parse("/no/such/dir").unwrap();
        let err = provider.open(&missing).err().unwrap();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn reads_file_contents() {
        let dir = repo_dir();
        let tree = LocalTree::new(dir.path());
        assert!(tree.read_to_string("Gemfile").unwrap().contains("rubygems"));
        assert!(tree.read_to_string("missing").is_err());
    }

    #[test]
    fn recognizes_local_directories() {
        let dir = repo_dir();
        let provider = LocalTreeProvider::new();
        assert!(provider.is_local_directory(&dir.path().display().to_string()));
        assert!(!provider.is_local_directory("mysql"));
    }
}
