//! In-memory trees for testing and for callers that already hold the files.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use newapp_core::application::ApplicationError;
use newapp_core::application::ports::{RepositoryTree, TreeProvider};
use newapp_core::domain::SourceRepository;
use newapp_core::error::NewAppResult;

use super::tree_error;

/// A tree held entirely in memory, keyed by `/`-separated relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeMap<String, String>,
}

impl MemoryTree {
    pub fn new(files: BTreeMap<String, String>) -> Self {
        Self { files }
    }

    /// The subtree under `dir`, with paths made relative to it.
    pub fn scoped(&self, dir: &str) -> Self {
        let prefix = format!("{}/", dir.trim_matches('/'));
        Self {
            files: self
                .files
                .iter()
                .filter_map(|(path, content)| {
                    path.strip_prefix(&prefix)
                        .map(|rest| (rest.to_string(), content.clone()))
                })
                .collect(),
        }
    }
}

impl RepositoryTree for MemoryTree {
    fn root(&self) -> Option<&Path> {
        None
    }

    fn contains(&self, relative: &str) -> bool {
        self.files.contains_key(relative)
    }

    fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn read_to_string(&self, relative: &str) -> NewAppResult<String> {
        self.files
            .get(relative)
            .cloned()
            .ok_or_else(|| tree_error("memory-tree", format!("no such file: {relative}")))
    }
}

/// Serves [`MemoryTree`]s registered by repository key (`location#ref`).
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeProvider {
    inner: Arc<RwLock<HashMap<String, MemoryTree>>>,
}

impl MemoryTreeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository<K, P, C>(self, key: K, files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        K: Into<String>,
        P: Into<String>,
        C: Into<String>,
    {
        if let Ok(mut inner) = self.inner.write() {
            inner.insert(key.into(), collect(files));
        }
        self
    }

    pub fn insert<P: Into<String>, C: Into<String>>(
        &self,
        key: impl Into<String>,
        files: impl IntoIterator<Item = (P, C)>,
    ) -> NewAppResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        inner.insert(key.into(), collect(files));
        Ok(())
    }
}

fn collect<P: Into<String>, C: Into<String>>(files: impl IntoIterator<Item = (P, C)>) -> MemoryTree {
    MemoryTree::new(files.into_iter().map(|(p, c)| (p.into(), c.into())).collect())
}

impl TreeProvider for MemoryTreeProvider {
    fn open(&self, repository: &SourceRepository) -> NewAppResult<Box<dyn RepositoryTree>> {
        let inner = self.inner.read().map_err(|_| ApplicationError::LockPoisoned)?;
        let tree = inner
            .get(&repository.key())
            .ok_or_else(|| tree_error("memory-tree", format!("no repository registered as {repository}")))?;
        let tree = match repository.context_dir.as_deref() {
            Some(dir) => tree.scoped(dir),
            None => tree.clone(),
        };
        Ok(Box::new(tree))
    }

    fn is_local_directory(&self, token: &str) -> bool {
        !token.contains("://")
            && self
                .inner
                .read()
                .map(|inner| inner.contains_key(token))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryTreeProvider {
        MemoryTreeProvider::new().with_repository(
            "myapp",
            [("Gemfile", ""), ("web/index.php", "<?php"), ("web/composer.json", "{}")],
        )
    }

    #[test]
    fn opens_registered_repository() {
        let repo = SourceRepository::parse("myapp").unwrap();
        let tree = provider().open(&repo).unwrap();
        assert_eq!(tree.files().len(), 3);
        assert!(tree.root().is_none());
    }

    #[test]
    fn context_dir_is_applied() {
        let mut repo = SourceRepository::parse("myapp").unwrap();
        repo.context_dir = Some("web".into());
        let tree = provider().open(&repo).unwrap();
        assert_eq!(tree.files(), vec!["composer.json".to_string(), "index.php".to_string()]);
        assert_eq!(tree.read_to_string("index.php").unwrap(), "<?php");
    }

    #[test]
    fn unknown_repository_is_an_error() {
        let repo = SourceRepository::parse("/elsewhere").unwrap();
        assert!(provider().open(&repo).is_err());
    }

    #[test]
    fn registered_keys_count_as_local_directories() {
        let p = provider();
        assert!(p.is_local_directory("myapp"));
        assert!(!p.is_local_directory("mysql"));
        p.insert("mysql", [("Dockerfile", "FROM centos")]).unwrap();
        assert!(p.is_local_directory("mysql"));
    }
}
