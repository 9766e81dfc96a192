use newapp_core::application::ports::{DockerfileTester, RepositoryTree};
use newapp_core::error::NewAppResult;

/// Finds a Dockerfile at a fixed path in the tree, `Dockerfile` by default.
#[derive(Debug, Clone)]
pub struct DockerfileFileTester {
    path: String,
}

impl DockerfileFileTester {
    pub fn new() -> Self {
        Self {
            path: "Dockerfile".to_string(),
        }
    }

    pub fn at(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DockerfileFileTester {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerfileTester for DockerfileFileTester {
    fn test(&self, tree: &dyn RepositoryTree) -> NewAppResult<Option<String>> {
        if !tree.contains(&self.path) {
            return Ok(None);
        }
        tree.read_to_string(&self.path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;

    #[test]
    fn reads_dockerfile_when_present() {
        let tree = MemoryTree::new([("Dockerfile".to_string(), "FROM centos".to_string())].into());
        assert_eq!(
            DockerfileFileTester::new().test(&tree).unwrap().as_deref(),
            Some("FROM centos")
        );
        assert_eq!(DockerfileFileTester::at("build/Dockerfile").test(&tree).unwrap(), None);
    }
}
