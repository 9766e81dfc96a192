//! Marker-file language detection.
//!
//! Each [`MarkerFileDetector`] looks at the files at the root of a tree and
//! matches when any of them matches one of its patterns. The built-in set
//! is returned by [`default_detectors`] in priority order.

use std::sync::Arc;

use regex::Regex;
use tracing::trace;

use newapp_core::application::ports::{RepositoryDetector, RepositoryTree};
use newapp_core::error::{NewAppError, NewAppResult};

/// Built-in detectors: name and root-level file patterns, in priority order.
const BUILTIN: &[(&str, &[&str])] = &[
    ("ruby", &[r"^Gemfile$", r"^Rakefile$", r"^config\.ru$"]),
    ("jee", &[r"^pom\.xml$"]),
    ("nodejs", &[r"^app\.json$", r"^package\.json$"]),
    ("php", &[r"^index\.php$", r"^composer\.json$"]),
    ("python", &[r"^requirements\.txt$", r"^setup\.py$"]),
    ("perl", &[r"^index\.pl$", r"^cpanfile$"]),
    ("scala", &[r"^build\.sbt$"]),
    ("dotnet", &[r"^project\.json$", r"^.+\.csproj$"]),
    ("golang", &[r"^main\.go$", r"^Godeps$"]),
];

pub struct MarkerFileDetector {
    name: String,
    terms: Vec<String>,
    markers: Vec<Regex>,
}

impl MarkerFileDetector {
    /// A detector reporting `[name]` when a root file matches any pattern.
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Result<Self, regex::Error> {
        let name = name.into();
        Ok(Self {
            terms: vec![name.clone()],
            name,
            markers: patterns.iter().map(|p| Regex::new(p)).collect::<Result<_, _>>()?,
        })
    }

    /// Report these terms instead of the detector name.
    pub fn with_terms(mut self, terms: Vec<String>) -> Self {
        self.terms = terms;
        self
    }
}

impl RepositoryDetector for MarkerFileDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, tree: &dyn RepositoryTree) -> Option<Vec<String>> {
        let files = tree.files();
        let marker = files
            .iter()
            .filter(|f| !f.contains('/'))
            .find(|f| self.markers.iter().any(|m| m.is_match(f.as_str())))?;
        trace!(detector = %self.name, %marker, "marker file found");
        Some(self.terms.clone())
    }
}

fn builtin(name: &str, patterns: &[&str]) -> Arc<dyn RepositoryDetector> {
    Arc::new(MarkerFileDetector::new(name, patterns).expect("built-in marker pattern is valid"))
}

/// Every built-in detector, in priority order.
pub fn default_detectors() -> Vec<Arc<dyn RepositoryDetector>> {
    BUILTIN.iter().map(|(name, patterns)| builtin(name, patterns)).collect()
}

/// Built-in detectors named in `names`, in the order given.
pub fn detectors_by_name<S: AsRef<str>>(names: &[S]) -> NewAppResult<Vec<Arc<dyn RepositoryDetector>>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            BUILTIN
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(n, patterns)| builtin(n, patterns))
                .ok_or_else(|| NewAppError::Configuration {
                    message: format!(
                        "unknown detector \"{name}\"; expected one of: {}",
                        BUILTIN.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
                    ),
                })
        })
        .collect()
}
