//! Infrastructure adapters for newapp.
//!
//! This crate implements the ports defined in `newapp_core::application::ports`.
//! It contains all external dependencies and I/O operations: catalog files,
//! marker-file detection and access to repository trees.

pub mod catalog;
pub mod detector;
pub mod searcher;
pub mod tree;

// Re-export commonly used adapters
pub use catalog::{Catalog, CatalogLoader, resolve_catalog};
pub use detector::{MarkerFileDetector, default_detectors, detectors_by_name};
pub use searcher::{DaemonSearcher, ImageStreamSearcher, RegistrySearcher, TemplateSearcher};
pub use tree::{DockerfileFileTester, LocalTreeProvider, MemoryTreeProvider};
