//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `newapp-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by the engine, implemented by infrastructure
//!   - `Searcher`: Scored lookup of images and templates
//!   - `RepositoryDetector`: Language classification of a tree
//!   - `DockerfileTester`: Dockerfile discovery
//!   - `TreeProvider` / `RepositoryTree`: Access to repository contents
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (`GenerateService`, used by the CLI layer)

pub mod output;

pub use output::{DockerfileTester, RepositoryDetector, RepositoryTree, Searcher, TreeProvider};
