//! Application layer for newapp.
//!
//! This layer contains:
//! - **Services**: The engine stages (classify, resolve, inspect, assemble,
//!   synthesize) and the `GenerateService` that runs them
//! - **Ports**: Interface definitions (traits) for external collaborators
//! - **Errors**: Application-specific error types
//!
//! Value rules live in `crate::domain`; this layer decides how values
//! combine into pipelines.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    GenerateService, GenerationRequest, GenerationResult, ObjectSynthesizer, PipelineAssembler,
    RepositoryInspector, ResolverSet,
};

pub use ports::{DockerfileTester, RepositoryDetector, RepositoryTree, Searcher, TreeProvider};

pub use error::ApplicationError;
