//! newapp core - hexagonal architecture implementation
//!
//! This crate provides the domain and application layers of the newapp
//! generator: it turns a handful of loosely typed arguments (images,
//! templates, source repositories, environment pairs) into a wired set of
//! build and deploy artifacts.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            newapp-cli (CLI)             │
//! │      (drives the GenerateService)       │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │  classify → resolve → inspect →         │
//! │  assemble → synthesize                  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │  Searcher, RepositoryDetector,          │
//! │  DockerfileTester, TreeProvider         │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     newapp-adapters (Infrastructure)    │
//! │  catalog searchers, marker detectors,   │
//! │  local and in-memory trees              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use newapp_core::prelude::*;
//!
//! let service = GenerateService::new(image_searchers, template_searchers, inspector);
//! let result = service.generate(GenerationRequest {
//!     arguments: vec!["ruby~https://github.com/openshift/ruby-hello-world.git".into()],
//!     ..Default::default()
//! })?;
//! for d in &result.diagnostics {
//!     eprintln!("{d}");
//! }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        GenerateService, GenerationRequest, GenerationResult, RepositoryInspector,
        ports::{DockerfileTester, RepositoryDetector, RepositoryTree, Searcher, TreeProvider},
    };
    pub use crate::domain::{
        BuildStrategy, ComponentMatch, Diagnostic, DiagnosticLevel, Dockerfile, ImageMetadata,
        ImageReference, MatchKind, MatchPayload, ObjectGraph, SourceRepository, TemplateRecord,
    };
    pub use crate::error::{NewAppError, NewAppResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
