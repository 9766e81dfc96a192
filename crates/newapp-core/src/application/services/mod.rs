//! Application services - the engine stages and their orchestration.
//!
//! Each stage is usable on its own; [`GenerateService`] runs them in order
//! for one request.

pub mod assembler;
pub mod classifier;
mod fanout;
pub mod generate_service;
pub mod inspector;
pub mod resolver;
pub mod synthesizer;

pub use assembler::{Assembly, AssemblyOptions, PipelineAssembler};
pub use classifier::{Classification, ReferenceBuilder, classify, classify_with};
pub use generate_service::{GenerateService, GenerationRequest, GenerationResult};
pub use inspector::RepositoryInspector;
pub use resolver::{
    FirstMatchResolver, MissingImageSearcher, Resolver, ResolverSet, UniqueExactOrInexactMatchResolver,
    apply_match_semantics,
};
pub use synthesizer::ObjectSynthesizer;
