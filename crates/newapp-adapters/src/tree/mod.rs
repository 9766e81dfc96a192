//! Repository tree adapters.

mod dockerfile;
mod local;
mod memory;

pub use dockerfile::DockerfileFileTester;
pub use local::{LocalTree, LocalTreeProvider};
pub use memory::{MemoryTree, MemoryTreeProvider};

use newapp_core::application::ApplicationError;
use newapp_core::error::NewAppError;

fn tree_error(collaborator: &str, reason: impl Into<String>) -> NewAppError {
    ApplicationError::Collaborator {
        collaborator: collaborator.to_string(),
        reason: reason.into(),
    }
    .into()
}
