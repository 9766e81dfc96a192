// ============================================================================
// domain/error.rs - VALUE-LEVEL ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised while turning user-supplied strings into domain values. All errors
/// are cloneable, categorised, and carry suggestions for the CLI.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("invalid image reference \"{reference}\": {reason}")]
    InvalidImageReference { reference: String, reason: String },

    #[error("invalid source repository \"{location}\": {reason}")]
    InvalidSourceRepository { location: String, reason: String },

    #[error("invalid environment variable \"{pair}\": {reason}")]
    InvalidEnvironment { pair: String, reason: String },

    #[error("invalid label \"{pair}\": {reason}")]
    InvalidLabel { pair: String, reason: String },

    #[error("invalid template parameter \"{pair}\": {reason}")]
    InvalidParameter { pair: String, reason: String },

    #[error("invalid build secret \"{secret}\": {reason}")]
    InvalidSecret { secret: String, reason: String },

    #[error("invalid source image path \"{path}\": {reason}")]
    InvalidSourceImagePath { path: String, reason: String },

    #[error("invalid name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid build strategy \"{0}\": must be 'source' or 'docker'")]
    InvalidStrategy(String),

    #[error("invalid component \"{value}\": {reason}")]
    InvalidComponent { value: String, reason: String },

    // ========================================================================
    // Dockerfile Errors
    // ========================================================================
    #[error("the Dockerfile in the repository \"{repository}\" has no FROM instruction")]
    MissingFrom { repository: String },

    #[error("invalid Dockerfile: {0}")]
    InvalidDockerfile(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidImageReference { .. } => vec![
                "Image references look like [registry/][namespace/]name[:tag][@digest]".into(),
                "Example: centos/ruby-22-centos7:latest".into(),
            ],
            Self::InvalidEnvironment { .. } => vec![
                "Environment variables must be given as KEY=VALUE".into(),
                "Keys may contain letters, digits and underscores".into(),
            ],
            Self::InvalidLabel { .. } => vec!["Labels must be given as key=value".into()],
            Self::InvalidParameter { .. } => {
                vec!["Template parameters must be given as NAME=VALUE".into()]
            }
            Self::InvalidSecret { .. } => vec![
                "Build secrets are given as name[:destination]".into(),
                "Example: --build-secret npmrc:.npm".into(),
            ],
            Self::InvalidSourceImagePath { .. } => vec![
                "Source image paths are given as /absolute/source:relative/destination".into(),
            ],
            Self::InvalidName { .. } => vec![
                "Names must be lowercase alphanumeric characters or '-'".into(),
                "Names must start with a letter and end with a letter or digit".into(),
            ],
            Self::InvalidStrategy(_) => vec!["Use --strategy=source or --strategy=docker".into()],
            Self::MissingFrom { .. } => vec![
                "Add a FROM instruction naming the base image".into(),
                "Example: FROM centos:7".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingFrom { .. } | Self::InvalidDockerfile(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_from_message_names_repository() {
        let err = DomainError::MissingFrom {
            repository: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "the Dockerfile in the repository \"\" has no FROM instruction"
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn validation_errors_have_suggestions() {
        let err = DomainError::InvalidSecret {
            secret: ":x".into(),
            reason: "empty name".into(),
        };
        assert!(!err.suggestions().is_empty());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}
