//! Application layer errors.
//!
//! These errors represent failures while resolving and assembling a
//! request, not malformed values. Value errors are `DomainError` from
//! `crate::domain`.

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Tokens that were neither components, repositories nor env pairs.
    #[error("did not recognize the following arguments: {}", .0.join(", "))]
    UnknownArguments(Vec<String>),

    #[error("no match for \"{value}\"")]
    NoMatch { value: String },

    #[error("multiple matches for \"{value}\": {}", .candidates.join(", "))]
    Ambiguous { value: String, candidates: Vec<String> },

    #[error("no resolver defined for \"{value}\"")]
    NoResolver { value: String },

    /// Components and repositories cannot be paired without `image~repo`.
    #[error("{message}")]
    SourceAssociation { message: String },

    #[error("{0}")]
    StrategyConflict(String),

    #[error(
        "none of the images that match \"{value}\" can build source code - check whether this is the image you want to use, then use --strategy=source to build using source or --strategy=docker to treat this as a Docker base image and set up a layered Docker build"
    )]
    CannotBuildSource { value: String },

    #[error("no language was detected for repository \"{repository}\"")]
    NoLanguageDetected { repository: String },

    #[error(
        "the input and output image stream tags are identical (\"{reference}\"), please specify a different output reference with --to"
    )]
    CircularOutputReference { reference: String },

    #[error("failed to inspect repository \"{repository}\": {reason}")]
    Inspection { repository: String, reason: String },

    #[error("no components were provided or could be derived")]
    NoComponents,

    #[error("no component named \"{value}\" to group")]
    UnknownGroupMember { value: String },

    #[error("{reason}")]
    TemplateParameter { reason: String },

    #[error(
        "template with source code explicitly attached is not supported - you must either specify the template and source code separately or attach an image to the source code using the '[image]~[code]' form"
    )]
    TemplateWithSource { value: String },

    /// A searcher, detector or tree provider failed.
    #[error("{collaborator}: {reason}")]
    Collaborator { collaborator: String, reason: String },

    #[error("internal state lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownArguments(_) => vec![
                "Arguments may be images, templates, source locations or KEY=VALUE pairs".into(),
                "Use --image, --template or --code to say what an argument is".into(),
            ],
            Self::NoMatch { value } => vec![
                format!("Try: newapp search {value}"),
                "Use --allow-missing-images to use an image that cannot be found".into(),
            ],
            Self::Ambiguous { candidates, .. } => {
                let mut s = vec!["Pick one of the candidates explicitly:".to_string()];
                s.extend(candidates.iter().map(|c| format!("  {c}")));
                s
            }
            Self::NoResolver { .. } => vec![
                "Check the searchers configured in your catalog".into(),
            ],
            Self::SourceAssociation { .. } => vec![
                "Use '[image]~[repo]' to declare which code goes with which image".into(),
            ],
            Self::StrategyConflict(_) => vec!["Use --strategy=docker with --dockerfile".into()],
            Self::CannotBuildSource { .. } => vec![
                "Use --strategy=source or --strategy=docker".into(),
            ],
            Self::NoLanguageDetected { .. } => vec![
                "Name a builder image explicitly with '[image]~[repo]'".into(),
                "Or add a Dockerfile to the repository and use --strategy=docker".into(),
            ],
            Self::CircularOutputReference { .. } => vec![
                "Use --to to name a different output image".into(),
            ],
            Self::Inspection { repository, .. } => vec![
                format!("Check that {repository} exists and is readable"),
            ],
            Self::NoComponents => vec![
                "Pass an image, template or source repository".into(),
                "Example: newapp centos/ruby-22-centos7~https://github.com/openshift/ruby-hello-world.git".into(),
            ],
            Self::TemplateParameter { .. } => vec![
                "Run: newapp search --template NAME to see its parameters".into(),
            ],
            Self::UnknownGroupMember { .. } => vec![
                "Group members must be written exactly as the components were given".into(),
                "Example: newapp mysql php --group mysql+php".into(),
            ],
            Self::LockPoisoned => vec!["Try again in a moment".into()],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoMatch { .. } | Self::Inspection { .. } | Self::NoLanguageDetected { .. } => {
                ErrorCategory::NotFound
            }
            Self::StrategyConflict(_)
            | Self::CannotBuildSource { .. }
            | Self::CircularOutputReference { .. }
            | Self::TemplateWithSource { .. } => ErrorCategory::Compatibility,
            Self::NoResolver { .. } => ErrorCategory::Configuration,
            Self::Collaborator { .. } | Self::LockPoisoned => ErrorCategory::Internal,
            Self::UnknownArguments(_)
            | Self::Ambiguous { .. }
            | Self::SourceAssociation { .. }
            | Self::NoComponents
            | Self::UnknownGroupMember { .. }
            | Self::TemplateParameter { .. } => ErrorCategory::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_greppable() {
        let err = ApplicationError::UnknownArguments(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "did not recognize the following arguments: a, b");

        let err = ApplicationError::Ambiguous {
            value: "ruby".into(),
            candidates: vec!["ruby-20".into(), "ruby-22".into()],
        };
        assert_eq!(err.to_string(), "multiple matches for \"ruby\": ruby-20, ruby-22");

        let err = ApplicationError::NoResolver { value: "mysql".into() };
        assert_eq!(err.to_string(), "no resolver defined for \"mysql\"");
    }

    #[test]
    fn circular_reference_names_reference() {
        let err = ApplicationError::CircularOutputReference {
            reference: "docker.io/library/centos:latest".into(),
        };
        assert!(err.to_string().contains("(\"docker.io/library/centos:latest\")"));
        assert_eq!(err.category(), ErrorCategory::Compatibility);
    }

    #[test]
    fn ambiguity_suggestions_list_candidates() {
        let err = ApplicationError::Ambiguous {
            value: "x".into(),
            candidates: vec!["a".into()],
        };
        assert!(err.suggestions().iter().any(|s| s.contains('a')));
    }
}
