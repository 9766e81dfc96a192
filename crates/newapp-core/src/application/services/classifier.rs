//! Reference Classifier.
//!
//! Splits raw argument tokens into environment pairs, repository locations,
//! component specifiers and unrecognized tokens, then builds typed
//! [`ComponentInput`]s and [`SourceRepository`]s from them.

use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::source::is_remote_location;
use crate::domain::{ComponentInput, ImageReference, ResolverKind, SourceRepository};
use crate::error::NewAppResult;

// ── classify ──────────────────────────────────────────────────────────────────

/// Tokens partitioned by kind. Input order is preserved within each set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub environment: Vec<String>,
    pub repositories: Vec<String>,
    pub components: Vec<String>,
    pub unknown: Vec<String>,
}

impl Classification {
    /// Fail if anything was left unrecognized.
    pub fn ensure_recognized(&self) -> NewAppResult<()> {
        if self.unknown.is_empty() {
            return Ok(());
        }
        Err(ApplicationError::UnknownArguments(self.unknown.clone()).into())
    }
}

/// Classify tokens using only their syntax.
pub fn classify<S: AsRef<str>>(tokens: &[S]) -> Classification {
    classify_with(tokens, |_| false)
}

/// Classify tokens, asking `is_local_dir` about tokens that are neither
/// obviously paths nor URLs (e.g. `myapp` when `./myapp` exists).
pub fn classify_with<S, F>(tokens: &[S], is_local_dir: F) -> Classification
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut out = Classification::default();
    for token in tokens {
        let token = token.as_ref();
        let set = if is_environment_pair(token) {
            &mut out.environment
        } else if token.contains('~') {
            &mut out.components
        } else if is_local_path(token) || is_remote_location(token) || is_local_dir(token) {
            &mut out.repositories
        } else if is_component_spec(token) {
            &mut out.components
        } else {
            &mut out.unknown
        };
        set.push(token.to_string());
    }
    debug!(
        environment = out.environment.len(),
        repositories = out.repositories.len(),
        components = out.components.len(),
        unknown = out.unknown.len(),
        "Classified arguments"
    );
    out
}

/// `KEY=VALUE` where the key is a plain word, so `=` inside a URL query or
/// after a `~`/`+` delimiter does not count.
fn is_environment_pair(token: &str) -> bool {
    token.split_once('=').is_some_and(|(key, _)| {
        !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    })
}

fn is_local_path(token: &str) -> bool {
    token.starts_with('/') || token.starts_with('.')
}

fn is_component_spec(token: &str) -> bool {
    !token.is_empty() && token.split('+').all(|part| ImageReference::parse(part).is_ok())
}

// ── ReferenceBuilder ──────────────────────────────────────────────────────────

/// Accumulates components and repositories from several argument lists.
///
/// `a+b` puts both components in one deployment group. `image~repo` binds
/// the repository to the component and marks it as expecting to build.
/// Repositories are de-duplicated by location.
#[derive(Debug, Default)]
pub struct ReferenceBuilder {
    components: Vec<ComponentInput>,
    repositories: Vec<SourceRepository>,
    next_group: usize,
}

impl ReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add component specifiers, each forming its own group unless joined
    /// with `+`. `configure` runs on every created input.
    pub fn add_components<S, F>(&mut self, values: &[S], configure: F) -> NewAppResult<Vec<usize>>
    where
        S: AsRef<str>,
        F: Fn(&mut ComponentInput),
    {
        let mut added = Vec::new();
        for value in values {
            let group = self.next_group;
            self.next_group += 1;
            let mut members = Vec::new();
            for part in value.as_ref().split('+') {
                let idx = self.add_component(part, group, &configure)?;
                members.push(idx);
            }
            added.extend(members);
        }
        Ok(added)
    }

    fn add_component<F>(&mut self, spec: &str, group: usize, configure: &F) -> NewAppResult<usize>
    where
        F: Fn(&mut ComponentInput),
    {
        let (image, repo) = match spec.split_once('~') {
            Some((image, repo)) => (image, Some(repo)),
            None => (spec, None),
        };
        if image.is_empty() {
            return Err(crate::domain::DomainError::InvalidComponent {
                value: spec.to_string(),
                reason: "expected [image]~[repository]".into(),
            }
            .into());
        }

        let mut input = ComponentInput::new(image);
        input.group = group;
        configure(&mut input);
        if let Some(repo) = repo {
            if repo.is_empty() {
                return Err(crate::domain::DomainError::InvalidComponent {
                    value: spec.to_string(),
                    reason: "repository after '~' is empty".into(),
                }
                .into());
            }
            input.uses = Some(self.add_source_repository(repo)?);
            input.expect_to_build = true;
        }
        self.components.push(input);
        Ok(self.components.len() - 1)
    }

    /// Add a repository location, returning the index of the (possibly
    /// already known) repository.
    pub fn add_source_repository(&mut self, location: &str) -> NewAppResult<usize> {
        let repo = SourceRepository::parse(location)?;
        if let Some(idx) = self.repositories.iter().position(|r| r.key() == repo.key()) {
            return Ok(idx);
        }
        self.repositories.push(repo);
        Ok(self.repositories.len() - 1)
    }

    /// Put the given components in one deployment group, the group of the
    /// first of them.
    pub fn add_group(&mut self, members: &[usize]) {
        let Some(group) = members.first().and_then(|i| self.components.get(*i)).map(|c| c.group) else {
            return;
        };
        for idx in members {
            if let Some(c) = self.components.get_mut(*idx) {
                c.group = group;
            }
        }
    }

    /// Index of the first component given as `value`.
    pub fn find_component(&self, value: &str) -> Option<usize> {
        self.components.iter().position(|c| c.value == value)
    }

    pub fn result(self) -> (Vec<ComponentInput>, Vec<SourceRepository>) {
        (self.components, self.repositories)
    }
}

/// Configure an input for `--image` / `--docker-image`.
pub fn as_image(input: &mut ComponentInput) {
    input.is_image = true;
    input.resolver = Some(ResolverKind::ImageOnly);
}

/// Configure an input for `--template`.
pub fn as_template(input: &mut ComponentInput) {
    input.is_template = true;
    input.resolver = Some(ResolverKind::TemplateOnly);
}
