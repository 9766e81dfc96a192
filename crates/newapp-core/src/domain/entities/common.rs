use super::super::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered `KEY=VALUE` environment.
///
/// Invariant: every key is a valid environment variable name. Iteration is
/// sorted by key so emitted artifacts are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `KEY=VALUE` pairs. Later duplicates override earlier
    /// ones.
    pub fn parse<S: AsRef<str>>(pairs: &[S]) -> Result<Self, DomainError> {
        let mut env = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = split_pair(pair).ok_or_else(|| DomainError::InvalidEnvironment {
                pair: pair.to_string(),
                reason: "expected KEY=VALUE".into(),
            })?;
            if !is_env_name(key) {
                return Err(DomainError::InvalidEnvironment {
                    pair: pair.to_string(),
                    reason: "key must match [A-Za-z_][A-Za-z0-9_]*".into(),
                });
            }
            env.0.insert(key.to_string(), value.to_string());
        }
        Ok(env)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Add every pair from `other`, keeping existing keys.
    pub fn add_missing(&mut self, other: &Environment) {
        for (k, v) in &other.0 {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered `key=value` labels applied to artifact metadata and selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<S: AsRef<str>>(pairs: &[S]) -> Result<Self, DomainError> {
        let mut labels = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = split_pair(pair).ok_or_else(|| DomainError::InvalidLabel {
                pair: pair.to_string(),
                reason: "expected key=value".into(),
            })?;
            if !is_label_key(key) {
                return Err(DomainError::InvalidLabel {
                    pair: pair.to_string(),
                    reason: "key must be a qualified name such as app or example.com/tier".into(),
                });
            }
            labels.0.insert(key.to_string(), value.to_string());
        }
        Ok(labels)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// `true` if every pair in `self` is present in `other`.
    pub fn is_subset_of(&self, other: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| other.get(k) == Some(v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&joined.join(","))
    }
}

/// Split `KEY=VALUE` at the first `=`. The key must be non-empty.
pub(crate) fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (key, value) = pair.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_label_key(key: &str) -> bool {
    let name = match key.rsplit_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() || !prefix.split('.').all(is_dns_label) {
                return false;
            }
            name
        }
        None => key,
    };
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric())
}

/// RFC 1123 label: lowercase alphanumerics and '-', alphanumeric at both ends.
pub(crate) fn is_dns_label(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// RFC 1123 subdomain: dot-separated labels, at most 253 characters.
pub(crate) fn is_dns_subdomain(s: &str) -> bool {
    s.len() <= 253 && s.split('.').all(is_dns_label)
}
