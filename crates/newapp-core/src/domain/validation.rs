use crate::domain::error::DomainError;

/// Maximum length of a generated application name. Leaves room for
/// suffixes such as `-1` on names that become DNS labels.
pub const MAX_NAME_LENGTH: usize = 58;

/// Centralized domain validation.
///
/// Name rules live here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    /// Validate a user-supplied application name.
    pub fn validate_name(name: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(invalid("name may be at most 58 characters"));
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(invalid("name must start with a lowercase letter"));
        }
        if name.ends_with('-') {
            return Err(invalid("name must not end with '-'"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("name may contain only a-z, 0-9 and '-'"));
        }
        Ok(())
    }

    /// Turn an arbitrary string (repository name, image name) into a
    /// valid name, or `None` if nothing usable remains.
    pub fn sanitize_name(raw: &str) -> Option<String> {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                out.push(c);
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }

        let start = out.find(|c: char| c.is_ascii_lowercase())?;
        let mut name: String = out[start..].chars().take(MAX_NAME_LENGTH).collect();
        while name.ends_with('-') {
            name.pop();
        }
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dns_label_names() {
        assert!(DomainValidator::validate_name("ruby-hello-world").is_ok());
        assert!(DomainValidator::validate_name("a1").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(DomainValidator::validate_name("").is_err());
        assert!(DomainValidator::validate_name("1abc").is_err());
        assert!(DomainValidator::validate_name("Abc").is_err());
        assert!(DomainValidator::validate_name("abc-").is_err());
        assert!(DomainValidator::validate_name(&"a".repeat(59)).is_err());
    }

    #[test]
    fn sanitizes_derived_names() {
        assert_eq!(
            DomainValidator::sanitize_name("Ruby_Hello.World").as_deref(),
            Some("ruby-hello-world")
        );
        assert_eq!(DomainValidator::sanitize_name("2048-game").as_deref(), Some("game"));
        assert_eq!(DomainValidator::sanitize_name("___"), None);
    }
}
