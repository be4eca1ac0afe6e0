//! Immutable value objects shared by every entity family.

use crate::core::{CoachError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use url::Url;

lazy_static! {
    static ref EMAIL_GRAMMAR: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .expect("email grammar is a valid regex");
    static ref RELATIVE_BASE: Url =
        Url::parse("https://relative.invalid/").expect("relative base is a valid url");
}

/// Display name of a persona. Never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoachError::invariant("name must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thumbnail reference: an absolute URL or a relative reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(CoachError::invariant("thumbnail url must not be empty"));
        }

        match Url::parse(raw) {
            Ok(_) => Ok(Self(raw.to_string())),
            Err(url::ParseError::RelativeUrlWithoutBase) => RELATIVE_BASE
                .join(raw)
                .map(|_| Self(raw.to_string()))
                .map_err(|err| {
                    CoachError::invariant(format!("thumbnail url '{raw}' is not valid: {err}"))
                }),
            Err(err) => Err(CoachError::invariant(format!(
                "thumbnail url '{raw}' is not valid: {err}"
            ))),
        }
    }

    pub fn is_absolute(&self) -> bool {
        Url::parse(&self.0).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized (lower-cased) e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        if raw.len() > 254 || !EMAIL_GRAMMAR.is_match(raw) {
            return Err(CoachError::invariant(format!(
                "'{raw}' is not a valid email address"
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the OAuth login that created a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginContext {
    provider: String,
    subject: String,
}

impl LoginContext {
    pub fn new(provider: impl Into<String>, subject: impl Into<String>) -> Result<Self> {
        let provider = provider.into();
        let subject = subject.into();
        if provider.trim().is_empty() {
            return Err(CoachError::invariant("login provider must not be empty"));
        }
        if subject.trim().is_empty() {
            return Err(CoachError::invariant("login subject must not be empty"));
        }
        Ok(Self { provider, subject })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_non_empty() {
        assert_eq!(Name::new("  Iron Temple ").unwrap().as_str(), "Iron Temple");
        assert!(matches!(Name::new("   "), Err(CoachError::DomainInvariant(_))));
    }

    #[test]
    fn image_url_accepts_absolute_and_relative() {
        assert!(ImageUrl::new("https://cdn.example.com/a.png").unwrap().is_absolute());
        let relative = ImageUrl::new("/images/avatar.png").unwrap();
        assert!(!relative.is_absolute());
        assert_eq!(relative.as_str(), "/images/avatar.png");
        assert!(ImageUrl::new("").is_err());
        assert!(ImageUrl::new("http://[::1").is_err());
    }

    #[test]
    fn email_grammar() {
        assert_eq!(
            EmailAddress::new("Coach.Kim@Example.COM").unwrap().as_str(),
            "coach.kim@example.com"
        );
        for bad in ["", "no-at-sign", "a@b", "two@@example.com", "space in@example.com"] {
            assert!(EmailAddress::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn login_context_requires_both_parts() {
        assert!(LoginContext::new("google", "1234").is_ok());
        assert!(LoginContext::new("", "1234").is_err());
        assert!(LoginContext::new("google", " ").is_err());
    }
}
