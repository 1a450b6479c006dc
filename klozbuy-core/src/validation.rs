//! Field checks shared by the services. Every check records an [`Issue`]
//! instead of failing fast so a client gets all problems in one response.

use crate::common::error::{Issue, KlozbuyError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid clock regex"));
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.issues.push(Issue::new(field, message));
        }
        self
    }

    /// Length in characters after trimming.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            if min == 1 {
                self.issues.push(Issue::new(field, "must not be empty"));
            } else {
                self.issues
                    .push(Issue::new(field, format!("must be at least {min} characters")));
            }
        } else if len > max {
            self.issues
                .push(Issue::new(field, format!("must be at most {max} characters")));
        }
        self
    }

    pub fn optional_length(
        &mut self,
        field: &str,
        value: Option<&str>,
        max: usize,
    ) -> &mut Self {
        if let Some(value) = value {
            self.length(field, value, 0, max);
        }
        self
    }

    pub fn username(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            USERNAME_RE.is_match(value),
            field,
            "must be 3-30 letters, digits or underscores",
        )
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(EMAIL_RE.is_match(value.trim()), field, "must be a valid email address")
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.email(field, value);
        }
        self
    }

    pub fn http_url(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_http_url(value), field, "must be an http or https URL")
    }

    pub fn optional_http_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.http_url(field, value);
        }
        self
    }

    pub fn latitude(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && (-90.0..=90.0).contains(&value),
            field,
            "must be between -90 and 90",
        )
    }

    pub fn longitude(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(
            value.is_finite() && (-180.0..=180.0).contains(&value),
            field,
            "must be between -180 and 180",
        )
    }

    pub fn currency(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            CURRENCY_RE.is_match(value),
            field,
            "must be a three-letter uppercase currency code",
        )
    }

    pub fn clock_time(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_clock_time(value), field, "must be a time formatted HH:MM")
    }

    pub fn push(&mut self, issue: Issue) -> &mut Self {
        self.issues.push(issue);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(KlozbuyError::Validation(std::mem::take(&mut self.issues)))
        }
    }
}

pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/') && !host.contains(char::is_whitespace))
}

/// A zero-padded 24-hour `HH:MM` time.
pub fn is_clock_time(value: &str) -> bool {
    CLOCK_RE.is_match(value)
}

/// Trim a user-supplied optional string, treating blank as absent.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(result: Result<()>) -> Vec<Issue> {
        match result {
            Err(KlozbuyError::Validation(issues)) => issues,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn collects_every_failed_field() {
        let mut v = Validator::new();
        v.username("username", "a!")
            .email("email", "no-at-sign")
            .latitude("latitude", 91.0);
        let found = issues(v.finish());
        let fields: Vec<_> = found.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email", "latitude"]);
    }

    #[test]
    fn accepts_well_formed_values() {
        let mut v = Validator::new();
        v.username("username", "mama_put_01")
            .email("email", "ada@example.ng")
            .http_url("website", "https://klozbuy.ng/shop")
            .clock_time("opens", "08:30")
            .currency("currency", "NGN")
            .length("displayName", "Ada", 1, 80);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("http:///path"));
        assert!(is_http_url("http://localhost:3000/a.png"));
    }

    #[test]
    fn length_counts_characters_after_trimming() {
        let mut v = Validator::new();
        v.length("content", "   ", 1, 10);
        assert_eq!(issues(v.finish())[0].message, "must not be empty");
    }

    #[test]
    fn clean_drops_blank_strings() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" Lekki ".into())), Some("Lekki".into()));
    }
}
