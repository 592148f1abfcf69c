//! Request validation - field rules shared by every entity payload.
//!
//! Payload structs deserialize with serde (shape and types), then implement
//! [`Validate`] for the format rules serde cannot express: minimum name
//! lengths, email shape, date ordering and so on. Failures are collected in
//! [`FieldErrors`] so a single 400 response lists every offending field.

use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Minimum length of a trimmed name field.
pub const MIN_NAME_LEN: usize = 2;

/// Minimum length of a password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Format rules for a deserialized payload.
pub trait Validate {
    /// Checks the payload, returning [`Error::Validation`] with per-field details.
    fn validate(&self) -> Result<()>;
}

/// Collects per-field validation messages.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: Map<String, Value>,
}

impl FieldErrors {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| Value::String(message.into()));
    }

    /// Requires a trimmed name of at least [`MIN_NAME_LEN`] characters.
    pub fn check_name(&mut self, field: &str, value: &str) {
        if value.trim().chars().count() < MIN_NAME_LEN {
            self.add(
                field,
                format!("must be at least {MIN_NAME_LEN} characters"),
            );
        }
    }

    /// Requires a non-blank value.
    pub fn check_present(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    /// Same as [`Self::check_name`] but only when the value was supplied.
    pub fn check_name_opt(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.check_name(field, v);
        }
    }

    /// Requires something that looks like an email address.
    pub fn check_email(&mut self, field: &str, value: &str) {
        if !looks_like_email(value) {
            self.add(field, "must be a valid email address");
        }
    }

    /// Requires a password of at least [`MIN_PASSWORD_LEN`] characters.
    pub fn check_password(&mut self, field: &str, value: &str) {
        if value.chars().count() < MIN_PASSWORD_LEN {
            self.add(
                field,
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the collected messages into a result.
    pub fn into_result(self) -> Result<()> {
        if self.fields.is_empty() {
            return Ok(());
        }
        Err(Error::Validation {
            message: "Invalid request body".to_string(),
            details: Value::Object(self.fields),
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

/// Parses a calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp or a
/// naive `YYYY-MM-DDTHH:MM:SS` timestamp. Timestamps keep only their date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Serde helper accepting any format understood by [`parse_date`].
pub fn flexible_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

/// Optional variant of [`flexible_date`]; use with `#[serde(default)]`.
pub fn flexible_date_opt<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_date(&s).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid date `{s}`, expected YYYY-MM-DD"))
        }),
    }
}

/// Checks an image URL against the host allow-list.
///
/// Only `http`/`https` URLs qualify. A host matches an entry when it is
/// equal to it or a subdomain of it.
#[must_use]
pub fn image_host_allowed(url: &str, allowed: &[String]) -> bool {
    let rest = if let Some(r) = url.strip_prefix("https://") {
        r
    } else if let Some(r) = url.strip_prefix("http://") {
        r
    } else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = host_port
        .split(':')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }
    allowed.iter().any(|domain| {
        let domain = domain.trim().to_ascii_lowercase();
        !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
    })
}

/// Records an error for `field` when the image URL is not on the allow-list.
pub fn check_image(errors: &mut FieldErrors, field: &str, url: Option<&str>, allowed: &[String]) {
    if let Some(url) = url {
        if !url.trim().is_empty() && !image_host_allowed(url, allowed) {
            errors.add(field, "image host is not allowed");
        }
    }
}

/// Deserializes a JSON value into `T`, mapping serde errors to a 400.
pub fn from_json<T>(value: Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value).map_err(|e| Error::Validation {
        message: "Invalid request body".to_string(),
        details: serde_json::json!({ "body": e.to_string() }),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_date("2024-06-01"), Some(expected));
        assert_eq!(parse_date("2024-06-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("2024-06-01T10:30:00.000+05:30"), Some(expected));
        assert_eq!(parse_date("2024-06-01T08:00:00"), Some(expected));
        assert_eq!(parse_date("01/06/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_field_errors_collects_details() {
        let mut errors = FieldErrors::new();
        errors.check_name("name", " a ");
        errors.check_email("email", "not-an-email");
        errors.check_present("code", "");
        errors.check_name("ok", "Engineering");

        let err = errors.into_result().unwrap_err();
        match err {
            Error::Validation { details, .. } => {
                assert!(details.get("name").is_some());
                assert!(details.get("email").is_some());
                assert!(details.get("code").is_some());
                assert!(details.get("ok").is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a.b@college.edu"));
        assert!(!looks_like_email("@college.edu"));
        assert!(!looks_like_email("student@localhost"));
        assert!(!looks_like_email("stu dent@college.edu"));
    }

    #[test]
    fn test_image_host_allow_list() {
        let allowed = vec!["res.cloudinary.com".to_string(), "example.org".to_string()];
        assert!(image_host_allowed(
            "https://res.cloudinary.com/demo/image.png",
            &allowed
        ));
        assert!(image_host_allowed("http://cdn.example.org:8080/a.jpg", &allowed));
        assert!(!image_host_allowed("https://evil.com/a.png", &allowed));
        assert!(!image_host_allowed("https://notexample.org/a.png", &allowed));
        assert!(!image_host_allowed("ftp://example.org/a.png", &allowed));
        assert!(!image_host_allowed("https://example.org/a.png", &[]));
    }

    #[test]
    fn test_from_json_maps_missing_field() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Body {
            name: String,
        }
        let err = from_json::<Body>(json!({})).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
