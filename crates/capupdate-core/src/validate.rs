//! Form validation for publish and update requests.
//!
//! Inputs are deserialized leniently (missing fields become empty strings)
//! so that every problem is reported as a per-field message instead of a
//! single deserialization error. Values are checked as submitted; nothing is
//! trimmed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Minimum length of the password chosen at publish time.
pub const MIN_PASSWORD_CHARS: usize = 4;

/// Upper bounds on submitted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_name_chars: usize,
    pub max_version_chars: usize,
    pub max_description_chars: usize,
    /// HTML is bounded in bytes since that is what the store holds.
    pub max_html_bytes: usize,
    pub max_password_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_name_chars: 200,
            max_version_chars: 64,
            max_description_chars: 2000,
            max_html_bytes: 1024 * 1024,
            max_password_chars: 128,
        }
    }
}

/// Per-field validation messages, keyed by the camelCase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    /// Record a message against a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Names of all fields with at least one message.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.is_empty() {
        errors.add(field, message);
    }
}

fn max_chars(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Must be at most {max} characters."));
    }
}

fn check_common(
    errors: &mut FieldErrors,
    limits: &Limits,
    name: &str,
    version: &str,
    description: Option<&str>,
    html_content: &str,
) {
    require(errors, "name", name, "Application name is required.");
    max_chars(errors, "name", name, limits.max_name_chars);

    require(errors, "version", version, "Version is required.");
    max_chars(errors, "version", version, limits.max_version_chars);

    if let Some(description) = description {
        max_chars(errors, "description", description, limits.max_description_chars);
    }

    require(errors, "htmlContent", html_content, "HTML content is required.");
    if html_content.len() > limits.max_html_bytes {
        errors.add(
            "htmlContent",
            format!("HTML content must be at most {} bytes.", limits.max_html_bytes),
        );
    }
}

/// Check the password supplied to unlock an existing record.
///
/// # Errors
///
/// Returns the `authPassword` field error when the password is empty.
pub fn check_auth_password(auth_password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    require(
        &mut errors,
        "authPassword",
        auth_password,
        "Password is required to update.",
    );
    errors.into_result(())
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Raw fields submitted to publish a new application.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewApplication {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub html_content: String,
    pub password: String,
}

impl std::fmt::Debug for NewApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewApplication")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("html_bytes", &self.html_content.len())
            .finish_non_exhaustive()
    }
}

/// A publish request that passed validation.
#[derive(Clone)]
pub struct ValidNewApplication {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub html_content: String,
    pub password: String,
}

impl std::fmt::Debug for ValidNewApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidNewApplication")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("html_bytes", &self.html_content.len())
            .finish_non_exhaustive()
    }
}

impl NewApplication {
    /// Validate against `limits`.
    ///
    /// An empty description is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its messages.
    pub fn validate(self, limits: &Limits) -> Result<ValidNewApplication, FieldErrors> {
        let mut errors = FieldErrors::default();
        check_common(
            &mut errors,
            limits,
            &self.name,
            &self.version,
            self.description.as_deref(),
            &self.html_content,
        );
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_CHARS} characters long."),
            );
        }
        max_chars(&mut errors, "password", &self.password, limits.max_password_chars);

        errors.into_result(ValidNewApplication {
            name: self.name,
            version: self.version,
            description: empty_to_none(self.description),
            html_content: self.html_content,
            password: self.password,
        })
    }
}

/// Raw fields submitted to change an existing application.
///
/// `description` is optional: leaving it out keeps the stored value,
/// sending an empty string clears it.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationUpdate {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub html_content: String,
    pub auth_password: String,
}

impl std::fmt::Debug for ApplicationUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationUpdate")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("html_bytes", &self.html_content.len())
            .finish_non_exhaustive()
    }
}

/// An update request that passed validation.
#[derive(Clone)]
pub struct ValidUpdate {
    pub name: String,
    pub version: String,
    /// `None`: keep. `Some(None)`: clear. `Some(Some(_))`: replace.
    pub description: Option<Option<String>>,
    pub html_content: String,
    pub auth_password: String,
}

impl std::fmt::Debug for ValidUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidUpdate")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("html_bytes", &self.html_content.len())
            .finish_non_exhaustive()
    }
}

impl ApplicationUpdate {
    /// Validate against `limits`. Password strength is not re-checked; only
    /// presence of `authPassword` is required.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its messages.
    pub fn validate(self, limits: &Limits) -> Result<ValidUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();
        check_common(
            &mut errors,
            limits,
            &self.name,
            &self.version,
            self.description.as_deref(),
            &self.html_content,
        );
        if let Err(auth) = check_auth_password(&self.auth_password) {
            errors.0.extend(auth.0);
        }

        errors.into_result(ValidUpdate {
            name: self.name,
            version: self.version,
            description: self.description.map(|d| empty_to_none(Some(d))),
            html_content: self.html_content,
            auth_password: self.auth_password,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn demo() -> NewApplication {
        NewApplication {
            name: "Demo".to_owned(),
            version: "1.0.0".to_owned(),
            description: None,
            html_content: "<b>hi</b>".to_owned(),
            password: "abcd".to_owned(),
        }
    }

    fn demo_update() -> ApplicationUpdate {
        ApplicationUpdate {
            name: "Demo".to_owned(),
            version: "1.0.1".to_owned(),
            description: None,
            html_content: "<i>hi</i>".to_owned(),
            auth_password: "abcd".to_owned(),
        }
    }

    #[test]
    fn valid_input_keeps_submitted_values() {
        let valid = demo().validate(&Limits::default()).unwrap();
        assert_eq!(valid.name, "Demo");
        assert_eq!(valid.version, "1.0.0");
        assert_eq!(valid.html_content, "<b>hi</b>");
        assert_eq!(valid.password, "abcd");
        assert!(valid.description.is_none());
    }

    #[test]
    fn empty_name_is_reported_against_name() {
        let input = NewApplication {
            name: String::new(),
            ..demo()
        };
        let errors = input.validate(&Limits::default()).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            ["Application name is required.".to_owned()]
        );
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn all_missing_fields_reported_together() {
        let errors = NewApplication::default()
            .validate(&Limits::default())
            .unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["htmlContent", "name", "password", "version"]);
    }

    #[test]
    fn short_password_rejected_on_publish() {
        let input = NewApplication {
            password: "abc".to_owned(),
            ..demo()
        };
        let errors = input.validate(&Limits::default()).unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["Password must be at least 4 characters long.".to_owned()]
        );
    }

    #[test]
    fn html_over_limit_rejected() {
        let limits = Limits {
            max_html_bytes: 8,
            ..Limits::default()
        };
        let input = NewApplication {
            html_content: "<p>123456</p>".to_owned(),
            ..demo()
        };
        let errors = input.validate(&limits).unwrap_err();
        assert!(errors.get("htmlContent").is_some());
    }

    #[test]
    fn overlong_name_counts_characters() {
        let limits = Limits {
            max_name_chars: 3,
            ..Limits::default()
        };
        let ok = NewApplication {
            name: "äöü".to_owned(),
            ..demo()
        };
        assert!(ok.validate(&limits).is_ok());

        let too_long = NewApplication {
            name: "abcd".to_owned(),
            ..demo()
        };
        assert!(too_long.validate(&limits).unwrap_err().get("name").is_some());
    }

    #[test]
    fn empty_description_becomes_none() {
        let input = NewApplication {
            description: Some(String::new()),
            ..demo()
        };
        assert!(input.validate(&Limits::default()).unwrap().description.is_none());
    }

    #[test]
    fn whitespace_is_not_trimmed() {
        let input = NewApplication {
            name: " ".to_owned(),
            ..demo()
        };
        assert_eq!(input.validate(&Limits::default()).unwrap().name, " ");
    }

    #[test]
    fn lenient_json_reports_missing_fields() {
        let input: NewApplication = serde_json::from_str(r#"{"name":"Demo"}"#).unwrap();
        let errors = input.validate(&Limits::default()).unwrap_err();
        assert!(errors.get("name").is_none());
        assert!(errors.get("version").is_some());
    }

    #[test]
    fn update_requires_auth_password_but_not_strength() {
        let short = ApplicationUpdate {
            auth_password: "x".to_owned(),
            ..demo_update()
        };
        assert!(short.validate(&Limits::default()).is_ok());

        let missing = ApplicationUpdate {
            auth_password: String::new(),
            ..demo_update()
        };
        let errors = missing.validate(&Limits::default()).unwrap_err();
        assert_eq!(
            errors.get("authPassword").unwrap(),
            ["Password is required to update.".to_owned()]
        );
    }

    #[test]
    fn update_description_tristate() {
        let keep = demo_update().validate(&Limits::default()).unwrap();
        assert_eq!(keep.description, None);

        let clear = ApplicationUpdate {
            description: Some(String::new()),
            ..demo_update()
        }
        .validate(&Limits::default())
        .unwrap();
        assert_eq!(clear.description, Some(None));

        let set = ApplicationUpdate {
            description: Some("new".to_owned()),
            ..demo_update()
        }
        .validate(&Limits::default())
        .unwrap();
        assert_eq!(set.description, Some(Some("new".to_owned())));
    }

    #[test]
    fn debug_output_hides_passwords() {
        let dbg = format!("{:?}", demo());
        assert!(!dbg.contains("abcd"));
        let dbg = format!("{:?}", demo_update());
        assert!(!dbg.contains("abcd"));
    }

    #[test]
    fn field_errors_serialize_as_map() {
        let mut errors = FieldErrors::default();
        errors.add("name", "Application name is required.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["name"][0], "Application name is required.");
    }
}
