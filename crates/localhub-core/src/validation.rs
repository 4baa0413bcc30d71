//! Field-level validation support.
//!
//! Input types derive [`validator::Validate`] for per-field rules and
//! implement [`Validated`] to add cross-field rules. Every failure is
//! collected into [`FieldErrors`] so a client sees all problems at once.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::DomainError;

static COUPON_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9-]{2,49}$").expect("valid coupon code regex"));
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));
static FEATURE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.-]{1,99}$").expect("valid feature key regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9()\-. ]{7,30}$").expect("valid phone regex"));

/// Ordered map of field name to messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }

    /// Flattens validator output; nested structs and lists become dotted paths.
    pub fn extend_from(&mut self, errors: &ValidationErrors) {
        self.extend_with_prefix("", errors);
    }

    fn extend_with_prefix(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        self.add(&path, describe(&path, error));
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.extend_with_prefix(&path, nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.extend_with_prefix(&format!("{}.{}", path, index), nested);
                    }
                }
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        out.extend_from(&errors);
        out
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("The {} field is invalid ({})", field, error.code),
    }
}

/// Rules for an input type: derived field rules plus cross-field rules.
pub trait Validated: Validate {
    fn cross_field_rules(&self, _errors: &mut FieldErrors) {}

    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if let Err(e) = self.validate() {
            errors.extend_from(&e);
        }
        self.cross_field_rules(&mut errors);
        errors
    }

    fn check(&self) -> Result<(), DomainError> {
        self.field_errors().into_result()
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if localhub_shared::utils::is_slug(value) {
        Ok(())
    } else {
        Err(invalid("slug", "Slug may only contain lowercase letters, digits and single dashes"))
    }
}

pub fn validate_coupon_code(value: &str) -> Result<(), ValidationError> {
    if COUPON_CODE_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("coupon_code", "Code must be 3-50 uppercase letters, digits or dashes"))
    }
}

pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if CURRENCY_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("currency", "Currency must be a 3-letter uppercase ISO code"))
    }
}

pub fn validate_feature_key(value: &str) -> Result<(), ValidationError> {
    if FEATURE_KEY_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("feature_key", "Feature key may only contain lowercase letters, digits, '_', '.' and '-'"))
    }
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("phone", "Phone number is not valid"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 2, message = "Too short"))]
        name: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(range(min = 1, message = "Must be positive"))]
        count: i32,
        #[validate(nested)]
        inner: Inner,
    }

    impl Validated for Outer {
        fn cross_field_rules(&self, errors: &mut FieldErrors) {
            if self.count > 10 {
                errors.add("count", "Must be ten or less");
            }
        }
    }

    #[test]
    fn test_nested_paths_are_flattened() {
        let input = Outer { count: 0, inner: Inner { name: "x".into() } };
        let errors = input.field_errors();
        assert_eq!(errors.get("count"), Some(&["Must be positive".to_string()][..]));
        assert_eq!(errors.get("inner.name"), Some(&["Too short".to_string()][..]));
    }

    #[test]
    fn test_cross_field_rules_merge() {
        let input = Outer { count: 11, inner: Inner { name: "ok".into() } };
        let err = input.check().unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["count"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let input = Outer { count: 5, inner: Inner { name: "ok".into() } };
        assert!(input.check().is_ok());
    }

    #[test]
    fn test_pattern_validators() {
        assert!(validate_coupon_code("SPRING-25").is_ok());
        assert!(validate_coupon_code("spring").is_err());
        assert!(validate_coupon_code("AB").is_err());
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_feature_key("new_checkout.v2").is_ok());
        assert!(validate_feature_key("New Checkout").is_err());
        assert!(validate_phone("+1 (555) 010-2000").is_ok());
        assert!(validate_phone("call me").is_err());
        assert!(validate_slug("main-st").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = FieldErrors::default();
        errors.add("end_date", "End date must be after the start date");
        errors.add("title", "Title is required");
        assert_eq!(
            errors.to_string(),
            "end_date: End date must be after the start date; title: Title is required"
        );
    }
}
