//! Form-level validation shared by the service layer and the form modal.
//!
//! Every record type declares its form fields as a static list of
//! [`FieldSpec`]s. The same list drives the input form and the checks run
//! before a record is sent to the backend.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::Record;

/// Kind of value a form field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    /// Whole non-negative number (counts, days, row ids).
    Integer,
    /// Signed decimal degrees.
    Coordinate,
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
    /// One of a fixed set of values.
    Choice(&'static [&'static str]),
    Bool,
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind, required: true }
    }

    pub const fn optional(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind, required: false }
    }
}

/// Validation failures keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<String, String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(|s| s.as_str())
    }

    pub fn insert(&mut self, key: &str, message: impl Into<String>) {
        self.errors.insert(key.to_string(), message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First error message, for one-line display.
    pub fn summary(&self) -> Option<String> {
        self.errors
            .iter()
            .next()
            .map(|(_, message)| message.clone())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} field(s) invalid: {}", .0.len(), .0.summary().unwrap_or_default())]
    Invalid(FormErrors),

    #[error("Record could not be serialized: {0}")]
    Serialization(String),
}

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Basic `local@domain.tld` check.
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value.trim())
}

/// Parse a form number, accepting a comma as decimal separator.
pub fn parse_number(value: &str) -> Option<f64> {
    let normalized = value.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Check a single field value against its spec.
pub fn check_field(spec: &FieldSpec, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if spec.required {
            return Err(format!("{} is required", spec.label));
        }
        return Ok(());
    }

    match spec.kind {
        FieldKind::Text => Ok(()),
        FieldKind::Email => {
            if is_valid_email(trimmed) {
                Ok(())
            } else {
                Err(format!("{} must look like name@domain.com", spec.label))
            }
        }
        FieldKind::Number => match parse_number(trimmed) {
            Some(n) if n >= 0.0 => Ok(()),
            Some(_) => Err(format!("{} cannot be negative", spec.label)),
            None => Err(format!("{} must be a number", spec.label)),
        },
        FieldKind::Integer => match parse_number(trimmed) {
            Some(n) if n < 0.0 => Err(format!("{} cannot be negative", spec.label)),
            Some(n) if n.fract() == 0.0 => Ok(()),
            Some(_) => Err(format!("{} must be a whole number", spec.label)),
            None => Err(format!("{} must be a number", spec.label)),
        },
        FieldKind::Coordinate => match parse_number(trimmed) {
            Some(n) if n.abs() <= 180.0 => Ok(()),
            Some(_) => Err(format!("{} is out of range", spec.label)),
            None => Err(format!("{} must be a number", spec.label)),
        },
        FieldKind::Date => {
            if parse_date(trimmed).is_some() {
                Ok(())
            } else {
                Err(format!("{} must be a date (YYYY-MM-DD)", spec.label))
            }
        }
        FieldKind::Choice(options) => {
            if options.iter().any(|o| o.eq_ignore_ascii_case(trimmed)) {
                Ok(())
            } else {
                Err(format!("{} must be one of: {}", spec.label, options.join(", ")))
            }
        }
        FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "false" | "si" | "sí" | "no" => Ok(()),
            _ => Err(format!("{} must be Sí or No", spec.label)),
        },
    }
}

/// Validate a set of raw form values (field key -> text).
///
/// Fields missing from `values` are treated as empty.
pub fn validate_fields<'a>(
    specs: &[FieldSpec],
    values: impl Fn(&str) -> Option<&'a str>,
) -> FormErrors {
    let mut errors = FormErrors::default();
    for spec in specs {
        let value = values(spec.key).unwrap_or("");
        if let Err(message) = check_field(spec, value) {
            errors.insert(spec.key, message);
        }
    }
    errors
}

/// Render a JSON field value the way a form shows it.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Sí".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Validate a record against its type's field specs.
pub fn validate_record<T: Record + Serialize>(record: &T) -> Result<(), ValidationError> {
    let json = serde_json::to_value(record)
        .map_err(|e| ValidationError::Serialization(e.to_string()))?;

    let texts: BTreeMap<&str, String> = T::FIELDS
        .iter()
        .map(|spec| {
            let text = json.get(spec.key).map(value_to_text).unwrap_or_default();
            (spec.key, text)
        })
        .collect();

    let errors = validate_fields(T::FIELDS, |key| texts.get(key).map(|s| s.as_str()));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dirigente, Scout};
    use std::collections::HashMap;

    const SPECS: &[FieldSpec] = &[
        FieldSpec::required("nombres", "Nombres", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("cantidad", "Cantidad", FieldKind::Number),
        FieldSpec::optional("dias", "Días", FieldKind::Integer),
        FieldSpec::optional("fecha", "Fecha", FieldKind::Date),
        FieldSpec::optional("rama", "Rama", FieldKind::Choice(&["MANADA", "TROPA"])),
    ];

    fn run(values: &[(&str, &str)]) -> FormErrors {
        let map: HashMap<&str, &str> = values.iter().copied().collect();
        validate_fields(SPECS, |k| map.get(k).copied())
    }

    #[test]
    fn test_required_field_empty_is_rejected() {
        let errors = run(&[("nombres", "   ")]);
        assert_eq!(errors.get("nombres"), Some("Nombres is required"));

        let errors = run(&[]);
        assert!(errors.get("nombres").is_some());
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let errors = run(&[("nombres", "Ana"), ("email", ""), ("cantidad", "")]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ana@grupo.pe"));
        assert!(is_valid_email(" ana.perez@scouts.org.pe "));
        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("ana@grupo"));
        assert!(!is_valid_email("ana @grupo.pe"));
        assert!(!is_valid_email("@grupo.pe"));

        let errors = run(&[("nombres", "Ana"), ("email", "ana@grupo")]);
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_number_and_date_fields() {
        let errors = run(&[("nombres", "Ana"), ("cantidad", "2,5"), ("fecha", "2024-03-01")]);
        assert!(errors.is_empty());

        let errors = run(&[("nombres", "Ana"), ("cantidad", "-1"), ("fecha", "01/03/2024")]);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_integer_fields_reject_fractions() {
        assert!(run(&[("nombres", "Ana"), ("dias", "3")]).is_empty());
        assert!(run(&[("nombres", "Ana"), ("dias", "3,0")]).is_empty());

        let errors = run(&[("nombres", "Ana"), ("dias", "2.5")]);
        assert_eq!(errors.get("dias"), Some("Días must be a whole number"));
        let errors = run(&[("nombres", "Ana"), ("dias", "-2")]);
        assert_eq!(errors.get("dias"), Some("Días cannot be negative"));
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        assert!(run(&[("nombres", "Ana"), ("rama", "tropa")]).is_empty());
        assert!(run(&[("nombres", "Ana"), ("rama", "CLAN")]).get("rama").is_some());
    }

    #[test]
    fn test_validate_record_blocks_missing_required() {
        let scout = Scout::default();
        let err = validate_record(&scout).unwrap_err();
        match err {
            ValidationError::Invalid(errors) => {
                assert!(errors.get("nombres").is_some());
                assert!(errors.get("apellidos").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_record_accepts_complete_record() {
        let dirigente = Dirigente {
            nombres: "Luis".to_string(),
            apellidos: "Quispe".to_string(),
            numero_documento: "45678912".to_string(),
            email: Some("luis@grupo.pe".to_string()),
            ..Default::default()
        };
        assert!(validate_record(&dirigente).is_ok());

        let bad_email = Dirigente {
            email: Some("luis-at-grupo".to_string()),
            ..dirigente
        };
        assert!(validate_record(&bad_email).is_err());
    }
}
