use super::form::VisitorRecord;
use super::schema::{rule, FieldId, ValueCheck, SCHEMA};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .expect("phone pattern is valid")
});

const MIN_AGE: i64 = 1;
const MAX_AGE: i64 = 150;

/// Validate one raw value against its field rule.
///
/// Returns an empty string when the value is acceptable, otherwise the
/// message to show next to the field.
pub fn validate(field: FieldId, raw: &str) -> String {
    let rule = rule(field);

    if rule.required && raw.trim().is_empty() {
        return format!("{} is required", rule.label);
    }

    match rule.check {
        ValueCheck::None => String::new(),
        ValueCheck::Email => {
            if !raw.is_empty() && !EMAIL_PATTERN.is_match(raw) {
                "Please enter a valid email address".to_string()
            } else {
                String::new()
            }
        }
        ValueCheck::Phone => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            if !raw.is_empty() && !PHONE_PATTERN.is_match(&compact) {
                "Please enter a valid phone number".to_string()
            } else {
                String::new()
            }
        }
        ValueCheck::Age => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            match trimmed.parse::<i64>() {
                Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => String::new(),
                _ => "Please enter a valid age".to_string(),
            }
        }
    }
}

/// Run every rule in schema order, keeping only the failures
pub fn validate_all<'a, F>(value_of: F) -> Vec<(FieldId, String)>
where
    F: Fn(FieldId) -> &'a str,
{
    SCHEMA
        .iter()
        .filter_map(|spec| {
            let error = validate(spec.id, value_of(spec.id));
            (!error.is_empty()).then_some((spec.id, error))
        })
        .collect()
}

/// Convenience wrapper over [`validate_all`] for a full record
pub fn validate_record(record: &VisitorRecord) -> Vec<(FieldId, String)> {
    validate_all(|field| record.value(field))
}
