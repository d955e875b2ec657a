mod engine;
mod form;
mod schema;
#[cfg(test)]
mod tests;

pub use engine::{validate, validate_all, validate_record};
pub use form::{FieldState, VisitorForm, VisitorRecord};
pub use schema::{rule, FieldId, FieldRule, FieldSpec, InputKind, ValueCheck, SCHEMA};
