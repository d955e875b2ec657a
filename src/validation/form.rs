use super::engine::{validate, validate_record};
use super::schema::FieldId;
use crate::error::ValidationFailure;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Visitor registration data as entered on the kiosk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub purpose: String,
    pub person_to_meet: String,
    pub person_email: String,
    pub person_phone: String,
    /// Filled in asynchronously from the geolocation collaborator
    pub location: String,
}

impl VisitorRecord {
    pub fn value(&self, field: FieldId) -> &str {
        match field {
            FieldId::Name => &self.name,
            FieldId::Age => &self.age,
            FieldId::Gender => &self.gender,
            FieldId::Email => &self.email,
            FieldId::Phone => &self.phone,
            FieldId::Address => &self.address,
            FieldId::Purpose => &self.purpose,
            FieldId::PersonToMeet => &self.person_to_meet,
            FieldId::PersonEmail => &self.person_email,
            FieldId::PersonPhone => &self.person_phone,
        }
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        let slot = match field {
            FieldId::Name => &mut self.name,
            FieldId::Age => &mut self.age,
            FieldId::Gender => &mut self.gender,
            FieldId::Email => &mut self.email,
            FieldId::Phone => &mut self.phone,
            FieldId::Address => &mut self.address,
            FieldId::Purpose => &mut self.purpose,
            FieldId::PersonToMeet => &mut self.person_to_meet,
            FieldId::PersonEmail => &mut self.person_email,
            FieldId::PersonPhone => &mut self.person_phone,
        };
        *slot = value.into();
    }
}

/// Per-field validation state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub touched: bool,
    pub error: Option<String>,
}

/// Registration form with touch tracking and a submission gate
#[derive(Debug, Clone, Default)]
pub struct VisitorForm {
    record: VisitorRecord,
    fields: [FieldState; 10],
    submitting: bool,
}

impl VisitorForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &VisitorRecord {
        &self.record
    }

    pub fn field_state(&self, field: FieldId) -> &FieldState {
        &self.fields[field.index()]
    }

    /// Error to display for a field; hidden until the field has been touched
    pub fn visible_error(&self, field: FieldId) -> Option<&str> {
        let state = self.field_state(field);
        if state.touched {
            state.error.as_deref()
        } else {
            None
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Record a new value; re-validates only fields the visitor already left
    pub fn change(&mut self, field: FieldId, value: impl Into<String>) {
        if self.submitting {
            debug!("Ignoring change to {} while submitting", field);
            return;
        }

        self.record.set(field, value);

        if self.fields[field.index()].touched {
            self.refresh_error(field);
        }
    }

    /// Mark a field as touched and validate its current value
    pub fn blur(&mut self, field: FieldId) {
        self.fields[field.index()].touched = true;
        self.refresh_error(field);
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.record.location = location.into();
    }

    pub fn location(&self) -> &str {
        &self.record.location
    }

    /// Validate every field and, when all pass, lock the form for submission.
    ///
    /// Every field is marked touched and the error set is replaced wholesale.
    pub fn submit(&mut self) -> Result<VisitorRecord, ValidationFailure> {
        let errors = validate_record(&self.record);

        for field in FieldId::ALL {
            let state = &mut self.fields[field.index()];
            state.touched = true;
            state.error = errors
                .iter()
                .find(|(id, _)| *id == field)
                .map(|(_, message)| message.clone());
        }

        if errors.is_empty() {
            self.submitting = true;
            Ok(self.record.clone())
        } else {
            debug!("Form submission blocked by {} field error(s)", errors.len());
            Err(ValidationFailure { errors })
        }
    }

    /// Unlock the form after the backend asked for the details again
    pub fn reopen(&mut self) {
        self.submitting = false;
    }

    /// Clear values, touch state and errors
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn refresh_error(&mut self, field: FieldId) {
        let error = validate(field, self.record.value(field));
        self.fields[field.index()].error = (!error.is_empty()).then_some(error);
    }
}
