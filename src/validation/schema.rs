use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registration form fields, declared in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Name,
    Age,
    Gender,
    Email,
    Phone,
    Address,
    Purpose,
    PersonToMeet,
    PersonEmail,
    PersonPhone,
}

impl FieldId {
    pub const ALL: [FieldId; 10] = [
        FieldId::Name,
        FieldId::Age,
        FieldId::Gender,
        FieldId::Email,
        FieldId::Phone,
        FieldId::Address,
        FieldId::Purpose,
        FieldId::PersonToMeet,
        FieldId::PersonEmail,
        FieldId::PersonPhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::Age => "age",
            FieldId::Gender => "gender",
            FieldId::Email => "email",
            FieldId::Phone => "phone",
            FieldId::Address => "address",
            FieldId::Purpose => "purpose",
            FieldId::PersonToMeet => "person_to_meet",
            FieldId::PersonEmail => "person_email",
            FieldId::PersonPhone => "person_phone",
        }
    }

    /// Position of the field in schema order
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown form field: {}", s))
    }
}

/// How the field is presented to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
    Select,
    Email,
    Tel,
    TextArea,
}

/// Format rule applied to non-empty values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCheck {
    None,
    Email,
    Phone,
    Age,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub label: &'static str,
    pub input_kind: InputKind,
    pub required: bool,
    pub placeholder: &'static str,
    /// Choices for select fields; the empty choice means "nothing selected"
    pub options: &'static [&'static str],
    pub check: ValueCheck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub rule: FieldRule,
}

const GENDER_OPTIONS: &[&str] = &["", "Male", "Female", "Other", "Prefer not to say"];

const PURPOSE_OPTIONS: &[&str] = &[
    "",
    "Business Meeting",
    "Interview",
    "Delivery",
    "Personal Visit",
    "Official Work",
    "Other",
];

/// Static field table consulted by the validator
pub static SCHEMA: [FieldSpec; 10] = [
    FieldSpec {
        id: FieldId::Name,
        rule: FieldRule {
            label: "Full Name",
            input_kind: InputKind::Text,
            required: true,
            placeholder: "Enter your full name",
            options: &[],
            check: ValueCheck::None,
        },
    },
    FieldSpec {
        id: FieldId::Age,
        rule: FieldRule {
            label: "Age",
            input_kind: InputKind::Number,
            required: false,
            placeholder: "Enter your age",
            options: &[],
            check: ValueCheck::Age,
        },
    },
    FieldSpec {
        id: FieldId::Gender,
        rule: FieldRule {
            label: "Gender",
            input_kind: InputKind::Select,
            required: true,
            placeholder: "Select an option",
            options: GENDER_OPTIONS,
            check: ValueCheck::None,
        },
    },
    FieldSpec {
        id: FieldId::Email,
        rule: FieldRule {
            label: "Email Address",
            input_kind: InputKind::Email,
            required: true,
            placeholder: "your.email@example.com",
            options: &[],
            check: ValueCheck::Email,
        },
    },
    FieldSpec {
        id: FieldId::Phone,
        rule: FieldRule {
            label: "Phone Number",
            input_kind: InputKind::Tel,
            required: true,
            placeholder: "+1 555-000-0000",
            options: &[],
            check: ValueCheck::Phone,
        },
    },
    FieldSpec {
        id: FieldId::Address,
        rule: FieldRule {
            label: "Address",
            input_kind: InputKind::TextArea,
            required: true,
            placeholder: "Enter your address",
            options: &[],
            check: ValueCheck::None,
        },
    },
    FieldSpec {
        id: FieldId::Purpose,
        rule: FieldRule {
            label: "Purpose of Visit",
            input_kind: InputKind::Select,
            required: true,
            placeholder: "Select an option",
            options: PURPOSE_OPTIONS,
            check: ValueCheck::None,
        },
    },
    FieldSpec {
        id: FieldId::PersonToMeet,
        rule: FieldRule {
            label: "Person to Meet",
            input_kind: InputKind::Text,
            required: true,
            placeholder: "Name of the person you're visiting",
            options: &[],
            check: ValueCheck::None,
        },
    },
    FieldSpec {
        id: FieldId::PersonEmail,
        rule: FieldRule {
            label: "Contact Email",
            input_kind: InputKind::Email,
            required: true,
            placeholder: "contact.email@example.com",
            options: &[],
            check: ValueCheck::Email,
        },
    },
    FieldSpec {
        id: FieldId::PersonPhone,
        rule: FieldRule {
            label: "Contact Phone",
            input_kind: InputKind::Tel,
            required: true,
            placeholder: "+1 555-000-0000",
            options: &[],
            check: ValueCheck::Phone,
        },
    },
];

/// Look up the rule for a field
pub fn rule(field: FieldId) -> &'static FieldRule {
    &SCHEMA[field.index()].rule
}
