use super::*;

fn complete_record() -> VisitorRecord {
    VisitorRecord {
        name: "Ada Lovelace".to_string(),
        age: "36".to_string(),
        gender: "Female".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+44 20-7946-0958".to_string(),
        address: "12 St James's Square, London".to_string(),
        purpose: "Business Meeting".to_string(),
        person_to_meet: "Charles Babbage".to_string(),
        person_email: "charles@example.com".to_string(),
        person_phone: "555-000-0000".to_string(),
        location: String::new(),
    }
}

#[test]
fn test_empty_value_errors_only_for_required_fields() {
    for spec in SCHEMA.iter() {
        let error = validate(spec.id, "");
        if spec.rule.required {
            assert_eq!(error, format!("{} is required", spec.rule.label));
        } else {
            assert_eq!(error, "", "{} should accept an empty value", spec.id);
        }
    }
}

#[test]
fn test_whitespace_counts_as_empty_for_required_fields() {
    assert_eq!(validate(FieldId::Name, "   "), "Full Name is required");
    assert_eq!(validate(FieldId::Gender, "\t"), "Gender is required");
}

#[test]
fn test_email_rule() {
    assert_eq!(validate(FieldId::Email, "a@b.co"), "");
    assert_eq!(validate(FieldId::PersonEmail, "first.last@corp.example.org"), "");

    for bad in ["not-an-email", "a@b", "a b@c.de", "@b.co", "a@@b.co", "a@b."] {
        assert_eq!(
            validate(FieldId::Email, bad),
            "Please enter a valid email address",
            "{} should be rejected",
            bad
        );
    }
}

#[test]
fn test_phone_rule() {
    for good in [
        "555-000-0000",
        "+1 555-000-0000",
        "5550000000",
        "(555) 000.0000",
        "+44 20 7946 0958",
    ] {
        assert_eq!(validate(FieldId::Phone, good), "", "{} should be accepted", good);
    }

    for bad in ["phone", "555-000-0000-0000-1", "12345678901234567890", "+-555"] {
        assert_eq!(
            validate(FieldId::PersonPhone, bad),
            "Please enter a valid phone number",
            "{} should be rejected",
            bad
        );
    }
}

#[test]
fn test_age_boundaries() {
    assert_eq!(validate(FieldId::Age, "0"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, "1"), "");
    assert_eq!(validate(FieldId::Age, "150"), "");
    assert_eq!(validate(FieldId::Age, "151"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, "-4"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, "forty"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, " 42 "), "");
}

#[test]
fn test_age_rejects_partial_numbers() {
    // Whole-string integer parse: no leading-number prefix is accepted
    assert_eq!(validate(FieldId::Age, "30abc"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, "25.5"), "Please enter a valid age");
    assert_eq!(validate(FieldId::Age, "1e2"), "Please enter a valid age");
}

#[test]
fn test_validate_all_reports_in_schema_order() {
    let mut record = complete_record();
    record.person_phone = "call me".to_string();
    record.name.clear();
    record.email = "nope".to_string();

    let errors = validate_record(&record);
    let fields: Vec<FieldId> = errors.iter().map(|(field, _)| *field).collect();
    assert_eq!(
        fields,
        vec![FieldId::Name, FieldId::Email, FieldId::PersonPhone]
    );

    assert!(validate_record(&complete_record()).is_empty());
}

#[test]
fn test_field_id_parsing() {
    assert_eq!("person_to_meet".parse::<FieldId>(), Ok(FieldId::PersonToMeet));
    assert!("location".parse::<FieldId>().is_err());

    for (index, field) in FieldId::ALL.iter().enumerate() {
        assert_eq!(SCHEMA[index].id, *field);
        assert_eq!(field.as_str().parse::<FieldId>(), Ok(*field));
    }
}

#[test]
fn test_change_before_blur_does_not_surface_errors() {
    let mut form = VisitorForm::new();

    form.change(FieldId::Email, "not-an-email");
    assert_eq!(form.visible_error(FieldId::Email), None);
    assert!(!form.field_state(FieldId::Email).touched);

    form.blur(FieldId::Email);
    assert_eq!(
        form.visible_error(FieldId::Email),
        Some("Please enter a valid email address")
    );

    // Once touched, edits re-validate immediately
    form.change(FieldId::Email, "a@b.co");
    assert_eq!(form.visible_error(FieldId::Email), None);
    assert!(form.field_state(FieldId::Email).touched);
}

#[test]
fn test_submit_gates_on_every_field() {
    let mut form = VisitorForm::new();
    form.change(FieldId::Name, "Ada");

    let failure = form.submit().unwrap_err();
    assert_eq!(failure.first_field(), Some(FieldId::Gender));
    assert!(!form.is_submitting());
    assert!(FieldId::ALL.iter().all(|f| form.field_state(*f).touched));
    assert_eq!(form.visible_error(FieldId::Name), None);
    assert_eq!(form.visible_error(FieldId::Phone), Some("Phone Number is required"));
}

#[test]
fn test_submit_locks_form_and_returns_record() {
    let mut form = VisitorForm::new();
    let expected = complete_record();
    for field in FieldId::ALL {
        form.change(field, expected.value(field));
    }
    form.set_location("51.5, -0.13");

    let record = form.submit().unwrap();
    assert!(form.is_submitting());
    assert_eq!(record.location, "51.5, -0.13");
    assert_eq!(record.name, expected.name);

    form.change(FieldId::Name, "Someone Else");
    assert_eq!(form.record().name, expected.name);

    form.reopen();
    form.change(FieldId::Name, "Someone Else");
    assert_eq!(form.record().name, "Someone Else");
}

#[test]
fn test_reset_clears_everything() {
    let mut form = VisitorForm::new();
    form.change(FieldId::Name, "Ada");
    form.blur(FieldId::Email);
    form.set_location("Location unavailable");

    form.reset();
    assert_eq!(form.record(), &VisitorRecord::default());
    assert_eq!(form.field_state(FieldId::Email), &FieldState::default());
}
