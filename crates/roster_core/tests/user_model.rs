use roster_core::{User, UserField, UserValidationError, UNASSIGNED_USER_ID};

#[test]
fn user_new_is_unassigned() {
    let user = User::new("Juan", "Perez", "juan@x.com");

    assert_eq!(user.id, UNASSIGNED_USER_ID);
    assert!(!user.is_assigned());
    assert_eq!(user.field(UserField::LastName), "Perez");
}

#[test]
fn validate_rejects_blank_and_whitespace_fields() {
    let blank_first = User::new("", "Perez", "juan@x.com");
    let blank_email = User::new("Juan", "Perez", " \n\t ");

    assert_eq!(
        blank_first.validate(),
        Err(UserValidationError::BlankField(UserField::FirstName))
    );
    assert_eq!(
        blank_email.validate(),
        Err(UserValidationError::BlankField(UserField::Email))
    );
}

#[test]
fn validate_accepts_any_non_blank_email() {
    let user = User::new("Juan", "Perez", "not-an-email");
    assert!(user.validate().is_ok());
}

#[test]
fn validate_rejects_negative_id() {
    let user = User::with_id(-3, "Juan", "Perez", "juan@x.com");
    assert_eq!(user.validate(), Err(UserValidationError::InvalidId(-3)));
}

#[test]
fn user_serialization_uses_column_names() {
    let user = User::with_id(1, "Juan", "Perez", "juan@x.com");

    let json = serde_json::to_value(&user).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "id": 1,
            "firstName": "Juan",
            "lastName": "Perez",
            "email": "juan@x.com"
        })
    );
    let decoded: User = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, user);
}

#[test]
fn field_names_parse_in_both_spellings() {
    assert_eq!(UserField::parse("firstName"), Some(UserField::FirstName));
    assert_eq!(UserField::parse("last_name"), Some(UserField::LastName));
    assert_eq!(UserField::parse(" email "), Some(UserField::Email));
    assert_eq!(UserField::parse("phone"), None);
    assert_eq!(UserField::FirstName.to_string(), "firstName");
}
