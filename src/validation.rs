//! Form validation driven by rule tables.
//!
//! Each form is a list of `(field, rules)` entries. Rules run in order and the
//! first failing rule for a field supplies that field's message.

use std::collections::BTreeMap;

use serde::Serialize;

/// Read access to a submitted form's fields by name.
pub trait FormFields {
    fn field(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    Required,
    /// Skipped for empty values; pair with `Required` when the field is mandatory.
    MinLen(usize),
    MaxLen(usize),
    Email,
    EqualTo(&'static str),
}

pub type Rule = (Check, &'static str);
pub type FieldRules = (&'static str, &'static [Rule]);

const REQUIRED: Rule = (Check::Required, "This field is required.");

pub const LOGIN: &[FieldRules] = &[("email", &[REQUIRED]), ("password", &[REQUIRED])];

pub const ADD_USER: &[FieldRules] = &[
    (
        "first_name",
        &[REQUIRED, (Check::MaxLen(20), "Field cannot be longer than 20 characters.")],
    ),
    (
        "last_name",
        &[REQUIRED, (Check::MaxLen(20), "Field cannot be longer than 20 characters.")],
    ),
    (
        "email",
        &[
            REQUIRED,
            (Check::MaxLen(60), "Field cannot be longer than 60 characters."),
            (Check::Email, "Invalid email address."),
        ],
    ),
    (
        "password",
        &[
            (Check::MinLen(7), "Field must be between 7 and 50 characters long."),
            (Check::MaxLen(50), "Field must be between 7 and 50 characters long."),
        ],
    ),
];

/// First-user registration: like `ADD_USER`, but a password is mandatory.
pub const REGISTER: &[FieldRules] = &[
    ADD_USER[0],
    ADD_USER[1],
    ADD_USER[2],
    (
        "password",
        &[
            REQUIRED,
            (Check::MinLen(7), "Field must be between 7 and 50 characters long."),
            (Check::MaxLen(50), "Field must be between 7 and 50 characters long."),
        ],
    ),
];

pub const REQUEST_RESET: &[FieldRules] = &[("email", &[REQUIRED])];

pub const RESET_PASSWORD: &[FieldRules] = &[
    (
        "password",
        &[
            REQUIRED,
            (Check::MinLen(7), "Field must be between 7 and 50 characters long."),
            (Check::MaxLen(50), "Field must be between 7 and 50 characters long."),
        ],
    ),
    (
        "confirm_password",
        &[
            REQUIRED,
            (Check::EqualTo("password"), "Field must be equal to password."),
        ],
    ),
];

/// Field name to message, for every field that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.0.insert(field.to_string(), message.to_string());
        errors
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl Check {
    fn passes(&self, value: &str, form: &dyn FormFields) -> bool {
        match self {
            Check::Required => !value.trim().is_empty(),
            Check::MinLen(min) => value.is_empty() || value.chars().count() >= *min,
            Check::MaxLen(max) => value.chars().count() <= *max,
            Check::Email => value.is_empty() || looks_like_email(value),
            Check::EqualTo(other) => form.field(other).unwrap_or("") == value,
        }
    }
}

pub fn validate(form: &dyn FormFields, table: &[FieldRules]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (field, rules) in table {
        let value = form.field(field).unwrap_or("");
        if let Some((_, message)) = rules.iter().find(|(check, _)| !check.passes(value, form)) {
            errors.0.insert(field.to_string(), message.to_string());
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
