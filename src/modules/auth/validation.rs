//! Form field rules.
//!
//! Each field has an ordered list of checks. The first failing check is
//! reported for that field and the remaining checks for it are skipped;
//! other fields are still checked so one response can carry every error.

use validator::ValidateEmail;

use super::interface::AuthError;

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 120;
pub const PASSWORD_MIN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("This field is required.")]
    Required,

    #[error("Must be between {min} and {max} characters.")]
    Length { min: usize, max: usize },

    #[error("Must be at least {0} characters long.")]
    TooShort(usize),

    #[error("Must be less than {0} characters.")]
    TooLong(usize),

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Passwords must match.")]
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: ValidationFailure,
}

pub type Check = fn(&str) -> Result<(), ValidationFailure>;

pub const USERNAME: &[Check] = &[required, username_length];
pub const EMAIL: &[Check] = &[required, email_format, email_length];
pub const NEW_PASSWORD: &[Check] = &[required, password_length];
pub const PASSWORD: &[Check] = &[required];

pub fn required(value: &str) -> Result<(), ValidationFailure> {
    if value.trim().is_empty() {
        return Err(ValidationFailure::Required);
    }
    Ok(())
}

pub fn username_length(value: &str) -> Result<(), ValidationFailure> {
    let len = value.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationFailure::Length {
            min: USERNAME_MIN,
            max: USERNAME_MAX,
        });
    }
    Ok(())
}

pub fn email_format(value: &str) -> Result<(), ValidationFailure> {
    if !value.validate_email() {
        return Err(ValidationFailure::InvalidEmail);
    }
    Ok(())
}

pub fn email_length(value: &str) -> Result<(), ValidationFailure> {
    if value.chars().count() > EMAIL_MAX {
        return Err(ValidationFailure::TooLong(EMAIL_MAX));
    }
    Ok(())
}

pub fn password_length(value: &str) -> Result<(), ValidationFailure> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(ValidationFailure::TooShort(PASSWORD_MIN));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &'static str, value: &str, checks: &[Check]) -> Self {
        if let Some(reason) = checks.iter().find_map(|check| check(value).err()) {
            self.errors.push(FieldError { field, reason });
        }
        self
    }

    /// `value` must be present and equal to `expected`.
    pub fn confirm(mut self, field: &'static str, value: &str, expected: &str) -> Self {
        let outcome = required(value).and_then(|_| {
            if value == expected {
                Ok(())
            } else {
                Err(ValidationFailure::Mismatch)
            }
        });
        if let Err(reason) = outcome {
            self.errors.push(FieldError { field, reason });
        }
        self
    }

    pub fn finish(self) -> Result<(), AuthError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(self.errors))
        }
    }
}
