//! Student record and field constraints.

use std::str::FromStr;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ServiceError};

/// Student primary key.
pub type StudentId = i64;

pub const NAME_MAX_CHARS: usize = 100;
pub const AGE_MIN: i64 = 1;
pub const AGE_MAX: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: i64,
    pub email: String,
}

impl Student {
    /// Check every field constraint, reporting all violations together.
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();

        if self.id <= 0 {
            errors.push(FieldError {
                field: "id",
                message: "Student ID must be a positive integer.".to_string(),
            });
        }

        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > NAME_MAX_CHARS {
            errors.push(FieldError {
                field: "name",
                message: format!("Name must be between 1 and {NAME_MAX_CHARS} characters."),
            });
        }

        if !(AGE_MIN..=AGE_MAX).contains(&self.age) {
            errors.push(FieldError {
                field: "age",
                message: format!("Age must be between {AGE_MIN} and {AGE_MAX}."),
            });
        }

        if let Err(e) = EmailAddress::from_str(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: format!("Value is not a valid email address: {e}"),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}
