//! Admin profile shown on the settings screen.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::contact::FieldErrors;

/// Profile as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub name: String,
    pub email: String,
}

/// Requested profile change. `password` is only sent when set.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProfileUpdate {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(derived) = self.validate() {
            for (field, field_errors) in derived.field_errors() {
                errors.entry(field.to_string()).or_default().extend(
                    field_errors
                        .iter()
                        .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("Invalid {field}"))),
                );
            }
        }
        if self.name.trim().is_empty() && !errors.contains_key("name") {
            errors.insert("name".into(), vec!["Name is required".into()]);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
