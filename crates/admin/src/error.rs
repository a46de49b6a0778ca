use mechgenz_client::ApiError;
use mechgenz_core::contact::FieldErrors;
use mechgenz_core::error::CoreError;

/// Errors surfaced by the admin screens.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before anything was sent.
    #[error("Invalid input: {}", summarize(.0))]
    Validation(FieldErrors),
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AdminError {
    pub(crate) fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::Validation(errors)
    }

    /// Text for an alert: the backend's detail when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Core(e) => e.to_string(),
            Self::Validation(errors) => summarize(errors),
        }
    }
}
