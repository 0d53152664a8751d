use shared::error::RemoteRejection;
use thiserror::Error;

use crate::forms::FormKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] RemoteRejection),
    #[error("no matching patient record")]
    NotFound { detail: Option<String> },
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        Self::transport(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{form} form has no field `{field}`")]
    UnknownField { form: FormKind, field: String },
    #[error("`{field}` cannot be edited on the {form} form")]
    ReadOnlyField { form: FormKind, field: &'static str },
    #[error("{form} form is missing required field(s): {}", .fields.join(", "))]
    MissingRequired {
        form: FormKind,
        fields: Vec<&'static str>,
    },
    #[error("{form} form is not on screen")]
    Inactive { form: FormKind },
}
