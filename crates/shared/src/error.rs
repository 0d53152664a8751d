use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body the record service sends with a non-success status. Login, create
/// and update failures carry `message`; search failures carry `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(error.into()),
        }
    }

    /// First non-blank human readable text in the body.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .into_iter()
            .chain(self.error.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("record service rejected request ({status}): {message}")]
pub struct RemoteRejection {
    pub status: u16,
    pub message: String,
}

impl RemoteRejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
