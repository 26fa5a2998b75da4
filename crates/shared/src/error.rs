use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Filled on `not_found` for an unknown button.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_buttons: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            available_buttons: Vec::new(),
        }
    }

    pub fn with_available_buttons(mut self, buttons: Vec<String>) -> Self {
        self.available_buttons = buttons;
        self
    }
}
