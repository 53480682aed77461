use serde_json::Value;

/// Message carried by every connectivity error.
pub const CONNECTIVITY_MESSAGE: &str = "Please check your internet connection";

/// Fallback message for application errors whose body carries none.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed before any HTTP response was obtained.
    #[error("{message}")]
    Connectivity { message: String, internal_message: String },

    /// Raised by a response interceptor that classified the response as a failure.
    #[error("{message}")]
    Application {
        message: String,
        status_code: u16,
        user_message: Option<String>,
        internal_message: Option<String>,
        data: Option<Value>,
    },

    /// The request could not be handed to the transport at all.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn connectivity(internal_message: impl Into<String>) -> Self {
        Error::Connectivity {
            message: CONNECTIVITY_MESSAGE.to_string(),
            internal_message: internal_message.into(),
        }
    }

    pub fn application(
        status_code: u16,
        user_message: Option<String>,
        internal_message: Option<String>,
        data: Option<Value>,
    ) -> Self {
        let message = user_message
            .clone()
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        Error::Application {
            message,
            status_code,
            user_message,
            internal_message,
            data,
        }
    }

    /// Machine status code; 0 when no HTTP response was involved.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Application { status_code, .. } => *status_code,
            _ => 0,
        }
    }

    /// Message suitable for showing to the user, if the error carries one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Error::Connectivity { message, .. } => Some(message.as_str()),
            Error::Application { user_message, .. } => user_message.as_deref(),
            _ => None,
        }
    }

    pub fn internal_message(&self) -> Option<&str> {
        match self {
            Error::Connectivity {
                internal_message, ..
            } => Some(internal_message.as_str()),
            Error::Application {
                internal_message, ..
            } => internal_message.as_deref(),
            Error::InvalidRequest { message } => Some(message.as_str()),
            Error::Json(_) => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Error::Application { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity { .. })
    }
}

impl From<crate::transport::TransportError> for Error {
    fn from(error: crate::transport::TransportError) -> Self {
        use crate::transport::TransportError;

        match error {
            TransportError::Connect(message) => Error::connectivity(message),
            TransportError::InvalidRequest(message) => Error::InvalidRequest { message },
        }
    }
}
