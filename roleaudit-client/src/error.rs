//! Client error types.

use roleaudit_profile::StoreError;
use roleaudit_report::DeliveryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Instance REST API errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The configured user may not read the table.
    #[error("Access denied to table: {0}")]
    AccessDenied(String),

    /// The table does not exist on the instance.
    #[error("Invalid table: {0}")]
    UnknownTable(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// HTTP status code behind this error, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::ApiError { status, .. } => Some(*status),
            ClientError::AccessDenied(_) => Some(403),
            ClientError::AuthenticationFailed => Some(401),
            ClientError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            ClientError::UnknownTable(_) | ClientError::InvalidResponse(_) | ClientError::Config(_) => None,
        }
    }

    /// Check if the API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::AccessDenied(table) => StoreError::AccessDenied(table),
            ClientError::UnknownTable(table) => StoreError::UnknownTable(table),
            ClientError::InvalidResponse(message) => StoreError::InvalidResponse(message),
            other => StoreError::Request(other.to_string()),
        }
    }
}

impl From<ClientError> for DeliveryError {
    fn from(err: ClientError) -> Self {
        DeliveryError::WriteFailed(err.to_string())
    }
}
