//! Unified application error model.
//! One enum covers every failure the auth, profile and enrollment flows can
//! surface; all of them are non-fatal and map to an HTTP status at the edge.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum AppError {
    /// No active session for an operation that requires one.
    #[error("not authenticated")]
    NotAuthenticated,
    /// Unknown user, wrong password or malformed credential at sign-in.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Re-authentication before a password change was rejected.
    #[error("incorrect current password")]
    WrongCurrentPassword,
    /// The provider already has an identity for this email.
    #[error("email is already registered")]
    EmailInUse,
    /// The provider rejected the password as too weak.
    #[error("password rejected by provider as too weak")]
    WeakPassword,
    /// New password and its confirmation differ (local precheck).
    #[error("passwords do not match")]
    PasswordMismatch,
    /// New password is under the 6 character floor (local precheck).
    #[error("password must be at least 6 characters")]
    PasswordTooWeak,
    /// A profile record that was expected to exist does not.
    #[error("record not found")]
    NotFound,
    /// Transport failure talking to the auth provider or document store.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AppError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        AppError::ProviderUnavailable(msg.into())
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "not_authenticated",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::WrongCurrentPassword => "wrong_current_password",
            AppError::EmailInUse => "email_in_use",
            AppError::WeakPassword => "weak_password",
            AppError::PasswordMismatch => "password_mismatch",
            AppError::PasswordTooWeak => "password_too_weak",
            AppError::NotFound => "not_found",
            AppError::ProviderUnavailable(_) => "provider_unavailable",
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::NotAuthenticated => 401,
            AppError::InvalidCredentials => 401,
            AppError::WrongCurrentPassword => 403,
            AppError::EmailInUse => 409,
            AppError::WeakPassword => 400,
            AppError::PasswordMismatch => 400,
            AppError::PasswordTooWeak => 400,
            AppError::NotFound => 404,
            AppError::ProviderUnavailable(_) => 503,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
