use thiserror::Error;

/// Sign-in errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The identity token could not be turned into a profile. The detail is
    /// for logs only.
    #[error("Failed to decode user information")]
    InvalidToken(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidToken(_) => "Failed to decode user information",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AuthError::InvalidToken(detail) => detail,
        }
    }
}
