//! Access gate: one static access code unlocks the tool for the session.
//!
//! Plain equality, no hashing, no throttling, no lockout.

use crate::errors::AppError;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The session was already unlocked; nothing was compared.
    AlreadyAuthenticated,
    /// The code matched just now; the client should reload its view.
    Granted,
}

impl AccessDecision {
    pub fn requires_reload(self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

pub fn check_access(
    session: &mut Session,
    submitted: &str,
    expected: Option<&str>,
) -> Result<AccessDecision, AppError> {
    if session.authenticated {
        return Ok(AccessDecision::AlreadyAuthenticated);
    }

    if submitted.is_empty() {
        return Err(AppError::Validation("access_code cannot be empty".to_string()));
    }

    let expected = expected.ok_or_else(|| {
        AppError::Configuration("access code is missing from the secrets".to_string())
    })?;

    if submitted == expected {
        session.authenticated = true;
        Ok(AccessDecision::Granted)
    } else {
        Err(AppError::InvalidCredential)
    }
}
