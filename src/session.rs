//! Sessions
//!
//! The signed-in user as reported by the authentication provider.

use std::sync::{PoisonError, RwLock};

use mockall::automock;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// User id
    pub id: String,

    /// User email
    pub email: String,
}

impl Session {
    /// Create a session for a user.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Source of the current session.
#[automock]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, or `None` when signed out.
    fn current_session(&self) -> Option<Session>;
}

/// A session provider whose user is set explicitly.
#[derive(Debug, Default)]
pub struct StaticSession {
    session: RwLock<Option<Session>>,
}

impl StaticSession {
    /// A provider with `session` signed in.
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Replace the signed-in user.
    pub fn sign_in(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Sign the current user out.
    pub fn sign_out(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SessionProvider for StaticSession {
    fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
