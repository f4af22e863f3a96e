//! Authentication state snapshots.
//!
//! `SessionFacts` is owned by the authentication collaborator; this client
//! only ever reads it. Snapshots arrive whole over a channel, so there is a
//! single writer and no partial updates to reason about.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// The signed-in account, present only when authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Snapshot of the externally-owned authentication state.
///
/// Invariant (collaborator's contract): `is_authenticated` implies `user` is
/// present; `role` is only meaningful when authenticated. While `is_loading`
/// is true the snapshot must not drive a final view decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFacts {
    pub is_authenticated: bool,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub user: Option<UserInfo>,
    pub is_loading: bool,
}

impl SessionFacts {
    /// Initial state: the collaborator is still resolving a persisted session.
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            role: None,
            user: None,
            is_loading: true,
        }
    }

    /// Fully resolved, not signed in.
    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            role: None,
            user: None,
            is_loading: false,
        }
    }

    /// Fully resolved, signed in with the given role and account.
    pub fn signed_in(role: Role, user: UserInfo) -> Self {
        Self {
            is_authenticated: true,
            role: Some(role),
            user: Some(user),
            is_loading: false,
        }
    }

    /// The role to render for, but only when every fact needed for a final
    /// decision has arrived: authenticated, role known, account known, and
    /// the collaborator is done loading. Anything less returns `None`.
    pub fn resolved_role(&self) -> Option<Role> {
        if self.is_authenticated && !self.is_loading && self.user.is_some() {
            self.role
        } else {
            None
        }
    }
}

impl Default for SessionFacts {
    fn default() -> Self {
        Self::loading()
    }
}

/// Result of the direct (non-reactive) persisted-session accessor.
///
/// Only the callback watchdog consults this; it carries just enough to run
/// the email-marker classification heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user_id: String,
    pub email: String,
}
