//! View mode resolution.
//!
//! The top-level experience is a four-state machine (`login`, `callback`,
//! `admin`, `user`) scattered across several independent triggers in the
//! portal: session facts changing, deep-link navigation, the callback
//! screen's explicit success signal, the watchdog, and logout. Here it is
//! reified as a single pure transition function:
//!
//! `resolve(current, facts, location, event) -> Transition`
//!
//! This is THE ONLY WAY the view mode changes. The coordinator owns the
//! state and feeds events through in queue order; side effects come back as
//! data (`Effect`) so precedence is testable without any UI or clock.
//!
//! Precedence, earlier wins:
//! 1. Navigation to the OAuth return path (or a `code`/`error` query) forces
//!    `callback`, regardless of facts.
//! 2. While facts are loading, no transition (prevents a login flash while a
//!    persisted session resolves).
//! 3. Authenticated + role + user + not loading decides `admin`/`user`. The
//!    same check also runs from the callback-specific facts reaction; the
//!    two can race with the explicit success event by a tick and both are
//!    kept deliberately.
//! 4. Unauthenticated + not loading decides `login`.
//! 5. The explicit success event short-circuits to the role's mode without
//!    waiting for facts, and clears OAuth artifacts. If it carries no role,
//!    no transition is taken at all (fail safe, never guess).
//! 6. Logout forces `login` unconditionally and resets page sub-state.

use crate::model::{Location, Page, PersistedSession, Role, SessionFacts, UserInfo};

/// The single top-level screen selector. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Anonymous login screen. Safe default at process start.
    #[default]
    Login,
    /// In-flight OAuth callback.
    Callback,
    /// Authenticated administrative area.
    Admin,
    /// Authenticated end-user area.
    User,
}

impl ViewMode {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => ViewMode::Admin,
            Role::User => ViewMode::User,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Login => "login",
            ViewMode::Callback => "callback",
            ViewMode::Admin => "admin",
            ViewMode::User => "user",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, ViewMode::Admin | ViewMode::User)
    }
}

/// Everything that can move the session machine, in queue order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A fresh snapshot from the authentication collaborator.
    FactsChanged(SessionFacts),
    /// The client location changed (deep-link activation).
    NavigationChanged(Location),
    /// The callback screen finished its exchange. Carried through as an
    /// event, never stored as a flag.
    CallbackSucceeded {
        role: Option<Role>,
        user: Option<UserInfo>,
    },
    /// User-initiated sign-out.
    LogoutRequested,
    /// Admin page selection change. No mode transition.
    PageChangeRequested(Page),
    /// The callback watchdog deadline elapsed.
    WatchdogFired,
    /// Result of the watchdog's direct persisted-session probe. The epoch
    /// ties the answer to the probe that asked; the coordinator drops stale
    /// ones before they reach `resolve`.
    ProbeResolved {
        epoch: u64,
        session: Option<PersistedSession>,
    },
}

/// Side effects requested by a transition, executed by the coordinator or
/// the runtime. Kept as data so `resolve` stays pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Strip `code`/`error`/`state` from the location (replace history).
    ClearOauthArtifacts,
    /// Reset the admin page selection to its default.
    ResetPage,
    /// Invoke the authentication collaborator's sign-out. Failures are
    /// logged and swallowed; the mode is already `login` either way.
    SignOut,
    /// Run the direct persisted-session re-check, bypassing reactive facts.
    ProbeSession,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: ViewMode,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(mode: ViewMode) -> Self {
        Self {
            mode,
            effects: Vec::new(),
        }
    }

    fn to(mode: ViewMode) -> Self {
        Self {
            mode,
            effects: Vec::new(),
        }
    }

    fn with(mode: ViewMode, effects: Vec<Effect>) -> Self {
        Self { mode, effects }
    }
}

/// Resolver knobs taken from [`crate::config::SessionConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub oauth_return_path: &'a str,
    pub admin_email_marker: &'a str,
}

/// Compute the next view mode from all currently known facts.
///
/// `facts` and `location` are the post-event values: the coordinator stores
/// a `FactsChanged`/`NavigationChanged` payload before evaluating.
pub fn resolve(
    current: ViewMode,
    facts: &SessionFacts,
    location: &Location,
    event: &SessionEvent,
    ctx: &ResolveContext<'_>,
) -> Transition {
    match event {
        SessionEvent::NavigationChanged(_) => {
            // URL inspection wins unconditionally: the callback screen must
            // run its exchange before session facts can be trusted.
            if location.is_oauth_callback(ctx.oauth_return_path) {
                Transition::to(ViewMode::Callback)
            } else {
                settle_from_facts(current, facts)
            }
        }

        SessionEvent::FactsChanged(_) => {
            if current == ViewMode::Callback {
                // Callback-specific reaction: only a fully resolved session
                // leaves the callback screen. Unauthenticated facts here may
                // just mean the exchange has not landed yet; the watchdog
                // bounds how long we wait.
                match facts.resolved_role() {
                    Some(role) => Transition::with(
                        ViewMode::for_role(role),
                        vec![Effect::ClearOauthArtifacts],
                    ),
                    None => Transition::stay(current),
                }
            } else {
                settle_from_facts(current, facts)
            }
        }

        SessionEvent::CallbackSucceeded { role, .. } => match role {
            // Event-driven path: considered fresher than facts, applied
            // immediately for latency.
            Some(role) => Transition::with(
                ViewMode::for_role(*role),
                vec![Effect::ClearOauthArtifacts],
            ),
            // No role, no guess: park in the current mode.
            None => Transition::stay(current),
        },

        SessionEvent::LogoutRequested => Transition::with(
            ViewMode::Login,
            vec![Effect::SignOut, Effect::ResetPage, Effect::ClearOauthArtifacts],
        ),

        SessionEvent::PageChangeRequested(_) => Transition::stay(current),

        SessionEvent::WatchdogFired => {
            if current == ViewMode::Callback {
                Transition::with(ViewMode::Callback, vec![Effect::ProbeSession])
            } else {
                // Stale fire after the mode moved on; the coordinator also
                // cancels the timer on exit, so this is belt and suspenders.
                Transition::stay(current)
            }
        }

        SessionEvent::ProbeResolved { session, .. } => {
            if current != ViewMode::Callback {
                return Transition::stay(current);
            }
            match session {
                Some(session) => {
                    // Heuristic classification by email marker. Weaker than
                    // the role-based path and can disagree with it for
                    // edge-case addresses; kept as-is.
                    let mode = if session.email.contains(ctx.admin_email_marker) {
                        ViewMode::Admin
                    } else {
                        ViewMode::User
                    };
                    Transition::with(mode, vec![Effect::ClearOauthArtifacts])
                }
                // No session (or the re-check failed): forced return to
                // login. Artifacts are stripped so the next navigation
                // evaluation cannot bounce back into callback.
                None => Transition::with(ViewMode::Login, vec![Effect::ClearOauthArtifacts]),
            }
        }
    }
}

/// The general facts-driven reaction used outside callback mode.
fn settle_from_facts(current: ViewMode, facts: &SessionFacts) -> Transition {
    if facts.is_loading {
        // Loading guard: remain in the last stable mode.
        return Transition::stay(current);
    }
    if let Some(role) = facts.resolved_role() {
        return Transition::to(ViewMode::for_role(role));
    }
    if !facts.is_authenticated {
        return Transition::to(ViewMode::Login);
    }
    // Authenticated but role/user never arrived: fail safe to the current
    // mode rather than guessing.
    Transition::stay(current)
}
