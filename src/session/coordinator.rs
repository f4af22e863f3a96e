//! Session coordinator.
//!
//! Owns the view mode, the client location, the admin page selection, and
//! the callback watchdog slot, and is the single writer for all of them.
//! Events go through [`resolve`] in queue order; outward side effects come
//! back as [`Command`]s for the runtime to execute (network work never
//! happens here).

use std::time::Duration;

use crate::config::SessionConfig;
use crate::model::{Location, Page, SessionFacts, UserInfo};
use crate::services::time_source::SharedTimeSource;
use crate::session::resolver::{self, Effect, ResolveContext, SessionEvent, Transition, ViewMode};
use crate::session::watchdog::CallbackWatchdog;

/// Resolver knobs lifted out of the full config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub oauth_return_path: String,
    pub admin_email_marker: String,
    pub callback_timeout: Duration,
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            oauth_return_path: config.oauth_return_path.clone(),
            admin_email_marker: config.admin_email_marker.clone(),
            callback_timeout: config.callback_timeout(),
        }
    }
}

/// Asynchronous work requested by a transition. The runtime executes these
/// and feeds results back as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Call the collaborator's sign-out. Errors are logged and swallowed.
    SignOut,
    /// Run the direct persisted-session re-check and answer with
    /// `SessionEvent::ProbeResolved` carrying the same epoch.
    ProbeSession { epoch: u64 },
}

/// The session/view coordination core.
pub struct SessionCoordinator {
    settings: SessionSettings,
    mode: ViewMode,
    facts: SessionFacts,
    location: Location,
    page: Page,
    watchdog: CallbackWatchdog,
    /// Bumped on every probe request and on every exit from callback mode,
    /// so an in-flight probe answer from a previous callback visit is
    /// dropped instead of overwriting a newer decision.
    probe_epoch: u64,
}

impl SessionCoordinator {
    pub fn new(settings: SessionSettings, time: SharedTimeSource) -> Self {
        let watchdog = CallbackWatchdog::new(time, settings.callback_timeout);
        Self {
            settings,
            mode: ViewMode::default(),
            facts: SessionFacts::loading(),
            location: Location::root(),
            page: Page::default(),
            watchdog,
            probe_epoch: 0,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn facts(&self) -> &SessionFacts {
        &self.facts
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The signed-in account, if the facts carry one.
    pub fn current_user(&self) -> Option<&UserInfo> {
        self.facts.user.as_ref()
    }

    /// Time left before the watchdog forces a decision (callback mode only).
    pub fn callback_remaining(&self) -> Option<Duration> {
        self.watchdog.remaining()
    }

    #[cfg(test)]
    pub(crate) fn watchdog_armed(&self) -> bool {
        self.watchdog.is_armed()
    }

    /// Apply one event and return the commands the runtime must run.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Command> {
        // Store incoming facts/location first; `resolve` sees post-event
        // values. Stale probe answers are dropped before evaluation.
        match &event {
            SessionEvent::FactsChanged(facts) => self.facts = facts.clone(),
            SessionEvent::NavigationChanged(location) => self.location = location.clone(),
            SessionEvent::PageChangeRequested(page) => self.page = *page,
            SessionEvent::ProbeResolved { epoch, .. } if *epoch != self.probe_epoch => {
                tracing::debug!(
                    stale = *epoch,
                    current = self.probe_epoch,
                    "Dropping stale session probe result"
                );
                return Vec::new();
            }
            _ => {}
        }

        let ctx = ResolveContext {
            oauth_return_path: &self.settings.oauth_return_path,
            admin_email_marker: &self.settings.admin_email_marker,
        };
        let Transition { mode, effects } =
            resolver::resolve(self.mode, &self.facts, &self.location, &event, &ctx);

        let mut commands = Vec::new();
        for effect in effects {
            match effect {
                Effect::ClearOauthArtifacts => {
                    if self.location.strip_oauth_artifacts() {
                        tracing::debug!(location = %self.location, "Stripped OAuth artifacts");
                    }
                }
                Effect::ResetPage => self.page = Page::default(),
                Effect::SignOut => commands.push(Command::SignOut),
                Effect::ProbeSession => {
                    self.probe_epoch += 1;
                    commands.push(Command::ProbeSession {
                        epoch: self.probe_epoch,
                    });
                }
            }
        }

        self.set_mode(mode);
        commands
    }

    /// Fire due timers. Call regularly from the event loop.
    pub fn tick(&mut self) -> Vec<Command> {
        if self.watchdog.fire_if_due() {
            self.apply(SessionEvent::WatchdogFired)
        } else {
            Vec::new()
        }
    }

    fn set_mode(&mut self, next: ViewMode) {
        if next == self.mode {
            return;
        }
        tracing::info!(from = self.mode.label(), to = next.label(), "View mode change");

        if self.mode == ViewMode::Callback {
            // Leaving callback: cancel the timer and invalidate any probe
            // still in flight.
            self.watchdog.cancel();
            self.probe_epoch += 1;
        }
        if next == ViewMode::Callback {
            self.watchdog.arm();
        }
        self.mode = next;
    }
}
