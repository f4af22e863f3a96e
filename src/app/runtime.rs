//! The application runtime.
//!
//! A single-threaded cooperative loop: crossterm input is polled with a
//! timeout, collaborator updates arrive over std channels, timers are ticked
//! against the shared time source, and the screen re-renders. Async work
//! (sign-out, session probe, code exchange) runs on an owned tokio runtime;
//! results come back into the same event queue, so the coordinator stays the
//! single writer of all session state.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    poll as event_poll, read as event_read, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers,
};
use once_cell::sync::Lazy;
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::config::Config;
use crate::model::{Location, Page};
use crate::notify::{NotificationId, NotificationKind, NotificationQueue};
use crate::realtime::{ChangeEvent, ChangeKind, Owner, PushChannel, SubscriptionManager, Topic};
use crate::services::auth::{AuthGateway, FactsUpdate};
use crate::services::time_source::SharedTimeSource;
use crate::session::{Command, SessionCoordinator, SessionEvent, SessionSettings, ViewMode};
use crate::view;

/// How long the input poll blocks before the loop ticks timers anyway.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Human labels for the tables we notify about. Unknown tables fall back to
/// the raw table name.
static TABLE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("projects", "Project"),
        ("clients", "Client"),
        ("opportunities", "Opportunity"),
        ("team", "Team member"),
        ("finance", "Finance record"),
    ])
});

/// Everything the main loop can receive from outside the input poll.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Session(SessionEvent),
    Facts(FactsUpdate),
    Push(ChangeEvent),
}

pub struct App {
    config: Config,
    coordinator: SessionCoordinator,
    notifications: NotificationQueue,
    subscriptions: SubscriptionManager<Arc<dyn PushChannel>>,
    auth: Arc<dyn AuthGateway>,
    rt: tokio::runtime::Runtime,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    push_tx: Sender<ChangeEvent>,
    push_rx: Receiver<ChangeEvent>,
    /// Owner of the currently open notification feed, if any.
    feed_owner: Option<Owner>,
    /// Authorization code whose exchange is already in flight; guards
    /// against re-running the exchange on every re-render of the callback.
    exchange_in_flight: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        auth: Arc<dyn AuthGateway>,
        channel: Arc<dyn PushChannel>,
        time: SharedTimeSource,
    ) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("Failed to build async runtime")?;

        let settings = SessionSettings::from(&config.session);
        let coordinator = SessionCoordinator::new(settings, time.clone());
        let notifications = NotificationQueue::new(time.clone(), config.notifications.cap);
        let subscriptions = SubscriptionManager::new(channel);

        let (events_tx, events_rx) = std::sync::mpsc::channel();
        let (push_tx, push_rx) = std::sync::mpsc::channel();

        Ok(Self {
            config,
            coordinator,
            notifications,
            subscriptions,
            auth,
            rt,
            events_tx,
            events_rx,
            push_tx,
            push_rx,
            feed_owner: None,
            exchange_in_flight: None,
            should_quit: false,
        })
    }

    /// Sender for collaborator threads (facts watcher, tests).
    pub fn events_sender(&self) -> Sender<AppEvent> {
        self.events_tx.clone()
    }

    /// Deliver the initial deep-link activation, e.g. the OAuth redirect.
    pub fn activate(&mut self, route: &str) {
        self.dispatch(SessionEvent::NavigationChanged(Location::parse(route)));
    }

    // --- reads for the view layer -------------------------------------

    pub fn mode(&self) -> ViewMode {
        self.coordinator.mode()
    }

    pub fn page(&self) -> Page {
        self.coordinator.page()
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    // --- imperative actions exposed to the view layer ------------------

    pub fn request_logout(&mut self) {
        self.dispatch(SessionEvent::LogoutRequested);
    }

    pub fn request_page_change(&mut self, page: Page) {
        self.dispatch(SessionEvent::PageChangeRequested(page));
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) {
        self.notifications.dismiss(id);
    }

    // --- event plumbing -------------------------------------------------

    /// Apply everything queued by collaborator threads since the last call.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_app_event(event);
        }
    }

    /// Apply one external event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Session(event) => self.dispatch(event),
            AppEvent::Facts(update) => self.handle_facts(update),
            AppEvent::Push(event) => self.handle_push(event),
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let commands = self.coordinator.apply(event);
        self.run_commands(commands);
        self.after_transition();
    }

    /// Fire due timers. Called every loop iteration.
    pub fn tick(&mut self) {
        let commands = self.coordinator.tick();
        if !commands.is_empty() {
            self.run_commands(commands);
            self.after_transition();
        }
        self.notifications.tick();

        // Drain push events that arrived since the last iteration.
        while let Ok(event) = self.push_rx.try_recv() {
            self.handle_push(event);
        }
    }

    fn after_transition(&mut self) {
        self.sync_feed_subscriptions();
        self.maybe_start_callback_exchange();
    }

    fn run_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::SignOut => {
                    let auth = self.auth.clone();
                    // Fire and forget: failure is logged and swallowed, the
                    // mode is already login.
                    self.rt.spawn(async move {
                        if let Err(e) = auth.sign_out().await {
                            tracing::warn!("Sign-out failed: {e:#}");
                        }
                    });
                }
                Command::ProbeSession { epoch } => {
                    let auth = self.auth.clone();
                    let tx = self.events_tx.clone();
                    self.rt.spawn(async move {
                        // Any error counts as "no session".
                        let session = match auth.current_session().await {
                            Ok(session) => session,
                            Err(e) => {
                                tracing::warn!("Session probe failed: {e:#}");
                                None
                            }
                        };
                        let _ = tx.send(AppEvent::Session(SessionEvent::ProbeResolved {
                            epoch,
                            session,
                        }));
                    });
                }
            }
        }
    }

    /// Run the OAuth code exchange for the callback screen, once per code.
    fn maybe_start_callback_exchange(&mut self) {
        if self.coordinator.mode() != ViewMode::Callback {
            self.exchange_in_flight = None;
            return;
        }
        let Some(code) = self.coordinator.location().query_param("code") else {
            return;
        };
        if self.exchange_in_flight.as_deref() == Some(code) {
            return;
        }
        self.exchange_in_flight = Some(code.to_string());

        let auth = self.auth.clone();
        let tx = self.events_tx.clone();
        let code = code.to_string();
        self.rt.spawn(async move {
            match auth.complete_callback(&code).await {
                Ok(facts) => {
                    let _ = tx.send(AppEvent::Session(SessionEvent::CallbackSucceeded {
                        role: facts.role,
                        user: facts.user,
                    }));
                }
                Err(e) => {
                    // The watchdog bounds how long we stay stuck.
                    tracing::warn!("Callback exchange failed: {e:#}");
                }
            }
        });
    }

    /// Open/close notification feed subscriptions to match the current mode
    /// and signed-in user. The old owner is always released before new
    /// subscriptions are opened.
    fn sync_feed_subscriptions(&mut self) {
        let desired: Option<(Owner, Vec<Topic>)> = match self.coordinator.mode() {
            ViewMode::Admin => self.coordinator.current_user().map(|user| {
                (
                    Owner::scoped("admin-feed", &user.id),
                    vec![
                        Topic::inserts("opportunities"),
                        Topic::inserts("clients"),
                        Topic::updates("projects"),
                    ],
                )
            }),
            ViewMode::User => self.coordinator.current_user().map(|user| {
                (
                    Owner::scoped("user-feed", &user.id),
                    vec![Topic::updates("projects").owned_by("owner", &user.id)],
                )
            }),
            ViewMode::Login | ViewMode::Callback => None,
        };

        let desired_owner = desired.as_ref().map(|(owner, _)| owner.clone());
        if desired_owner == self.feed_owner {
            return;
        }

        if let Some(old) = self.feed_owner.take() {
            self.subscriptions.release_owner(&old);
        }
        if let Some((owner, topics)) = desired {
            for topic in topics {
                if let Err(e) = self.subscriptions.subscribe(&owner, &topic, self.push_tx.clone())
                {
                    tracing::warn!(topic = %topic.key(), "Subscribe failed: {e:#}");
                }
            }
            self.feed_owner = Some(owner);
        }
    }

    fn handle_facts(&mut self, update: FactsUpdate) {
        match update {
            FactsUpdate::Snapshot(facts) => self.dispatch(SessionEvent::FactsChanged(facts)),
            FactsUpdate::Unreachable(reason) => {
                self.notifications.push(
                    NotificationKind::Connectivity,
                    "Connection lost",
                    reason,
                    self.config.notifications.connectivity_ttl(),
                );
            }
            FactsUpdate::Restored => {
                self.notifications.push(
                    NotificationKind::Connectivity,
                    "Connection restored",
                    String::new(),
                    self.config.notifications.connectivity_ttl(),
                );
            }
        }
    }

    /// Normalize a raw change event into a notification entry.
    fn handle_push(&mut self, event: ChangeEvent) {
        let label = TABLE_LABELS
            .get(event.table.as_str())
            .copied()
            .unwrap_or(event.table.as_str());
        let (kind, title) = match event.kind {
            ChangeKind::Insert => (NotificationKind::Insert, format!("New {}", label.to_lowercase())),
            ChangeKind::Update => (NotificationKind::Update, format!("{label} updated")),
        };
        let message = event
            .row
            .get("name")
            .or_else(|| event.row.get("title"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| event.table.clone());

        self.notifications.push(
            kind,
            title,
            message,
            self.config.notifications.content_ttl(),
        );
    }

    // --- input ----------------------------------------------------------

    /// Handle a key press. Quitting is signalled through `should_quit`.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') if self.mode().is_authenticated() => self.request_logout(),
            KeyCode::Char('x') => {
                self.notifications.dismiss_front();
            }
            KeyCode::Char(c @ '1'..='6') if self.mode() == ViewMode::Admin => {
                if let Some(page) = Page::from_ordinal(c as usize - '0' as usize) {
                    self.request_page_change(page);
                }
            }
            _ => {}
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // --- main loop ------------------------------------------------------

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            self.drain_events();
            self.tick();

            terminal
                .draw(|frame| view::shell::render(frame, self))
                .context("Failed to draw frame")?;

            if event_poll(INPUT_POLL_INTERVAL)? {
                match event_read()? {
                    CrosstermEvent::Key(key) => self.handle_key(key),
                    CrosstermEvent::Resize(..) => {} // next draw picks it up
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
