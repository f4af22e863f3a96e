//! Authentication collaborator gateway.
//!
//! Two access paths, matching the collaborator's contract:
//! - a reactive one: a watcher thread polls the facts accessor and delivers
//!   whole `SessionFacts` snapshots over a channel;
//! - a direct one: `current_session` reads the persisted session, bypassing
//!   reactive propagation. Only the callback watchdog uses it.
//!
//! The gateway trait is async; the HTTP implementation wraps blocking ureq
//! calls in `spawn_blocking` on the runtime's tokio executor.

use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::{PersistedSession, SessionFacts};

/// Async boundary to the authentication collaborator.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Invalidate the session server-side. The caller treats failure as
    /// logged-and-swallowed; the view is forced to login regardless.
    async fn sign_out(&self) -> Result<()>;

    /// Direct persisted-session read, bypassing the reactive facts.
    async fn current_session(&self) -> Result<Option<PersistedSession>>;

    /// Run the OAuth code exchange for the callback screen. On success the
    /// returned facts carry the resolved role and account.
    async fn complete_callback(&self, code: &str) -> Result<SessionFacts>;
}

/// HTTP implementation over the portal backend.
pub struct HttpAuthGateway {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpAuthGateway {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(request_timeout).build(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_out(&self) -> Result<()> {
        let agent = self.agent.clone();
        let url = self.url("/auth/signout");
        tokio::task::spawn_blocking(move || {
            agent
                .post(&url)
                .call()
                .context("Sign-out request failed")?;
            Ok(())
        })
        .await
        .context("Sign-out task aborted")?
    }

    async fn current_session(&self) -> Result<Option<PersistedSession>> {
        let agent = self.agent.clone();
        let url = self.url("/auth/session");
        tokio::task::spawn_blocking(move || match agent.get(&url).call() {
            Ok(response) if response.status() == 204 => Ok(None),
            Ok(response) => {
                let session: PersistedSession = response
                    .into_json()
                    .context("Malformed persisted session payload")?;
                Ok(Some(session))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(e).context("Session read failed"),
        })
        .await
        .context("Session read task aborted")?
    }

    async fn complete_callback(&self, code: &str) -> Result<SessionFacts> {
        let agent = self.agent.clone();
        let url = self.url("/auth/callback");
        let body = serde_json::json!({ "code": code });
        tokio::task::spawn_blocking(move || {
            let response = agent
                .post(&url)
                .send_json(body)
                .context("Callback exchange failed")?;
            response
                .into_json()
                .context("Malformed callback exchange payload")
        })
        .await
        .context("Callback exchange task aborted")?
    }
}

/// What the facts watcher delivers to the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FactsUpdate {
    /// A fresh snapshot from the reactive accessor.
    Snapshot(SessionFacts),
    /// The accessor became unreachable (sent once per outage, not per poll).
    Unreachable(String),
    /// The accessor became reachable again after an outage.
    Restored,
}

fn fetch_facts(agent: &ureq::Agent, base_url: &str) -> Result<SessionFacts> {
    let url = format!("{}/auth/facts", base_url.trim_end_matches('/'));
    let facts: SessionFacts = agent
        .get(&url)
        .call()
        .context("Facts request failed")?
        .into_json()
        .context("Malformed facts payload")?;
    Ok(facts)
}

/// Spawn the reactive facts watcher. Polls the accessor on `interval` and
/// sends updates until the receiving side hangs up.
pub fn spawn_facts_watcher(
    base_url: String,
    interval: Duration,
    request_timeout: Duration,
    tx: Sender<FactsUpdate>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let agent = ureq::AgentBuilder::new().timeout(request_timeout).build();
        let mut reachable = true;
        loop {
            let update = match fetch_facts(&agent, &base_url) {
                Ok(facts) => {
                    let restored = !reachable;
                    reachable = true;
                    if restored {
                        // Announce the recovery first so the connectivity
                        // notice precedes the snapshot it unblocks.
                        if tx.send(FactsUpdate::Restored).is_err() {
                            return;
                        }
                    }
                    FactsUpdate::Snapshot(facts)
                }
                Err(e) if reachable => {
                    reachable = false;
                    tracing::warn!("Facts accessor unreachable: {e:#}");
                    FactsUpdate::Unreachable(format!("{e:#}"))
                }
                Err(e) => {
                    tracing::debug!("Facts accessor still unreachable: {e:#}");
                    std::thread::sleep(interval);
                    continue;
                }
            };
            if tx.send(update).is_err() {
                return; // main loop is gone
            }
            std::thread::sleep(interval);
        }
    })
}
