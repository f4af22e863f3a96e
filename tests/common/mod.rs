// Common test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use vantage::model::{PersistedSession, Role, SessionFacts, UserInfo};
use vantage::realtime::{ChangeEvent, ChannelHandle, PushChannel, Topic};
use vantage::services::auth::AuthGateway;

pub fn user(id: &str, email: &str) -> UserInfo {
    UserInfo {
        id: id.to_string(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or("someone").to_string(),
    }
}

pub fn admin_facts(id: &str) -> SessionFacts {
    SessionFacts::signed_in(Role::Admin, user(id, &format!("{id}-admin@vantage.io")))
}

pub fn user_facts(id: &str) -> SessionFacts {
    SessionFacts::signed_in(Role::User, user(id, &format!("{id}@example.com")))
}

/// Scripted authentication collaborator. Responses are set up front; every
/// call is counted so tests can assert on traffic.
#[derive(Default)]
pub struct MockAuthGateway {
    pub persisted: Mutex<Option<PersistedSession>>,
    pub callback_facts: Mutex<Option<SessionFacts>>,
    pub sign_out_calls: AtomicUsize,
    pub session_reads: AtomicUsize,
}

impl MockAuthGateway {
    pub fn with_persisted(session: PersistedSession) -> Self {
        Self {
            persisted: Mutex::new(Some(session)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AuthGateway for MockAuthGateway {
    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<PersistedSession>> {
        self.session_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.persisted.lock().unwrap().clone())
    }

    async fn complete_callback(&self, _code: &str) -> Result<SessionFacts> {
        self.callback_facts
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("exchange not scripted"))
    }
}

/// Push channel that records opens and closes and hands the sinks back to
/// the test, so events can be injected by topic.
#[derive(Default)]
pub struct RecordingChannel {
    next_handle: AtomicU64,
    /// (handle, topic key) pairs still open.
    pub open: Mutex<Vec<(ChannelHandle, String)>>,
    pub closed: Mutex<Vec<String>>,
    sinks: Mutex<Vec<(String, Sender<ChangeEvent>)>>,
}

impl RecordingChannel {
    pub fn open_topic_keys(&self) -> Vec<String> {
        self.open.lock().unwrap().iter().map(|(_, k)| k.clone()).collect()
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    /// Deliver an event into the sink of the topic it matches, as the
    /// backend would.
    pub fn emit(&self, topic_key: &str, event: ChangeEvent) {
        let sinks = self.sinks.lock().unwrap();
        let (_, sink) = sinks
            .iter()
            .rev() // newest sink for the topic wins, as on the wire
            .find(|(key, _)| key == topic_key)
            .unwrap_or_else(|| panic!("no open sink for topic {topic_key}"));
        sink.send(event).expect("sink receiver dropped");
    }
}

impl PushChannel for RecordingChannel {
    fn open(&self, topic: &Topic, sink: Sender<ChangeEvent>) -> Result<ChannelHandle> {
        let handle = ChannelHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.open.lock().unwrap().push((handle, topic.key()));
        self.sinks.lock().unwrap().push((topic.key(), sink));
        Ok(handle)
    }

    fn close(&self, handle: ChannelHandle) {
        let mut open = self.open.lock().unwrap();
        if let Some(pos) = open.iter().position(|(h, _)| *h == handle) {
            let (_, key) = open.remove(pos);
            self.closed.lock().unwrap().push(key);
        }
    }
}
