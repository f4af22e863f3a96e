//! HTTP push-channel client.
//!
//! Implements [`PushChannel`] over the backend's streaming endpoint. Each
//! open topic gets its own reader thread consuming an SSE-style body
//! (`data: {json}` lines) and forwarding events into the sink in arrival
//! order. Closing sets a stop flag; the reader notices it at the next
//! delivered line or reconnect attempt and exits.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::realtime::event::{ChangeEvent, Topic};
use crate::realtime::subscription::{ChannelHandle, PushChannel};

/// Delay before re-opening a dropped stream.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

pub struct HttpPushChannel {
    agent: ureq::Agent,
    base_url: String,
    next_handle: AtomicU64,
    stops: Mutex<HashMap<u64, Arc<AtomicBool>>>,
}

impl HttpPushChannel {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            // Read timeout only; the stream itself stays open indefinitely.
            agent: ureq::AgentBuilder::new()
                .timeout_connect(request_timeout)
                .build(),
            base_url: base_url.into(),
            next_handle: AtomicU64::new(1),
            stops: Mutex::new(HashMap::new()),
        }
    }

    fn stream_url(&self, topic: &Topic) -> String {
        let mut url = format!(
            "{}/realtime/{}?event={}",
            self.base_url.trim_end_matches('/'),
            topic.table,
            topic.kind.as_str()
        );
        if let Some(filter) = &topic.filter {
            // Scoping filter is forwarded verbatim; the server applies it.
            url.push_str(&format!("&{}={}", filter.column, filter.value));
        }
        url
    }
}

impl PushChannel for HttpPushChannel {
    fn open(&self, topic: &Topic, sink: Sender<ChangeEvent>) -> Result<ChannelHandle> {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let stop = Arc::new(AtomicBool::new(false));
        self.stops
            .lock()
            .expect("push channel stop map poisoned")
            .insert(id, stop.clone());

        let agent = self.agent.clone();
        let url = self.stream_url(topic);
        let topic_key = topic.key();
        std::thread::spawn(move || {
            tracing::info!(topic = %topic_key, "Push channel opened");
            while !stop.load(Ordering::SeqCst) {
                match agent.get(&url).call() {
                    Ok(response) => {
                        let reader = std::io::BufReader::new(response.into_reader());
                        for line in reader.lines() {
                            if stop.load(Ordering::SeqCst) {
                                break;
                            }
                            let line = match line {
                                Ok(line) => line,
                                Err(e) => {
                                    tracing::debug!(topic = %topic_key, "Stream read error: {e}");
                                    break;
                                }
                            };
                            let Some(payload) = line.strip_prefix("data:") else {
                                continue; // keep-alives, comments
                            };
                            match serde_json::from_str::<ChangeEvent>(payload.trim()) {
                                Ok(event) => {
                                    if sink.send(event).is_err() {
                                        return; // consumer is gone
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(topic = %topic_key, "Skipping malformed push event: {e}");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(topic = %topic_key, "Push channel connect failed: {e}");
                    }
                }
                if !stop.load(Ordering::SeqCst) {
                    std::thread::sleep(RECONNECT_DELAY);
                }
            }
            tracing::info!(topic = %topic_key, "Push channel reader exiting");
        });

        Ok(ChannelHandle(id))
    }

    fn close(&self, handle: ChannelHandle) {
        if let Some(stop) = self
            .stops
            .lock()
            .expect("push channel stop map poisoned")
            .remove(&handle.0)
        {
            stop.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::event::ChangeKind;

    #[test]
    fn stream_url_includes_topic_and_filter() {
        let channel = HttpPushChannel::new("http://localhost:9000/", Duration::from_secs(5));
        assert_eq!(
            channel.stream_url(&Topic::inserts("opportunities")),
            "http://localhost:9000/realtime/opportunities?event=insert"
        );
        assert_eq!(
            channel.stream_url(&Topic::updates("projects").owned_by("owner", "u-1")),
            "http://localhost:9000/realtime/projects?event=update&owner=u-1"
        );
    }

    #[test]
    fn close_unknown_handle_is_a_noop() {
        let channel = HttpPushChannel::new("http://localhost:9000", Duration::from_secs(5));
        channel.close(ChannelHandle(42));
    }

    #[test]
    fn data_line_shape_parses() {
        let raw = r#"data: {"eventType": "update", "table": "projects", "row": {"id": 3}}"#;
        let payload = raw.strip_prefix("data:").unwrap().trim();
        let event: ChangeEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
    }
}
