//! Push-channel subscription lifecycle.
//!
//! The manager owns every live channel resource. Exactly one subscription
//! may be live per (owner, topic) pair: subscribing again replaces the old
//! one (the prior resource is closed first, never stacked), unsubscribing is
//! idempotent, and releasing an owner tears down everything it holds. Events
//! flow straight from the channel into the sink in arrival order; no
//! reordering or coalescing happens here.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use anyhow::Result;

use crate::realtime::event::{ChangeEvent, Topic};

/// Opaque resource handed out by the push-channel collaborator. Only good
/// for closing the channel again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

/// The backend push-channel collaborator.
pub trait PushChannel: Send + Sync {
    /// Open a channel for `topic`, delivering events into `sink` in arrival
    /// order. The topic's filter is passed through unmodified.
    fn open(&self, topic: &Topic, sink: Sender<ChangeEvent>) -> Result<ChannelHandle>;

    /// Release the channel resource. Closing an unknown handle is a no-op.
    fn close(&self, handle: ChannelHandle);
}

impl<T: PushChannel + ?Sized> PushChannel for std::sync::Arc<T> {
    fn open(&self, topic: &Topic, sink: Sender<ChangeEvent>) -> Result<ChannelHandle> {
        (**self).open(topic, sink)
    }

    fn close(&self, handle: ChannelHandle) {
        (**self).close(handle)
    }
}

/// Identity of the logical consumer owning a subscription, e.g. the admin
/// feed fragment scoped to the signed-in user. When the scoping identity
/// changes, the old owner is released wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner(pub String);

impl Owner {
    pub fn scoped(fragment: &str, scope: &str) -> Self {
        Owner(format!("{fragment}:{scope}"))
    }
}

/// Handle used by consumers to tear down one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct LiveSubscription {
    owner: Owner,
    topic_key: String,
    handle: ChannelHandle,
}

/// Owns zero-or-more live push-channel subscriptions.
pub struct SubscriptionManager<C: PushChannel> {
    channel: C,
    live: HashMap<SubscriptionId, LiveSubscription>,
    by_key: HashMap<(Owner, String), SubscriptionId>,
    next_id: u64,
}

impl<C: PushChannel> SubscriptionManager<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            live: HashMap::new(),
            by_key: HashMap::new(),
            next_id: 0,
        }
    }

    /// Open a subscription for `owner` on `topic`. If one is already live
    /// for this pair it is torn down first; re-subscribing replaces, it
    /// never stacks.
    pub fn subscribe(
        &mut self,
        owner: &Owner,
        topic: &Topic,
        sink: Sender<ChangeEvent>,
    ) -> Result<SubscriptionId> {
        let key = (owner.clone(), topic.key());
        if let Some(existing) = self.by_key.get(&key).copied() {
            tracing::debug!(owner = %owner.0, topic = %topic.key(), "Replacing live subscription");
            self.unsubscribe(existing);
        }

        let handle = self.channel.open(topic, sink)?;
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.live.insert(
            id,
            LiveSubscription {
                owner: owner.clone(),
                topic_key: topic.key(),
                handle,
            },
        );
        self.by_key.insert(key, id);
        tracing::debug!(owner = %owner.0, topic = %topic.key(), "Subscription opened");
        Ok(id)
    }

    /// Release one subscription. Safe to call repeatedly; the second call is
    /// a no-op, not an error.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some(sub) = self.live.remove(&id) {
            self.by_key.remove(&(sub.owner.clone(), sub.topic_key.clone()));
            self.channel.close(sub.handle);
            tracing::debug!(owner = %sub.owner.0, topic = %sub.topic_key, "Subscription closed");
        }
    }

    /// Tear down every subscription held by `owner`. Used on unmount and on
    /// scoping-identity change, before any new subscriptions are opened.
    pub fn release_owner(&mut self, owner: &Owner) {
        let ids: Vec<SubscriptionId> = self
            .live
            .iter()
            .filter(|(_, sub)| &sub.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.unsubscribe(id);
        }
    }

    pub fn is_live(&self, owner: &Owner, topic: &Topic) -> bool {
        self.by_key.contains_key(&(owner.clone(), topic.key()))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl<C: PushChannel> Drop for SubscriptionManager<C> {
    fn drop(&mut self) {
        let ids: Vec<SubscriptionId> = self.live.keys().copied().collect();
        for id in ids {
            self.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc::channel;
    use std::sync::{Arc, Mutex};

    /// Records open/close calls; events are pushed manually by tests.
    #[derive(Default)]
    struct RecordingChannel {
        next_handle: AtomicU64,
        open_handles: Arc<Mutex<Vec<ChannelHandle>>>,
        closed: Arc<Mutex<Vec<ChannelHandle>>>,
    }

    impl PushChannel for RecordingChannel {
        fn open(&self, _topic: &Topic, _sink: Sender<ChangeEvent>) -> Result<ChannelHandle> {
            let handle = ChannelHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
            self.open_handles.lock().unwrap().push(handle);
            Ok(handle)
        }

        fn close(&self, handle: ChannelHandle) {
            self.open_handles.lock().unwrap().retain(|h| *h != handle);
            self.closed.lock().unwrap().push(handle);
        }
    }

    fn manager() -> (
        SubscriptionManager<RecordingChannel>,
        Arc<Mutex<Vec<ChannelHandle>>>,
        Arc<Mutex<Vec<ChannelHandle>>>,
    ) {
        let channel = RecordingChannel::default();
        let open = channel.open_handles.clone();
        let closed = channel.closed.clone();
        (SubscriptionManager::new(channel), open, closed)
    }

    #[test]
    fn resubscribe_replaces_not_stacks() {
        let (mut m, open, closed) = manager();
        let owner = Owner::scoped("admin-feed", "u-1");
        let topic = Topic::inserts("opportunities");
        let (tx, _rx) = channel();

        let first = m.subscribe(&owner, &topic, tx.clone()).unwrap();
        let second = m.subscribe(&owner, &topic, tx).unwrap();

        assert_ne!(first, second);
        assert_eq!(open.lock().unwrap().len(), 1, "exactly one live channel");
        assert_eq!(closed.lock().unwrap().len(), 1, "first resource released");
        assert_eq!(m.live_count(), 1);
    }

    #[test]
    fn same_topic_different_owner_coexists() {
        let (mut m, open, _closed) = manager();
        let topic = Topic::inserts("opportunities");
        let (tx, _rx) = channel();

        m.subscribe(&Owner::scoped("admin-feed", "u-1"), &topic, tx.clone())
            .unwrap();
        m.subscribe(&Owner::scoped("admin-feed", "u-2"), &topic, tx)
            .unwrap();

        assert_eq!(open.lock().unwrap().len(), 2);
    }

    #[test]
    fn unsubscribe_twice_is_a_noop() {
        let (mut m, _open, closed) = manager();
        let owner = Owner::scoped("user-feed", "u-1");
        let (tx, _rx) = channel();
        let id = m.subscribe(&owner, &Topic::updates("projects"), tx).unwrap();

        m.unsubscribe(id);
        m.unsubscribe(id);

        assert_eq!(closed.lock().unwrap().len(), 1);
        assert_eq!(m.live_count(), 0);
    }

    #[test]
    fn release_owner_tears_down_everything_it_holds() {
        let (mut m, open, _closed) = manager();
        let mine = Owner::scoped("admin-feed", "u-1");
        let theirs = Owner::scoped("admin-feed", "u-2");
        let (tx, _rx) = channel();

        m.subscribe(&mine, &Topic::inserts("opportunities"), tx.clone())
            .unwrap();
        m.subscribe(&mine, &Topic::inserts("clients"), tx.clone()).unwrap();
        m.subscribe(&theirs, &Topic::inserts("opportunities"), tx).unwrap();

        m.release_owner(&mine);

        assert_eq!(m.live_count(), 1);
        assert_eq!(open.lock().unwrap().len(), 1);
        assert!(m.is_live(&theirs, &Topic::inserts("opportunities")));
    }

    #[test]
    fn drop_releases_all_channels() {
        let (mut m, open, _closed) = manager();
        let (tx, _rx) = channel();
        m.subscribe(&Owner::scoped("f", "a"), &Topic::inserts("projects"), tx.clone())
            .unwrap();
        m.subscribe(&Owner::scoped("f", "b"), &Topic::inserts("clients"), tx)
            .unwrap();

        drop(m);
        assert!(open.lock().unwrap().is_empty());
    }

    #[test]
    fn filters_are_owner_scoped_topics() {
        let (mut m, open, _closed) = manager();
        let owner = Owner::scoped("user-feed", "u-1");
        let (tx, _rx) = channel();

        // Same table and kind, different filter: distinct topics.
        m.subscribe(
            &owner,
            &Topic::updates("projects").owned_by("owner", "u-1"),
            tx.clone(),
        )
        .unwrap();
        m.subscribe(
            &owner,
            &Topic::updates("projects").owned_by("owner", "u-2"),
            tx,
        )
        .unwrap();

        assert_eq!(open.lock().unwrap().len(), 2);
    }
}
