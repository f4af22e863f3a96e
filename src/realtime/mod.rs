//! Real-time push-channel layer: event/topic types and the subscription
//! lifecycle manager.

pub mod event;
pub mod subscription;

pub use event::{ChangeEvent, ChangeKind, Topic, TopicFilter};
pub use subscription::{ChannelHandle, Owner, PushChannel, SubscriptionId, SubscriptionManager};
