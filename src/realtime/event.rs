//! Push-channel event and topic types.
//!
//! Rows are opaque payloads; only the table name and change kind matter to
//! this layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of change carried by a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
        }
    }
}

/// A raw change event as delivered by the backend collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(rename = "eventType")]
    pub kind: ChangeKind,
    pub table: String,
    /// Opaque record payload.
    pub row: Value,
}

/// Server-side filter for a topic, e.g. "rows whose owner column equals the
/// signed-in user". Applied by the collaborator; this layer passes it
/// through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter {
    pub column: String,
    pub value: String,
}

/// A named scope of push events: table + change kind + optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub table: String,
    pub kind: ChangeKind,
    pub filter: Option<TopicFilter>,
}

impl Topic {
    pub fn inserts(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: ChangeKind::Insert,
            filter: None,
        }
    }

    pub fn updates(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: ChangeKind::Update,
            filter: None,
        }
    }

    pub fn owned_by(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(TopicFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Stable identity string, used as the dedup key per owner.
    pub fn key(&self) -> String {
        match &self.filter {
            Some(f) => format!("{}:{}:{}={}", self.table, self.kind.as_str(), f.column, f.value),
            None => format!("{}:{}", self.table, self.kind.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_keys_distinguish_kind_and_filter() {
        assert_eq!(Topic::inserts("projects").key(), "projects:insert");
        assert_eq!(Topic::updates("projects").key(), "projects:update");
        assert_eq!(
            Topic::updates("projects").owned_by("owner", "u-1").key(),
            "projects:update:owner=u-1"
        );
        assert_ne!(
            Topic::updates("projects").owned_by("owner", "u-1").key(),
            Topic::updates("projects").owned_by("owner", "u-2").key()
        );
    }

    #[test]
    fn change_event_deserializes_wire_shape() {
        let event: ChangeEvent = serde_json::from_str(
            r#"{"eventType": "insert", "table": "opportunities", "row": {"id": 7, "name": "Acme"}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.table, "opportunities");
        assert_eq!(event.row["name"], "Acme");
    }
}
