use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hashtag {
    pub id: Uuid,
    pub name: String,
    pub post_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Lookup key: stored names are lowercase and carry no leading `#`.
pub fn normalize_tag(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}
