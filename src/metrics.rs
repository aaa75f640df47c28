use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Views,
    #[default]
    Likes,
    Reposts,
    Replies,
    Bookmarks,
}

impl EngagementKind {
    pub const ALL: [EngagementKind; 5] = [
        EngagementKind::Views,
        EngagementKind::Likes,
        EngagementKind::Reposts,
        EngagementKind::Replies,
        EngagementKind::Bookmarks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Views => "views",
            EngagementKind::Likes => "likes",
            EngagementKind::Reposts => "reposts",
            EngagementKind::Replies => "replies",
            EngagementKind::Bookmarks => "bookmarks",
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown engagement type {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for EngagementKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        EngagementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownKind(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub bookmarks: u64,
}

impl EngagementMetrics {
    pub fn get(&self, kind: EngagementKind) -> u64 {
        match kind {
            EngagementKind::Views => self.views,
            EngagementKind::Likes => self.likes,
            EngagementKind::Reposts => self.reposts,
            EngagementKind::Replies => self.replies,
            EngagementKind::Bookmarks => self.bookmarks,
        }
    }

    pub fn set(&mut self, kind: EngagementKind, count: u64) {
        match kind {
            EngagementKind::Views => self.views = count,
            EngagementKind::Likes => self.likes = count,
            EngagementKind::Reposts => self.reposts = count,
            EngagementKind::Replies => self.replies = count,
            EngagementKind::Bookmarks => self.bookmarks = count,
        }
    }
}

// `identity` may repeat within a batch when the document renders the same
// post twice, so anything keyed on it must compare by value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedItemRecord {
    pub identity: Option<String>,
    pub reply_target_id: Option<String>,
    pub age_minutes: f64,
    pub age_hours: f64,
    pub metrics: EngagementMetrics,
    pub qualifies: bool,
    pub should_highlight: bool,
}
