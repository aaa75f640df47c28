use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::RenderedItem;
use crate::metrics::{EngagementKind, EngagementMetrics, FeedItemRecord};

static STATUS_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/status/([^/?#\s]+)").expect("valid status link regex"));

static COUNTER_RES: Lazy<[(EngagementKind, Regex); 5]> = Lazy::new(|| {
    let counter = |pattern: &str| {
        Regex::new(&format!(r"(?i)(\d[\d,]*)\s*{pattern}")).expect("valid counter regex")
    };
    [
        (EngagementKind::Replies, counter(r"repl(?:y|ies)")),
        (EngagementKind::Reposts, counter("repost")),
        (EngagementKind::Likes, counter("like")),
        (EngagementKind::Bookmarks, counter("bookmark")),
        (EngagementKind::Views, counter("view")),
    ]
});

pub fn extract_record<I: RenderedItem + ?Sized>(item: &I, now: DateTime<Utc>) -> FeedItemRecord {
    let age_ms = published_at(item)
        .map(|published| (now - published).num_milliseconds().max(0))
        .unwrap_or(0) as f64;

    FeedItemRecord {
        identity: item.group_label().map(str::to_string),
        reply_target_id: reply_target(item),
        age_minutes: age_ms / 60_000.0,
        age_hours: age_ms / 3_600_000.0,
        metrics: engagement(item),
        ..FeedItemRecord::default()
    }
}

fn published_at<I: RenderedItem + ?Sized>(item: &I) -> Option<DateTime<Utc>> {
    item.datetime_annotations()
        .into_iter()
        .find_map(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn reply_target<I: RenderedItem + ?Sized>(item: &I) -> Option<String> {
    item.link_targets()
        .into_iter()
        .find_map(|href| STATUS_LINK_RE.captures(href))
        .map(|caps| caps[1].to_string())
}

fn engagement<I: RenderedItem + ?Sized>(item: &I) -> EngagementMetrics {
    item.counter_labels()
        .into_iter()
        .find(|label| label.contains("likes"))
        .map(parse_counter_label)
        .unwrap_or_default()
}

pub fn parse_counter_label(label: &str) -> EngagementMetrics {
    let mut metrics = EngagementMetrics::default();
    for (kind, re) in COUNTER_RES.iter() {
        let count = re
            .captures(label)
            .and_then(|caps| caps[1].replace(',', "").parse::<u64>().ok())
            .unwrap_or(0);
        metrics.set(*kind, count);
    }
    metrics
}
