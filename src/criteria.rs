use crate::config::EngineConfig;
use crate::metrics::FeedItemRecord;

// Posts at most this old (in minutes) with at most this much engagement are
// too new to judge.
const YOUNG_POST_MINUTES: f64 = 5.0;
const YOUNG_POST_MIN_COUNT: u64 = 5;

// Rate denominator floor: one second, in minutes.
pub const MIN_MINUTES_ALIVE: f64 = 1.0 / 60.0;

pub fn qualifies(record: &FeedItemRecord, config: &EngineConfig) -> bool {
    if record.age_hours > config.max_hours() {
        return false;
    }

    let kind = config.engagement_type;
    let count = record.metrics.get(kind);

    if record.age_minutes <= YOUNG_POST_MINUTES && count <= YOUNG_POST_MIN_COUNT {
        return false;
    }

    let minutes_alive = record.age_minutes.max(MIN_MINUTES_ALIVE);
    let rate_per_minute = count as f64 / minutes_alive;
    let threshold_per_minute = config.threshold(kind) / 60.0;

    rate_per_minute >= threshold_per_minute
}
