use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::criteria;
use crate::document::FeedDocument;
use crate::extract;
use crate::highlight;
use crate::propagate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub scanned: usize,
    pub qualified: usize,
    pub highlighted: usize,
}

pub fn run_pass<D: FeedDocument>(
    doc: &mut D,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> PassSummary {
    let items = doc.feed_items();

    let mut records: Vec<_> = items
        .iter()
        .map(|item| {
            let mut record = extract::extract_record(item, now);
            record.qualifies = criteria::qualifies(&record, config);
            record
        })
        .collect();

    propagate::propagate(&mut records);
    highlight::apply(doc, &items, &records, config.highlight_color());

    let summary = PassSummary {
        scanned: records.len(),
        qualified: records.iter().filter(|r| r.qualifies).count(),
        highlighted: records.iter().filter(|r| r.should_highlight).count(),
    };
    log::debug!(
        "pass: scanned {} qualified {} highlighted {}",
        summary.scanned,
        summary.qualified,
        summary.highlighted
    );
    summary
}
