use crate::document::FeedDocument;
use crate::metrics::FeedItemRecord;

pub fn apply<D: FeedDocument>(
    doc: &mut D,
    items: &[D::Item],
    records: &[FeedItemRecord],
    color: &str,
) {
    for (item, record) in items.iter().zip(records) {
        let marker = record.should_highlight.then_some(color);
        doc.set_marker(item, marker);
    }
}

pub fn clear_all<D: FeedDocument>(doc: &mut D) {
    for item in doc.feed_items() {
        doc.set_marker(&item, None);
    }
}
