use std::collections::HashSet;

use crate::metrics::FeedItemRecord;

// A record lights up when it qualifies itself, or when a qualifying record in
// the same batch replies to it. One hop only: being lit up by a reply does not
// make a record count as a qualifying reply for its own target.
pub fn propagate(records: &mut [FeedItemRecord]) {
    let targeted: HashSet<String> = records
        .iter()
        .filter(|record| record.qualifies)
        .filter_map(|record| record.reply_target_id.clone())
        .collect();

    for record in records.iter_mut() {
        let replied_to = record
            .identity
            .as_ref()
            .is_some_and(|identity| targeted.contains(identity));
        record.should_highlight = record.qualifies || replied_to;
    }
}
