use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::Receiver;
use log::{debug, info};
use serde::Serialize;

use crate::config::{EngineConfig, PartialConfig};
use crate::document::FeedDocument;
use crate::highlight;
use crate::scan::{self, PassSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    #[default]
    Stopped,
    Active,
}

// Repeating pass timer. Dropping it cancels it: nothing fires once the
// receiver is gone.
#[derive(Debug)]
pub(crate) struct RepeatingTimer {
    period: Duration,
    ticks: Receiver<Instant>,
}

impl RepeatingTimer {
    fn start(period: Duration) -> Self {
        Self {
            period,
            ticks: crossbeam_channel::tick(period),
        }
    }
}

pub struct Scheduler<D: FeedDocument> {
    doc: D,
    config: EngineConfig,
    timer: Option<RepeatingTimer>,
    passes: u64,
}

impl<D: FeedDocument> Scheduler<D> {
    pub fn new(doc: D, config: EngineConfig) -> Self {
        Self {
            doc,
            config,
            timer: None,
            passes: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        if self.timer.is_some() {
            LifecycleState::Active
        } else {
            LifecycleState::Stopped
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    #[cfg(test)]
    fn cadence(&self) -> Option<Duration> {
        self.timer.as_ref().map(|timer| timer.period)
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn start(&mut self) -> PassSummary {
        self.timer = None;
        let summary = self.run_pass();
        let period = self.config.interval();
        self.timer = Some(RepeatingTimer::start(period));
        info!(
            "highlighting started, every {}",
            humantime::format_duration(period)
        );
        summary
    }

    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            info!("highlighting stopped");
        }
        self.doc.refresh();
        highlight::clear_all(&mut self.doc);
    }

    pub fn update_config(&mut self, partial: &PartialConfig) {
        self.config.merge(partial);
        if self.is_active() {
            self.stop();
            self.start();
        } else {
            debug!("config updated while stopped");
        }
    }

    pub fn tick(&mut self) -> Option<PassSummary> {
        if self.is_active() {
            Some(self.run_pass())
        } else {
            None
        }
    }

    pub(crate) fn ticker(&self) -> Option<&Receiver<Instant>> {
        self.timer.as_ref().map(|timer| &timer.ticks)
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    fn run_pass(&mut self) -> PassSummary {
        self.doc.refresh();
        self.passes += 1;
        scan::run_pass(&mut self.doc, &self.config, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FeedElement, SnapshotDocument};
    use chrono::Duration as ChronoDuration;

    fn trending_doc() -> SnapshotDocument {
        SnapshotDocument::from_items(vec![
            FeedElement {
                labelled_by: Some("hot".into()),
                times: vec![(Utc::now() - ChronoDuration::minutes(30)).to_rfc3339()],
                groups: vec!["50 likes".into()],
                ..FeedElement::default()
            },
            FeedElement {
                labelled_by: Some("cold".into()),
                times: vec![(Utc::now() - ChronoDuration::minutes(30)).to_rfc3339()],
                groups: vec!["1 likes".into()],
                background: Some("stale".into()),
                ..FeedElement::default()
            },
        ])
    }

    fn marks(scheduler: &Scheduler<SnapshotDocument>) -> Vec<Option<String>> {
        scheduler
            .document()
            .elements()
            .iter()
            .map(|e| e.background.clone())
            .collect()
    }

    #[test]
    fn starts_stopped() {
        let scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        assert_eq!(scheduler.state(), LifecycleState::Stopped);
        assert_eq!(scheduler.cadence(), None);
        assert_eq!(scheduler.passes(), 0);
    }

    #[test]
    fn start_runs_a_pass_immediately() {
        let mut scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        let summary = scheduler.start();
        assert_eq!(summary.highlighted, 1);
        assert_eq!(scheduler.state(), LifecycleState::Active);
        assert_eq!(scheduler.cadence(), Some(Duration::from_millis(3000)));
        assert_eq!(marks(&scheduler), vec![Some("lightgreen".into()), None]);
    }

    #[test]
    fn starting_twice_keeps_a_single_timer() {
        let mut scheduler = Scheduler::new(
            trending_doc(),
            EngineConfig {
                frequency: 10_000,
                ..EngineConfig::default()
            },
        );
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.passes(), 2);
        assert!(scheduler.ticker().is_some());
        // a fresh timer has not fired yet
        assert!(scheduler.ticker().unwrap().try_recv().is_err());
    }

    #[test]
    fn stop_clears_markers_even_when_already_stopped() {
        let mut scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        scheduler.stop();
        assert_eq!(scheduler.state(), LifecycleState::Stopped);
        assert_eq!(marks(&scheduler), vec![None, None]);

        scheduler.start();
        scheduler.stop();
        assert!(scheduler.ticker().is_none());
        assert_eq!(marks(&scheduler), vec![None, None]);
    }

    #[test]
    fn tick_is_inert_while_stopped() {
        let mut scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        assert_eq!(scheduler.tick(), None);
        assert_eq!(scheduler.passes(), 0);

        scheduler.start();
        assert!(scheduler.tick().is_some());
        assert_eq!(scheduler.passes(), 2);
    }

    #[test]
    fn update_while_stopped_only_stores_config() {
        let mut scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        scheduler.update_config(&PartialConfig {
            frequency: Some(500.0),
            ..PartialConfig::default()
        });
        assert_eq!(scheduler.config().frequency, 500);
        assert_eq!(scheduler.passes(), 0);
        assert_eq!(scheduler.state(), LifecycleState::Stopped);
    }

    #[test]
    fn update_while_active_restarts_with_new_config() {
        let mut scheduler = Scheduler::new(trending_doc(), EngineConfig::default());
        scheduler.start();
        scheduler.update_config(&PartialConfig {
            frequency: Some(1500.0),
            highlight_color: Some("gold".into()),
            ..PartialConfig::default()
        });
        assert_eq!(scheduler.passes(), 2);
        assert_eq!(scheduler.cadence(), Some(Duration::from_millis(1500)));
        assert_eq!(marks(&scheduler), vec![Some("gold".into()), None]);
    }
}
