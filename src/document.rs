use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub trait RenderedItem {
    fn datetime_annotations(&self) -> Vec<&str>;
    fn group_label(&self) -> Option<&str>;
    fn link_targets(&self) -> Vec<&str>;
    fn counter_labels(&self) -> Vec<&str>;
}

pub trait FeedDocument {
    type Item: RenderedItem;

    fn feed_items(&self) -> Vec<Self::Item>;

    fn set_marker(&mut self, item: &Self::Item, marker: Option<&str>);

    fn refresh(&mut self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labelled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl RenderedItem for FeedElement {
    fn datetime_annotations(&self) -> Vec<&str> {
        self.times.iter().map(String::as_str).collect()
    }

    fn group_label(&self) -> Option<&str> {
        self.labelled_by.as_deref()
    }

    fn link_targets(&self) -> Vec<&str> {
        self.links.iter().map(String::as_str).collect()
    }

    fn counter_labels(&self) -> Vec<&str> {
        self.groups.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub items: Vec<FeedElement>,
}

impl FeedSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("snapshot: read {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("snapshot: parse {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotItem {
    index: usize,
    element: FeedElement,
}

impl RenderedItem for SnapshotItem {
    fn datetime_annotations(&self) -> Vec<&str> {
        self.element.datetime_annotations()
    }

    fn group_label(&self) -> Option<&str> {
        self.element.group_label()
    }

    fn link_targets(&self) -> Vec<&str> {
        self.element.link_targets()
    }

    fn counter_labels(&self) -> Vec<&str> {
        self.element.counter_labels()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotDocument {
    snapshot: FeedSnapshot,
    source: Option<PathBuf>,
}

impl SnapshotDocument {
    pub fn new(snapshot: FeedSnapshot) -> Self {
        Self {
            snapshot,
            source: None,
        }
    }

    pub fn from_items(items: Vec<FeedElement>) -> Self {
        Self::new(FeedSnapshot {
            location: String::new(),
            items,
        })
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = FeedSnapshot::load(&path)?;
        Ok(Self {
            snapshot,
            source: Some(path),
        })
    }

    pub fn location(&self) -> &str {
        &self.snapshot.location
    }

    pub fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    pub fn elements(&self) -> &[FeedElement] {
        &self.snapshot.items
    }
}

impl FeedDocument for SnapshotDocument {
    type Item = SnapshotItem;

    fn feed_items(&self) -> Vec<SnapshotItem> {
        self.snapshot
            .items
            .iter()
            .enumerate()
            .map(|(index, element)| SnapshotItem {
                index,
                element: element.clone(),
            })
            .collect()
    }

    fn set_marker(&mut self, item: &SnapshotItem, marker: Option<&str>) {
        if let Some(element) = self.snapshot.items.get_mut(item.index) {
            element.background = marker.map(str::to_string);
        }
    }

    fn refresh(&mut self) {
        let Some(path) = self.source.as_ref() else {
            return;
        };
        match FeedSnapshot::load(path) {
            Ok(mut fresh) => {
                for (element, previous) in fresh.items.iter_mut().zip(&self.snapshot.items) {
                    if element.background.is_none() {
                        element.background = previous.background.clone();
                    }
                }
                self.snapshot = fresh;
            }
            Err(err) => log::warn!("keeping previous snapshot: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_snapshot_json() {
        let raw = r#"{
            "location": "https://x.com/home",
            "items": [
                {
                    "labelledBy": "id__abc",
                    "times": ["2026-10-16T12:00:00.000Z"],
                    "links": ["/someone/status/1846"],
                    "groups": ["9 replies, 7 reposts, 117 likes, 17 bookmarks, 2825 views"]
                },
                {}
            ]
        }"#;
        let snapshot: FeedSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.location, "https://x.com/home");
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].group_label(), Some("id__abc"));
        assert!(snapshot.items[1].counter_labels().is_empty());
    }

    #[test]
    fn markers_land_on_the_addressed_item() {
        let mut doc = SnapshotDocument::from_items(vec![FeedElement::default(); 3]);
        let items = doc.feed_items();
        doc.set_marker(&items[1], Some("gold"));
        assert_eq!(doc.elements()[1].background.as_deref(), Some("gold"));
        assert_eq!(doc.elements()[0].background, None);

        doc.set_marker(&items[1], None);
        assert_eq!(doc.elements()[1].background, None);
    }

    #[test]
    fn refresh_keeps_markers_and_survives_broken_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.json");
        fs::write(&path, r#"{"location": "/home", "items": [{}, {}]}"#).unwrap();

        let mut doc = SnapshotDocument::open(&path).unwrap();
        let items = doc.feed_items();
        doc.set_marker(&items[0], Some("lightgreen"));

        fs::write(&path, r#"{"location": "/home", "items": [{}, {}, {}]}"#).unwrap();
        doc.refresh();
        assert_eq!(doc.elements().len(), 3);
        assert_eq!(doc.elements()[0].background.as_deref(), Some("lightgreen"));

        fs::write(&path, "not json").unwrap();
        doc.refresh();
        assert_eq!(doc.elements().len(), 3);
    }
}
