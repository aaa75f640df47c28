#![allow(clippy::uninlined_format_args)]

pub mod command;
pub mod config;
pub mod criteria;
pub mod document;
pub mod engine;
pub mod extract;
pub mod highlight;
pub mod metrics;
pub mod navigation;
pub mod propagate;
pub mod scan;
pub mod scheduler;
pub mod update;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use command::{Command, Response};
pub use config::{ConfigStore, EngineConfig, PartialConfig};
pub use engine::{Engine, EngineHandle};
pub use metrics::{EngagementKind, EngagementMetrics, FeedItemRecord};
pub use scheduler::{LifecycleState, Scheduler};
