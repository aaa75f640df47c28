use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Deserializer, Serialize};

use crate::metrics::EngagementKind;

const DEFAULT_ENV_PREFIX: &str = "XRAYFEED";

pub const DEFAULT_FREQUENCY_MS: u64 = 3000;
pub const DEFAULT_MAX_HOURS: f64 = 3.0;
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "lightgreen";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_frequency")]
    pub frequency: u64,
    #[serde(default = "default_max_hours")]
    pub max_hours: f64,
    #[serde(default)]
    pub engagement_type: EngagementKind,
    #[serde(default)]
    pub engagement_thresholds: EngagementThresholds,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            max_hours: default_max_hours(),
            engagement_type: EngagementKind::default(),
            engagement_thresholds: EngagementThresholds::default(),
            highlight_color: default_highlight_color(),
            is_active: false,
        }
    }
}

fn default_frequency() -> u64 {
    DEFAULT_FREQUENCY_MS
}

fn default_max_hours() -> f64 {
    DEFAULT_MAX_HOURS
}

fn default_highlight_color() -> String {
    DEFAULT_HIGHLIGHT_COLOR.to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngagementThresholds {
    #[serde(default = "default_views_threshold")]
    pub views: f64,
    #[serde(default = "default_likes_threshold")]
    pub likes: f64,
    #[serde(default = "default_reposts_threshold")]
    pub reposts: f64,
    #[serde(default = "default_replies_threshold")]
    pub replies: f64,
    #[serde(default = "default_bookmarks_threshold")]
    pub bookmarks: f64,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        Self {
            views: default_views_threshold(),
            likes: default_likes_threshold(),
            reposts: default_reposts_threshold(),
            replies: default_replies_threshold(),
            bookmarks: default_bookmarks_threshold(),
        }
    }
}

fn default_views_threshold() -> f64 {
    600.0
}

fn default_likes_threshold() -> f64 {
    12.0
}

fn default_reposts_threshold() -> f64 {
    3.0
}

fn default_replies_threshold() -> f64 {
    3.0
}

fn default_bookmarks_threshold() -> f64 {
    3.0
}

pub fn default_threshold(kind: EngagementKind) -> f64 {
    match kind {
        EngagementKind::Views => default_views_threshold(),
        EngagementKind::Likes => default_likes_threshold(),
        EngagementKind::Reposts => default_reposts_threshold(),
        EngagementKind::Replies => default_replies_threshold(),
        EngagementKind::Bookmarks => default_bookmarks_threshold(),
    }
}

impl EngagementThresholds {
    pub fn get(&self, kind: EngagementKind) -> f64 {
        let raw = match kind {
            EngagementKind::Views => self.views,
            EngagementKind::Likes => self.likes,
            EngagementKind::Reposts => self.reposts,
            EngagementKind::Replies => self.replies,
            EngagementKind::Bookmarks => self.bookmarks,
        };
        positive_or(raw, default_threshold(kind))
    }

    pub fn set(&mut self, kind: EngagementKind, per_hour: f64) {
        let value = positive_or(per_hour, default_threshold(kind));
        match kind {
            EngagementKind::Views => self.views = value,
            EngagementKind::Likes => self.likes = value,
            EngagementKind::Reposts => self.reposts = value,
            EngagementKind::Replies => self.replies = value,
            EngagementKind::Bookmarks => self.bookmarks = value,
        }
    }
}

impl EngineConfig {
    pub fn interval(&self) -> Duration {
        let ms = if self.frequency == 0 {
            DEFAULT_FREQUENCY_MS
        } else {
            self.frequency
        };
        Duration::from_millis(ms)
    }

    pub fn max_hours(&self) -> f64 {
        positive_or(self.max_hours, DEFAULT_MAX_HOURS)
    }

    pub fn threshold(&self, kind: EngagementKind) -> f64 {
        self.engagement_thresholds.get(kind)
    }

    pub fn highlight_color(&self) -> &str {
        let color = self.highlight_color.trim();
        if color.is_empty() {
            DEFAULT_HIGHLIGHT_COLOR
        } else {
            color
        }
    }

    pub fn merge(&mut self, partial: &PartialConfig) {
        if let Some(frequency) = partial.frequency {
            self.frequency = sanitize_frequency(frequency);
        }
        if let Some(max_hours) = partial.max_hours {
            self.max_hours = positive_or(max_hours, DEFAULT_MAX_HOURS);
        }
        if let Some(kind) = partial.engagement_type {
            self.engagement_type = kind;
        }
        if let Some(thresholds) = partial.engagement_thresholds.as_ref() {
            for kind in EngagementKind::ALL {
                if let Some(value) = thresholds.get(kind) {
                    self.engagement_thresholds.set(kind, value);
                }
            }
        }
        if let Some(color) = partial.highlight_color.as_ref() {
            let color = color.trim();
            self.highlight_color = if color.is_empty() {
                default_highlight_color()
            } else {
                color.to_string()
            };
        }
        if let Some(active) = partial.is_active {
            self.is_active = active;
        }
    }

    pub fn merged(mut self, partial: &PartialConfig) -> Self {
        self.merge(partial);
        self
    }

    pub fn from_partial(partial: &PartialConfig) -> Self {
        Self::default().merged(partial)
    }
}

fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

fn sanitize_frequency(value: f64) -> u64 {
    if value.is_finite() && value >= 1.0 {
        value.round() as u64
    } else {
        DEFAULT_FREQUENCY_MS
    }
}

// Numbers decode from either JSON numbers or numeric strings; anything else
// that is present decodes to NaN so the merge resolves it to the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_kind", skip_serializing_if = "Option::is_none")]
    pub engagement_type: Option<EngagementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_thresholds: Option<PartialThresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialThresholds {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub views: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub likes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub reposts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub replies: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<f64>,
}

impl PartialThresholds {
    pub fn get(&self, kind: EngagementKind) -> Option<f64> {
        match kind {
            EngagementKind::Views => self.views,
            EngagementKind::Likes => self.likes,
            EngagementKind::Reposts => self.reposts,
            EngagementKind::Replies => self.replies,
            EngagementKind::Bookmarks => self.bookmarks,
        }
    }

    fn set(&mut self, kind: EngagementKind, value: f64) {
        let slot = match kind {
            EngagementKind::Views => &mut self.views,
            EngagementKind::Likes => &mut self.likes,
            EngagementKind::Reposts => &mut self.reposts,
            EngagementKind::Replies => &mut self.replies,
            EngagementKind::Bookmarks => &mut self.bookmarks,
        };
        *slot = Some(value);
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Null => None,
        serde_json::Value::Number(number) => Some(number.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(text) => Some(text.trim().parse::<f64>().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }))
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<EngagementKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.parse().unwrap_or_default()),
        _ => Some(EngagementKind::default()),
    }))
}

pub trait ConfigStore: Send + Sync {
    fn get(&self) -> Result<EngineConfig>;
    fn set(&self, partial: &PartialConfig) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    env_prefix: String,
    writing: Mutex<()>,
}

impl FileConfigStore {
    pub fn open(options: LoadOptions) -> Result<Self> {
        let path = match options.config_file {
            Some(path) => path,
            None => default_config_path().context("config: unable to determine default config path")?,
        };
        let env_prefix = options
            .env_prefix
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string());
        Ok(Self {
            path,
            env_prefix,
            writing: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reset(&self) -> Result<()> {
        let _guard = self.writing.lock();
        write_config_file(&self.path, &EngineConfig::default())
    }

    fn read_stored(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            return Ok(EngineConfig::default());
        }
        let partial = read_config_file(&self.path)?;
        Ok(EngineConfig::from_partial(&partial))
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self) -> Result<EngineConfig> {
        let mut cfg = self.read_stored()?;
        cfg.merge(&load_env(&self.env_prefix));
        Ok(cfg)
    }

    fn set(&self, partial: &PartialConfig) -> Result<()> {
        let _guard = self.writing.lock();
        let cfg = self.read_stored()?.merged(partial);
        write_config_file(&self.path, &cfg)
    }
}

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RwLock<EngineConfig>,
}

impl MemoryConfigStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self) -> Result<EngineConfig> {
        Ok(self.config.read().clone())
    }

    fn set(&self, partial: &PartialConfig) -> Result<()> {
        self.config.write().merge(partial);
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PartialConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(PartialConfig::default());
    }
    let config: PartialConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn write_config_file(path: &Path, cfg: &EngineConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("config: failed to create directory {}", parent.display()))?;
    }
    let contents = serde_yaml::to_string(cfg).context("config: failed to serialize config")?;
    fs::write(path, contents)
        .with_context(|| format!("config: failed to write file {}", path.display()))
}

fn load_env(prefix: &str) -> PartialConfig {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    let mut partial = PartialConfig::default();

    for (key, value) in env::vars_os() {
        let (Some(key), Some(value)) = (key.to_str(), value.to_str()) else {
            continue;
        };
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            apply_env_value(&mut partial, &normalized, value.to_string());
        }
    }

    partial
}

fn apply_env_value(partial: &mut PartialConfig, key: &str, value: String) {
    match key {
        "frequency" => partial.frequency = Some(parse_frequency(&value)),
        "max_hours" => partial.max_hours = Some(value.trim().parse().unwrap_or(f64::NAN)),
        "engagement_type" => partial.engagement_type = Some(value.parse().unwrap_or_default()),
        "highlight_color" => partial.highlight_color = Some(value),
        "is_active" => {
            partial.is_active = Some(matches!(
                value.trim(),
                "1" | "true" | "TRUE" | "True"
            ));
        }
        other => {
            if let Some(kind) = other.strip_prefix("thresholds.") {
                if let Ok(kind) = kind.parse::<EngagementKind>() {
                    partial
                        .engagement_thresholds
                        .get_or_insert_with(PartialThresholds::default)
                        .set(kind, value.trim().parse().unwrap_or(f64::NAN));
                }
            }
        }
    }
}

fn parse_frequency(value: &str) -> f64 {
    let value = value.trim();
    if let Ok(ms) = value.parse::<f64>() {
        return ms;
    }
    match humantime::parse_duration(value) {
        Ok(duration) => duration.as_millis() as f64,
        Err(_) => f64::NAN,
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("xrayfeed").join("config.yaml"))
}
