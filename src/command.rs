use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PartialConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Start,
    Stop,
    UpdateConfig {
        #[serde(default)]
        config: PartialConfig,
    },
    GetStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ack {
        success: bool,
    },
    Status {
        #[serde(rename = "isActive")]
        is_active: bool,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack { success: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command payload is not an object")]
    NotAnObject,
    #[error("command has no type tag")]
    MissingType,
    #[error("unrecognized command type {0:?}")]
    Unknown(String),
    #[error("malformed {kind} command: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Command {
    const KNOWN: [&'static str; 4] = ["START", "STOP", "UPDATE_CONFIG", "GET_STATUS"];

    pub fn decode(value: &Value) -> Result<Command, CommandError> {
        let object = value.as_object().ok_or(CommandError::NotAnObject)?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(CommandError::MissingType)?;
        if !Self::KNOWN.contains(&kind) {
            return Err(CommandError::Unknown(kind.to_string()));
        }
        serde_json::from_value(value.clone()).map_err(|source| CommandError::Malformed {
            kind: kind.to_string(),
            source,
        })
    }

    pub fn stored_change(&self) -> Option<PartialConfig> {
        match self {
            Command::Start | Command::Stop => Some(PartialConfig {
                is_active: Some(matches!(self, Command::Start)),
                ..PartialConfig::default()
            }),
            Command::UpdateConfig { config } => Some(config.clone()),
            Command::GetStatus => None,
        }
    }
}
