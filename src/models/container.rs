//! Media container status

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ContainerId;

/// Lifecycle of a media container
///
/// `Created` is the client-side state between creation and the first poll.
/// The API reports the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerState {
    /// Created, not yet polled
    #[default]
    Created,
    /// Media is still being processed
    InProgress,
    /// Ready to publish
    Finished,
    /// Processing failed
    Error,
    /// Not published within 24 hours
    Expired,
    /// Already published
    Published,
    /// Anything the client does not know about yet
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    /// Whether polling can stop
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Error | Self::Expired | Self::Published
        )
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
            Self::Expired => "EXPIRED",
            Self::Published => "PUBLISHED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Status of a container as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerStatus {
    /// Container id
    pub id: ContainerId,
    /// Current state
    pub status: ContainerState,
    /// Failure reason when `status` is `ERROR`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let s: ContainerStatus =
            serde_json::from_str(r#"{"id":"c1","status":"IN_PROGRESS"}"#).unwrap();
        assert_eq!(s.status, ContainerState::InProgress);
        assert!(!s.status.is_terminal());

        let s: ContainerStatus = serde_json::from_str(
            r#"{"id":"c1","status":"ERROR","error_message":"bad media"}"#,
        )
        .unwrap();
        assert_eq!(s.status, ContainerState::Error);
        assert_eq!(s.error_message.as_deref(), Some("bad media"));

        let s: ContainerStatus =
            serde_json::from_str(r#"{"id":"c1","status":"SOMETHING_NEW"}"#).unwrap();
        assert_eq!(s.status, ContainerState::Unknown);
    }
}
