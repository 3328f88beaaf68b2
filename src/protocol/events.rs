use serde::{Deserialize, Serialize};

use crate::common::types::{ChannelId, GuildId, SessionId, UserId};

/// Request to open a new LFG session, as delivered by the command gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub game: String,
    pub mode: String,
    pub capacity: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub origin_channel_id: ChannelId,
}

/// What a pressed session control asks for. Dispatch is an exhaustive match
/// on this enum; the transport layer is responsible for mapping whatever
/// opaque control identifiers it uses onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Join,
    Confirm,
    Decline,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAction {
    pub kind: ActionKind,
    pub session_id: SessionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_action_round_trips_as_tagged_json() {
        let action = SessionAction {
            kind: ActionKind::Confirm,
            session_id: SessionId("7-1700000000000-ab12cd".to_string()),
        };
        let json = serde_json::to_string(&action).expect("serialize");
        assert!(json.contains("\"confirm\""));
        let back: SessionAction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, action);
    }
}
