use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Id, Role};

/// Chat room document. Stored with `"type": "room"`.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "room", rename_all = "camelCase")]
pub struct ChatRoom {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: Id,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    pub room_type: RoomType,
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub settings: ChatRoomSettings,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Direct,
    Group,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomSettings {
    pub is_encrypted: bool,
    pub allow_reactions: bool,
    pub allow_replies: bool,
    pub allow_editing: bool,
    pub allow_deletion: bool,
}

impl Default for ChatRoomSettings {
    fn default() -> Self {
        Self {
            is_encrypted: false,
            allow_reactions: true,
            allow_replies: true,
            allow_editing: true,
            allow_deletion: true,
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachChatRoomRequest {
    /// Room name, defaults to the group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
