use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Id, Role, UserRef};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    /// Document identifier, assigned by the store when empty
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: Id,
    /// Store revision of the document
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub creator: UserRef,
    #[serde(default)]
    pub members: Vec<CommunityMember>,
    #[serde(default)]
    pub settings: CommunitySettings,
    #[serde(default)]
    pub stats: CommunityStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_room_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Community {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member.id == user_id)
    }

    /// Whether joining goes through an approval step instead of adding the
    /// member directly.
    pub fn is_gated(&self) -> bool {
        self.settings.is_private || self.settings.requires_approval
    }

    /// Recomputes the member count and marks the community active.
    pub fn refresh_stats(&mut self, now: OffsetDateTime) {
        self.stats.member_count = self.members.len() as u64;
        self.stats.last_active = Some(now);
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub member_count: u64,
    pub post_count: u64,
    pub active_members: u64,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_active: Option<OffsetDateTime>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySettings {
    pub is_private: bool,
    pub requires_approval: bool,
    pub allow_posts: bool,
    pub allow_events: bool,
    pub allow_polls: bool,
}

impl Default for CommunitySettings {
    fn default() -> Self {
        Self {
            is_private: false,
            requires_approval: false,
            allow_posts: true,
            allow_events: true,
            allow_polls: true,
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMember {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}
