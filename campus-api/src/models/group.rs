use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Classroom, Community, CommunitySettings, GroupType, Id, UserRef};
use super::{DEFAULT_LIMIT, DEFAULT_PAGE};

/// Listing view shared by classrooms and communities.
///
/// Stored documents carry more fields than this; everything not listed here
/// is ignored when a document is read as a `Group`.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Document identifier
    #[serde(alias = "_id")]
    pub id: Id,
    /// Group kind
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stats: GroupStats,
    /// Associated chat room, if one was attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_room_id: Option<Id>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// Counters of either group kind. Which size counter is populated depends on
/// the group type.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_members: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_students: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_count: Option<u64>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_active: Option<OffsetDateTime>,
}

/// A stored group document, tagged by its `type` field.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupDocument {
    Classroom(Classroom),
    Community(Community),
}

impl GroupDocument {
    pub fn name(&self) -> &str {
        match self {
            GroupDocument::Classroom(classroom) => &classroom.name,
            GroupDocument::Community(community) => &community.name,
        }
    }

    /// Teacher of a classroom or creator of a community.
    pub fn owner(&self) -> &UserRef {
        match self {
            GroupDocument::Classroom(classroom) => &classroom.teacher,
            GroupDocument::Community(community) => &community.creator,
        }
    }

    pub fn chat_room_id(&self) -> Option<&str> {
        match self {
            GroupDocument::Classroom(classroom) => classroom.chat_room_id.as_deref(),
            GroupDocument::Community(community) => community.chat_room_id.as_deref(),
        }
    }

    pub fn summary(&self) -> Group {
        match self {
            GroupDocument::Classroom(classroom) => Group {
                id: classroom.id.clone(),
                group_type: GroupType::Classroom,
                name: classroom.name.clone(),
                description: classroom.description.clone(),
                thumbnail: classroom.thumbnail.clone(),
                category: classroom.category.clone(),
                tags: classroom.tags.clone(),
                stats: GroupStats {
                    student_count: Some(classroom.stats.student_count),
                    active_students: Some(classroom.stats.active_students),
                    last_active: classroom.stats.last_active,
                    ..GroupStats::default()
                },
                chat_room_id: classroom.chat_room_id.clone(),
                created_at: Some(classroom.created_at),
            },
            GroupDocument::Community(community) => Group {
                id: community.id.clone(),
                group_type: GroupType::Community,
                name: community.name.clone(),
                description: community.description.clone(),
                thumbnail: community.thumbnail.clone(),
                category: community.category.clone(),
                tags: community.tags.clone(),
                stats: GroupStats {
                    member_count: Some(community.stats.member_count),
                    active_members: Some(community.stats.active_members),
                    post_count: Some(community.stats.post_count),
                    last_active: community.stats.last_active,
                    ..GroupStats::default()
                },
                chat_room_id: community.chat_room_id.clone(),
                created_at: Some(community.created_at),
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageOptions {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Number of matching documents that precede the requested page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page().saturating_sub(1)) * u64::from(self.limit())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl SearchOptions {
    pub fn pagination(&self) -> PageOptions {
        PageOptions {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query string of `GET /api/groups/{type}/search`.
#[cfg_attr(feature = "docs", derive(utoipa::IntoParams))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", into_params(parameter_in = Query))]
pub struct SearchParams {
    /// Text matched against name, description and tags
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SearchParams {
    pub fn new(query: &str, options: &SearchOptions) -> Self {
        Self {
            q: query.to_string(),
            page: options.page,
            limit: options.limit,
            category: options.category.clone(),
        }
    }

    pub fn into_parts(self) -> (String, SearchOptions) {
        let options = SearchOptions {
            page: self.page,
            limit: self.limit,
            category: self.category,
        };

        (self.q, options)
    }
}

/// Query string of the paginated listing endpoints.
#[cfg_attr(feature = "docs", derive(utoipa::IntoParams))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", into_params(parameter_in = Query))]
pub struct PageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl From<PageParams> for PageOptions {
    fn from(params: PageParams) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
        }
    }
}

impl From<&PageOptions> for PageParams {
    fn from(options: &PageOptions) -> Self {
        Self {
            page: options.page,
            limit: options.limit,
        }
    }
}

/// Query string of `GET /api/groups/{type}/popular`.
#[cfg_attr(feature = "docs", derive(utoipa::IntoParams))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", into_params(parameter_in = Query))]
pub struct PopularParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Only read when creating a community
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<CommunitySettings>,
}
