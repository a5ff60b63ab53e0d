use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Id, UserRef};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    /// Document identifier, assigned by the store when empty
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: Id,
    /// Store revision of the document
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Join code handed out by the teacher
    pub code: String,
    pub teacher: UserRef,
    #[serde(default)]
    pub students: Vec<ClassroomStudent>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub settings: ClassroomSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_room_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stats: ClassroomStats,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Classroom {
    pub fn has_student(&self, user_id: &str) -> bool {
        self.students.iter().any(|student| student.id == user_id)
    }

    /// Recomputes the counters from the student list.
    pub fn refresh_stats(&mut self, now: OffsetDateTime) {
        self.stats.student_count = self.students.len() as u64;
        self.stats.active_students = self
            .students
            .iter()
            .filter(|student| student.status == StudentStatus::Active)
            .count() as u64;
        self.stats.last_active = Some(now);
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomStats {
    pub student_count: u64,
    pub active_students: u64,
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
pub struct ClassroomSettings {
    pub allow_student_posts: bool,
    pub allow_student_comments: bool,
    pub is_archived: bool,
    pub notifications: ClassroomNotifications,
}

impl Default for ClassroomSettings {
    fn default() -> Self {
        Self {
            allow_student_posts: true,
            allow_student_comments: true,
            is_archived: false,
            notifications: ClassroomNotifications::default(),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomNotifications {
    pub materials: bool,
    pub announcements: bool,
}

impl Default for ClassroomNotifications {
    fn default() -> Self {
        Self {
            materials: true,
            announcements: true,
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomStudent {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    #[serde(default)]
    pub status: StudentStatus,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Document,
    Video,
    Link,
    #[default]
    Other,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: MaterialKind,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    #[serde(default)]
    pub tags: Vec<String>,
}
