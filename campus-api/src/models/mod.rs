mod chat;
mod classroom;
mod community;
mod group;

pub use chat::*;
pub use classroom::*;
pub use community::*;
pub use group::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type Id = String;

/// Page used when the caller does not pick one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not pick one.
pub const DEFAULT_LIMIT: u32 = 10;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Classroom,
    Community,
}

impl GroupType {
    pub const ALL: [GroupType; 2] = [GroupType::Classroom, GroupType::Community];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Classroom => "classroom",
            GroupType::Community => "community",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            GroupType::Classroom => "classrooms",
            GroupType::Community => "communities",
        }
    }

    /// Dotted path of the stats counter that measures the size of a group.
    ///
    /// This is the only place where the two group kinds differ for listing
    /// purposes, so every popularity query reads the field from here.
    pub fn popularity_counter(&self) -> &'static str {
        match self {
            GroupType::Classroom => "stats.studentCount",
            GroupType::Community => "stats.memberCount",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGroupTypeError(pub String);

impl fmt::Display for ParseGroupTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown group type `{}`", self.0)
    }
}

impl std::error::Error for ParseGroupTypeError {}

impl FromStr for GroupType {
    type Err = ParseGroupTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "classroom" => Ok(GroupType::Classroom),
            "community" => Ok(GroupType::Community),
            other => Err(ParseGroupTypeError(other.to_string())),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Moderator => write!(f, "moderator"),
            Role::Member => write!(f, "member"),
        }
    }
}

/// Reference to a user embedded in another document.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_type_round_trips_through_str() {
        for group_type in GroupType::ALL {
            assert_eq!(group_type.as_str().parse::<GroupType>(), Ok(group_type));
        }

        assert!("room".parse::<GroupType>().is_err());
    }

    #[test]
    fn test_popularity_counter_per_type() {
        assert_eq!(GroupType::Classroom.popularity_counter(), "stats.studentCount");
        assert_eq!(GroupType::Community.popularity_counter(), "stats.memberCount");
    }
}
