use axum::http::StatusCode;
use campus_api::GroupType;

use super::StoreError;

/// Read operation that was running when the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    Search,
    ListByCategory,
    GetPopular,
    GetCategories,
}

impl QueryAction {
    pub fn failure_message(&self, group_type: &GroupType) -> String {
        match self {
            QueryAction::Search => format!("Failed to search {}", group_type.plural()),
            QueryAction::ListByCategory => {
                format!("Failed to list {} by category", group_type.plural())
            }
            QueryAction::GetPopular => format!("Failed to get popular {}", group_type.plural()),
            QueryAction::GetCategories => format!("Failed to get {group_type} categories"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("{}", QueryAction::failure_message(.action, .group_type))]
    QueryFailed {
        action: QueryAction,
        group_type: GroupType,
    },

    #[error("Group not found")]
    GroupNotFound,

    #[error("Invalid request parameters")]
    InvalidRequest,

    #[error("Insufficient permission")]
    InsufficientPermission,

    #[error("User already in group")]
    AlreadyMember,

    #[error("Group requires approval to join")]
    ApprovalRequired,

    #[error("Group already has a chat room")]
    ChatRoomAttached,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl GroupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GroupError::QueryFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GroupError::GroupNotFound => StatusCode::NOT_FOUND,
            GroupError::InvalidRequest => StatusCode::BAD_REQUEST,
            GroupError::InsufficientPermission => StatusCode::FORBIDDEN,
            GroupError::AlreadyMember => StatusCode::CONFLICT,
            GroupError::ApprovalRequired => StatusCode::FORBIDDEN,
            GroupError::ChatRoomAttached => StatusCode::CONFLICT,
            GroupError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            GroupError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failure_names_type_and_action() {
        let cases = [
            (QueryAction::Search, GroupType::Classroom, "Failed to search classrooms"),
            (
                QueryAction::ListByCategory,
                GroupType::Community,
                "Failed to list communities by category",
            ),
            (QueryAction::GetPopular, GroupType::Classroom, "Failed to get popular classrooms"),
            (
                QueryAction::GetCategories,
                GroupType::Community,
                "Failed to get community categories",
            ),
        ];

        for (action, group_type, message) in cases {
            let error = GroupError::QueryFailed { action, group_type };
            assert_eq!(error.to_string(), message);
            assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
