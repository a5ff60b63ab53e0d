use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use campus_api::*;

use crate::errors::{ApiError, GroupError};
use crate::middlewares::{TokenState, auth};
use crate::services::{GroupService, TokenClaims};

#[derive(Clone)]
pub struct GroupState {
    pub group_service: Arc<GroupService>,
}

pub fn group_router(group_state: GroupState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/groups/:group_type", post(create_group))
        .route("/api/groups/:group_type/search", get(search_groups))
        .route(
            "/api/groups/:group_type/category/:category",
            get(list_groups_by_category),
        )
        .route("/api/groups/:group_type/popular", get(get_popular_groups))
        .route("/api/groups/:group_type/categories", get(get_group_categories))
        .route("/api/groups/:group_type/:group_id", get(get_group))
        .route("/api/groups/:group_type/:group_id/join", post(join_group))
        .route(
            "/api/groups/:group_type/:group_id/chat-room",
            post(attach_chat_room),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(group_state)
}

/// Zero pages and zero-sized pages are rejected before reaching the store.
fn check_paging(page: Option<u32>, limit: Option<u32>) -> Result<(), GroupError> {
    if page == Some(0) || limit == Some(0) {
        return Err(GroupError::InvalidRequest);
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_type}",
    tag = "group",
    request_body = CreateGroupRequest,
    params(
        ("group_type" = GroupType, Path, description = "classroom or community")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Invalid request parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_group(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<GroupState>,
    Path(group_type): Path<GroupType>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state
        .group_service
        .create_group(group_type, body, &token_data.user())
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_type}/search",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        SearchParams
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Matching groups, newest first", body = Vec<Group>),
        (status = 400, description = "Invalid request parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to search groups")
    )
)]
pub async fn search_groups(
    State(state): State<GroupState>,
    Path(group_type): Path<GroupType>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Group>>, ApiError> {
    check_paging(params.page, params.limit)?;

    let (query, options) = params.into_parts();
    let groups = state
        .group_service
        .search_groups(&query, group_type, &options)
        .await?;

    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_type}/category/{category}",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        ("category" = String, Path, description = "Exact category"),
        PageParams
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Groups of the category, newest first", body = Vec<Group>),
        (status = 400, description = "Invalid request parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to list groups by category")
    )
)]
pub async fn list_groups_by_category(
    State(state): State<GroupState>,
    Path((group_type, category)): Path<(GroupType, String)>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Group>>, ApiError> {
    check_paging(params.page, params.limit)?;

    let groups = state
        .group_service
        .list_by_category(group_type, &category, &params.into())
        .await?;

    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_type}/popular",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        PopularParams
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Largest groups first", body = Vec<Group>),
        (status = 400, description = "Invalid request parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to get popular groups")
    )
)]
pub async fn get_popular_groups(
    State(state): State<GroupState>,
    Path(group_type): Path<GroupType>,
    Query(params): Query<PopularParams>,
) -> Result<Json<Vec<Group>>, ApiError> {
    check_paging(None, params.limit)?;

    let groups = state
        .group_service
        .get_popular_groups(group_type, params.limit)
        .await?;

    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_type}/categories",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Distinct categories", body = Vec<String>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to get categories")
    )
)]
pub async fn get_group_categories(
    State(state): State<GroupState>,
    Path(group_type): Path<GroupType>,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = state.group_service.get_categories(group_type).await?;

    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_type}/{group_id}",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        ("group_id" = String, Path, description = "Group ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Successfully retrieved group details", body = GroupDocument),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_group(
    State(state): State<GroupState>,
    Path((group_type, group_id)): Path<(GroupType, String)>,
) -> Result<Json<GroupDocument>, ApiError> {
    let group = state.group_service.get_group(group_type, &group_id).await?;

    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_type}/{group_id}/join",
    tag = "group",
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        ("group_id" = String, Path, description = "Group ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Joined the group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Group requires approval to join"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "User already in group"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn join_group(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<GroupState>,
    Path((group_type, group_id)): Path<(GroupType, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .group_service
        .join_group(group_type, &group_id, &token_data.user())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_type}/{group_id}/chat-room",
    tag = "group",
    request_body = AttachChatRoomRequest,
    params(
        ("group_type" = GroupType, Path, description = "classroom or community"),
        ("group_id" = String, Path, description = "Group ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Chat room created and attached", body = ChatRoom),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the owner can attach a chat room"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Group already has a chat room"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn attach_chat_room(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<GroupState>,
    Path((group_type, group_id)): Path<(GroupType, String)>,
    body: Option<Json<AttachChatRoomRequest>>,
) -> Result<(StatusCode, Json<ChatRoom>), ApiError> {
    let name = body.and_then(|Json(body)| body.name);

    let room = state
        .group_service
        .attach_chat_room(group_type, &group_id, name, &token_data.user())
        .await?;

    Ok((StatusCode::CREATED, Json(room)))
}
