use axum::routing::get;
use axum::{Json, Router};
use campus_api::*;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::group_handle::*;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_group,
        search_groups,
        list_groups_by_category,
        get_popular_groups,
        get_group_categories,
        get_group,
        join_group,
        attach_chat_room,
    ),
    components(schemas(
        Group,
        GroupStats,
        GroupType,
        GroupDocument,
        CreateGroupRequest,
        AttachChatRoomRequest,
        ChatRoom,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "group", description = "Classroom and community discovery")
    )
)]
pub struct ApiDoc;

pub fn doc_router() -> Router {
    Router::new().route("/api/docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
