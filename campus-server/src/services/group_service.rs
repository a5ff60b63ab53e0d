use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use campus_api::{
    ChatRoom, ChatRoomSettings, Classroom, ClassroomSettings, ClassroomStats, ClassroomStudent,
    Community, CommunityMember, CommunityStats, CreateGroupRequest, DEFAULT_LIMIT, Group,
    GroupDocument, GroupType, PageOptions, Participant, Role, RoomType, SearchOptions,
    StudentStatus, UserRef,
};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::{GroupError, QueryAction, StoreError};
use crate::query::{Clause, Direction, FindQuery, Selector};
use crate::repositories::DocumentStore;

const CREATED_AT: &str = "createdAt";
const JOIN_CODE_LENGTH: usize = 6;

/// Selector for `type == T` plus the text match on name, description or tags.
pub fn search_query(query: &str, group_type: GroupType, options: &SearchOptions) -> FindQuery {
    let mut selector = Selector::new()
        .and(Clause::eq("type", group_type.as_str()))
        .and(Clause::or(vec![
            Clause::contains("name", query),
            Clause::contains("description", query),
            Clause::any_contains("tags", query),
        ]));

    if let Some(category) = &options.category {
        selector = selector.and(Clause::eq("category", category.as_str()));
    }

    paged(selector, &options.pagination())
}

pub fn category_query(group_type: GroupType, category: &str, options: &PageOptions) -> FindQuery {
    let selector = Selector::new()
        .and(Clause::eq("type", group_type.as_str()))
        .and(Clause::eq("category", category));

    paged(selector, options)
}

pub fn popular_query(group_type: GroupType, limit: u32) -> FindQuery {
    let counter = group_type.popularity_counter();
    let selector = Selector::new()
        .and(Clause::eq("type", group_type.as_str()))
        .and(Clause::gt(counter, 0));

    FindQuery::new(selector)
        .sort(counter, Direction::Desc)
        .limit(u64::from(limit))
}

pub fn categories_query(group_type: GroupType) -> FindQuery {
    FindQuery::new(Selector::new().and(Clause::eq("type", group_type.as_str())))
        .fields(&["category"])
}

fn paged(selector: Selector, options: &PageOptions) -> FindQuery {
    FindQuery::new(selector)
        .sort(CREATED_AT, Direction::Desc)
        .skip(options.skip())
        .limit(u64::from(options.limit()))
}

fn join_code() -> String {
    Uuid::new_v4().simple().to_string()[..JOIN_CODE_LENGTH].to_uppercase()
}

fn participants(document: &GroupDocument) -> Vec<Participant> {
    let owner = document.owner();
    let mut participants = vec![Participant {
        id: owner.id.clone(),
        name: owner.name.clone(),
        avatar: owner.avatar.clone(),
        role: Role::Admin,
    }];

    let members: Vec<(&str, &str, Option<&String>)> = match document {
        GroupDocument::Classroom(classroom) => classroom
            .students
            .iter()
            .map(|student| (student.id.as_str(), student.name.as_str(), student.avatar.as_ref()))
            .collect(),
        GroupDocument::Community(community) => community
            .members
            .iter()
            .map(|member| (member.id.as_str(), member.name.as_str(), member.avatar.as_ref()))
            .collect(),
    };

    participants.extend(
        members
            .into_iter()
            .filter(|(id, _, _)| *id != owner.id)
            .map(|(id, name, avatar)| Participant {
                id: id.to_string(),
                name: name.to_string(),
                avatar: avatar.cloned(),
                role: Role::Member,
            }),
    );

    participants
}

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn DocumentStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn search_groups(
        &self,
        query: &str,
        group_type: GroupType,
        options: &SearchOptions,
    ) -> Result<Vec<Group>, GroupError> {
        let find = search_query(query, group_type, options);
        self.read_groups(&find, QueryAction::Search, group_type).await
    }

    pub async fn list_by_category(
        &self,
        group_type: GroupType,
        category: &str,
        options: &PageOptions,
    ) -> Result<Vec<Group>, GroupError> {
        let find = category_query(group_type, category, options);
        self.read_groups(&find, QueryAction::ListByCategory, group_type)
            .await
    }

    /// Groups with a non-zero size counter, largest first.
    pub async fn get_popular_groups(
        &self,
        group_type: GroupType,
        limit: Option<u32>,
    ) -> Result<Vec<Group>, GroupError> {
        let find = popular_query(group_type, limit.unwrap_or(DEFAULT_LIMIT));
        self.read_groups(&find, QueryAction::GetPopular, group_type)
            .await
    }

    /// Distinct non-empty categories, sorted.
    ///
    /// Reads every document of the type.
    pub async fn get_categories(&self, group_type: GroupType) -> Result<Vec<String>, GroupError> {
        let action = QueryAction::GetCategories;
        let documents = self
            .store
            .find(&categories_query(group_type))
            .await
            .map_err(|e| query_failed(action, group_type, &e))?;

        let categories: BTreeSet<String> = documents
            .into_iter()
            .filter_map(|document| match document.get("category") {
                Some(Value::String(category)) if !category.is_empty() => Some(category.clone()),
                _ => None,
            })
            .collect();

        Ok(categories.into_iter().collect())
    }

    pub async fn create_group(
        &self,
        group_type: GroupType,
        request: CreateGroupRequest,
        owner: &UserRef,
    ) -> Result<Group, GroupError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidRequest);
        }

        let now = OffsetDateTime::now_utc();
        let mut document = match group_type {
            GroupType::Classroom => GroupDocument::Classroom(Classroom {
                id: String::new(),
                rev: None,
                name: name.to_string(),
                description: request.description,
                code: join_code(),
                teacher: owner.clone(),
                students: vec![],
                materials: vec![],
                settings: ClassroomSettings::default(),
                chat_room_id: None,
                thumbnail: request.thumbnail,
                category: request.category,
                tags: request.tags,
                stats: ClassroomStats::default(),
                created_at: now,
                updated_at: now,
            }),
            GroupType::Community => {
                let mut community = Community {
                    id: String::new(),
                    rev: None,
                    name: name.to_string(),
                    description: request.description,
                    avatar: None,
                    banner: None,
                    creator: owner.clone(),
                    members: vec![CommunityMember {
                        id: owner.id.clone(),
                        name: owner.name.clone(),
                        avatar: owner.avatar.clone(),
                        role: Role::Admin,
                        joined_at: now,
                    }],
                    settings: request.settings.unwrap_or_default(),
                    stats: CommunityStats::default(),
                    chat_room_id: None,
                    thumbnail: request.thumbnail,
                    category: request.category,
                    tags: request.tags,
                    created_at: now,
                    updated_at: now,
                };
                community.refresh_stats(now);
                GroupDocument::Community(community)
            }
        };

        let meta = self.store.create(to_document(&document)?).await?;
        tracing::info!("created {} {}", group_type, meta.id);

        match &mut document {
            GroupDocument::Classroom(classroom) => {
                classroom.id = meta.id;
                classroom.rev = Some(meta.rev);
            }
            GroupDocument::Community(community) => {
                community.id = meta.id;
                community.rev = Some(meta.rev);
            }
        }

        Ok(document.summary())
    }

    /// Full document of a group. A document of another type is not found.
    pub async fn get_group(
        &self,
        group_type: GroupType,
        id: &str,
    ) -> Result<GroupDocument, GroupError> {
        let document = self
            .store
            .get(id)
            .await?
            .filter(|document| {
                document.get("type").and_then(Value::as_str) == Some(group_type.as_str())
            })
            .ok_or(GroupError::GroupNotFound)?;

        serde_json::from_value(document).map_err(|e| GroupError::Store(e.into()))
    }

    pub async fn join_group(
        &self,
        group_type: GroupType,
        id: &str,
        user: &UserRef,
    ) -> Result<(), GroupError> {
        let mut document = self.get_group(group_type, id).await?;
        let now = OffsetDateTime::now_utc();

        match &mut document {
            GroupDocument::Classroom(classroom) => {
                if classroom.teacher.id == user.id || classroom.has_student(&user.id) {
                    return Err(GroupError::AlreadyMember);
                }

                classroom.students.push(ClassroomStudent {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    avatar: user.avatar.clone(),
                    joined_at: now,
                    status: StudentStatus::Active,
                });
                classroom.refresh_stats(now);
                classroom.updated_at = now;
            }
            GroupDocument::Community(community) => {
                if community.creator.id == user.id || community.has_member(&user.id) {
                    return Err(GroupError::AlreadyMember);
                }
                if community.is_gated() {
                    return Err(GroupError::ApprovalRequired);
                }

                community.members.push(CommunityMember {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    avatar: user.avatar.clone(),
                    role: Role::Member,
                    joined_at: now,
                });
                community.stats.active_members += 1;
                community.refresh_stats(now);
                community.updated_at = now;
            }
        }

        self.store.update(id, to_document(&document)?).await?;
        tracing::debug!("user {} joined {} {}", user.id, group_type, id);

        Ok(())
    }

    /// Creates a group chat room for the members and links it to the group.
    pub async fn attach_chat_room(
        &self,
        group_type: GroupType,
        id: &str,
        name: Option<String>,
        caller: &UserRef,
    ) -> Result<ChatRoom, GroupError> {
        let mut document = self.get_group(group_type, id).await?;

        if document.owner().id != caller.id {
            return Err(GroupError::InsufficientPermission);
        }
        if document.chat_room_id().is_some() {
            return Err(GroupError::ChatRoomAttached);
        }

        let now = OffsetDateTime::now_utc();
        let mut room = ChatRoom {
            id: String::new(),
            rev: None,
            name: name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| document.name().to_string()),
            room_type: RoomType::Group,
            participants: participants(&document),
            settings: ChatRoomSettings::default(),
            created_at: now,
        };

        let value = serde_json::to_value(&room).map_err(StoreError::from)?;
        let meta = self.store.create(value).await?;
        room.id = meta.id;
        room.rev = Some(meta.rev);

        match &mut document {
            GroupDocument::Classroom(classroom) => {
                classroom.chat_room_id = Some(room.id.clone());
                classroom.updated_at = now;
            }
            GroupDocument::Community(community) => {
                community.chat_room_id = Some(room.id.clone());
                community.updated_at = now;
            }
        }

        if let Err(e) = self.store.update(id, to_document(&document)?).await {
            tracing::warn!("chat room {} left unlinked from {}: {}", room.id, id, e);
            return Err(e.into());
        }

        Ok(room)
    }

    async fn read_groups(
        &self,
        query: &FindQuery,
        action: QueryAction,
        group_type: GroupType,
    ) -> Result<Vec<Group>, GroupError> {
        let documents = self
            .store
            .find(query)
            .await
            .map_err(|e| query_failed(action, group_type, &e))?;

        documents
            .into_iter()
            .map(serde_json::from_value::<Group>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_failed(action, group_type, &e))
    }
}

fn to_document(document: &GroupDocument) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(document)?)
}

fn query_failed(action: QueryAction, group_type: GroupType, error: &dyn Display) -> GroupError {
    tracing::error!(
        group_type = %group_type,
        "{}: {}",
        action.failure_message(&group_type),
        error
    );

    GroupError::QueryFailed { action, group_type }
}

#[cfg(test)]
mod tests {
    use campus_api::CommunitySettings;
    use time::Duration;
    use time::macros::datetime;

    use crate::tests::*;

    use super::*;

    #[test]
    fn test_search_query_shape() {
        let options = SearchOptions {
            page: Some(3),
            limit: Some(5),
            category: Some("math".to_string()),
        };

        let query = search_query("alg", GroupType::Classroom, &options);

        assert_eq!(
            query.selector.clauses(),
            &[
                Clause::eq("type", "classroom"),
                Clause::or(vec![
                    Clause::contains("name", "alg"),
                    Clause::contains("description", "alg"),
                    Clause::any_contains("tags", "alg"),
                ]),
                Clause::eq("category", "math"),
            ]
        );
        assert_eq!(query.sort[0].field, "createdAt");
        assert_eq!(query.sort[0].direction, Direction::Desc);
        assert_eq!(query.skip, Some(10));
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_popular_query_uses_counter_of_type() {
        let query = popular_query(GroupType::Community, 3);

        assert_eq!(query.selector.clauses()[1], Clause::gt("stats.memberCount", 0));
        assert_eq!(query.sort[0].field, "stats.memberCount");
        assert_eq!(query.skip, None);
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_categories_query_is_unbounded() {
        let query = categories_query(GroupType::Classroom);

        assert_eq!(query.limit, None);
        assert_eq!(query.fields, Some(vec!["category".to_string()]));
    }

    #[tokio::test]
    async fn test_search_groups_pages_newest_first() {
        let (service, store) = setup_test_service().await;
        for day in 1..=5u8 {
            let mut classroom = classroom(&format!("Math {day}"));
            classroom.created_at = datetime!(2024-03-01 00:00 UTC) + Duration::days(day.into());
            insert_classroom(store.as_ref(), classroom).await;
        }

        let options = SearchOptions {
            page: Some(2),
            limit: Some(2),
            category: None,
        };
        let groups = service
            .search_groups("math", GroupType::Classroom, &options)
            .await
            .unwrap();

        let names: Vec<_> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, ["Math 3", "Math 2"]);
    }

    #[tokio::test]
    async fn test_get_categories_distinct_and_non_empty() {
        let (service, store) = setup_test_service().await;
        for category in [Some("science"), Some("math"), Some("science"), Some(""), None] {
            let mut community = community("Club");
            community.category = category.map(str::to_string);
            insert_community(store.as_ref(), community).await;
        }

        let categories = service.get_categories(GroupType::Community).await.unwrap();
        assert_eq!(categories, ["math", "science"]);

        let categories = service.get_categories(GroupType::Classroom).await.unwrap();
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_is_query_failure() {
        let service = GroupService::new(Arc::new(FailingStore));

        let error = service
            .search_groups("x", GroupType::Classroom, &SearchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Failed to search classrooms");

        let error = service
            .get_categories(GroupType::Community)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Failed to get community categories");
    }

    #[tokio::test]
    async fn test_create_group_sets_owner_and_counters() {
        let (service, _) = setup_test_service().await;
        let owner = test_owner();

        let request = CreateGroupRequest {
            name: "  Chess Club ".to_string(),
            ..CreateGroupRequest::default()
        };
        let group = service
            .create_group(GroupType::Community, request, &owner)
            .await
            .unwrap();

        assert_eq!(group.name, "Chess Club");
        assert_eq!(group.stats.member_count, Some(1));

        let classroom = service
            .create_group(
                GroupType::Classroom,
                CreateGroupRequest {
                    name: "Physics".to_string(),
                    ..CreateGroupRequest::default()
                },
                &owner,
            )
            .await
            .unwrap();

        match service.get_group(GroupType::Classroom, &classroom.id).await.unwrap() {
            GroupDocument::Classroom(stored) => {
                assert_eq!(stored.teacher, owner);
                assert_eq!(stored.code.len(), 6);
                assert_eq!(stored.code, stored.code.to_uppercase());
                assert_eq!(stored.stats.student_count, 0);
            }
            other => panic!("unexpected document {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_group_requires_name() {
        let (service, _) = setup_test_service().await;

        let result = service
            .create_group(GroupType::Classroom, CreateGroupRequest::default(), &test_owner())
            .await;

        assert!(matches!(result, Err(GroupError::InvalidRequest)));
    }

    #[tokio::test]
    async fn test_get_group_checks_type() {
        let (service, store) = setup_test_service().await;
        let id = insert_classroom(store.as_ref(), classroom("Algebra")).await;

        assert!(service.get_group(GroupType::Classroom, &id).await.is_ok());
        assert!(matches!(
            service.get_group(GroupType::Community, &id).await,
            Err(GroupError::GroupNotFound)
        ));
        assert!(matches!(
            service.get_group(GroupType::Classroom, "missing").await,
            Err(GroupError::GroupNotFound)
        ));
    }

    #[tokio::test]
    async fn test_join_classroom_updates_counters() {
        let (service, store) = setup_test_service().await;
        let id = insert_classroom(store.as_ref(), classroom("Algebra")).await;
        let student = test_user("student-1");

        service
            .join_group(GroupType::Classroom, &id, &student)
            .await
            .unwrap();

        let GroupDocument::Classroom(stored) =
            service.get_group(GroupType::Classroom, &id).await.unwrap()
        else {
            panic!("expected a classroom");
        };
        assert_eq!(stored.stats.student_count, 1);
        assert_eq!(stored.stats.active_students, 1);
        assert_eq!(stored.students[0].id, student.id);
        assert_eq!(stored.students[0].status, StudentStatus::Active);

        let again = service.join_group(GroupType::Classroom, &id, &student).await;
        assert!(matches!(again, Err(GroupError::AlreadyMember)));

        let teacher = service
            .join_group(GroupType::Classroom, &id, &test_owner())
            .await;
        assert!(matches!(teacher, Err(GroupError::AlreadyMember)));
    }

    #[tokio::test]
    async fn test_join_community_respects_approval() {
        let (service, store) = setup_test_service().await;
        let open = insert_community(store.as_ref(), community("Open")).await;

        let mut gated = community("Gated");
        gated.settings = CommunitySettings {
            requires_approval: true,
            ..CommunitySettings::default()
        };
        let gated = insert_community(store.as_ref(), gated).await;

        let user = test_user("member-1");
        service
            .join_group(GroupType::Community, &open, &user)
            .await
            .unwrap();

        let GroupDocument::Community(stored) =
            service.get_group(GroupType::Community, &open).await.unwrap()
        else {
            panic!("expected a community");
        };
        assert_eq!(stored.stats.member_count, 2);
        assert_eq!(stored.members[1].role, Role::Member);

        let result = service.join_group(GroupType::Community, &gated, &user).await;
        assert!(matches!(result, Err(GroupError::ApprovalRequired)));
    }

    #[tokio::test]
    async fn test_join_community_marks_last_active() {
        let (service, store) = setup_test_service().await;
        let mut quiet = community("Quiet");
        quiet.stats.last_active = None;
        let id = insert_community(store.as_ref(), quiet).await;

        let before = OffsetDateTime::now_utc();
        service
            .join_group(GroupType::Community, &id, &test_user("member-1"))
            .await
            .unwrap();

        let popular = service
            .get_popular_groups(GroupType::Community, None)
            .await
            .unwrap();
        let last_active = popular[0].stats.last_active.unwrap();
        assert!(last_active >= before);
    }

    #[tokio::test]
    async fn test_attach_chat_room_once_by_owner() {
        let (service, store) = setup_test_service().await;
        let id = insert_classroom(store.as_ref(), classroom("Algebra")).await;
        service
            .join_group(GroupType::Classroom, &id, &test_user("student-1"))
            .await
            .unwrap();

        let stranger = service
            .attach_chat_room(GroupType::Classroom, &id, None, &test_user("student-1"))
            .await;
        assert!(matches!(stranger, Err(GroupError::InsufficientPermission)));

        let room = service
            .attach_chat_room(GroupType::Classroom, &id, None, &test_owner())
            .await
            .unwrap();

        assert_eq!(room.name, "Algebra");
        assert_eq!(room.room_type, RoomType::Group);
        assert_eq!(room.participants.len(), 2);
        assert_eq!(room.participants[0].role, Role::Admin);
        assert_eq!(room.participants[1].role, Role::Member);

        let group = service.get_group(GroupType::Classroom, &id).await.unwrap();
        assert_eq!(group.chat_room_id(), Some(room.id.as_str()));

        let again = service
            .attach_chat_room(GroupType::Classroom, &id, Some("Other".into()), &test_owner())
            .await;
        assert!(matches!(again, Err(GroupError::ChatRoomAttached)));
    }
}
