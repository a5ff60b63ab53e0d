use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{SchemaManager, Settings, Storage, Store};
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::repositories::{CouchDocumentStore, DocumentStore, SqliteDocumentStore};
use crate::services::{GroupService, TokenService};

/// Opens the configured document store.
pub async fn create_store(store: &Store) -> anyhow::Result<Arc<dyn DocumentStore>> {
    Ok(match store {
        Store::Sqlite(database) => {
            let storage = Storage::new(database.clone(), SchemaManager::default()).await?;
            tracing::info!("using sqlite document store at {}", database.url);
            Arc::new(SqliteDocumentStore::new(Arc::new(storage)))
        }
        Store::Couchdb(couch) => {
            let store = CouchDocumentStore::new(couch.clone())?;
            tracing::info!("using couchdb database {} at {}", couch.database, couch.url);
            Arc::new(store)
        }
    })
}

pub fn create_router(store: Arc<dyn DocumentStore>, token_service: Arc<TokenService>) -> Router {
    let token_state = TokenState {
        token_service,
    };

    let group_state = GroupState {
        group_service: Arc::new(GroupService::new(store)),
    };

    Router::new()
        .merge(group_router(group_state, token_state))
        .merge(doc_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let store = create_store(&settings.store).await?;
    let token_service = Arc::new(TokenService::new(settings.auth.clone()));

    Ok(create_router(store, token_service))
}
