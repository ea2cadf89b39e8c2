use crate::{
    data::{
        entity::{Entity, EntityKind},
        validation::EntityFields,
    },
    error::{JsonBodySnafu, RosterResult},
    routes::search::get_search,
    state::RosterState,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub fn router(kind: EntityKind) -> Router<RosterState> {
    Router::new()
        .route("/", get(get_all).post(post_new))
        .route("/search", get(get_search))
        .route("/{id}", get(get_one).put(put_update).delete(delete_one))
        .layer(Extension(kind))
}

pub async fn get_all(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
) -> RosterResult<Json<Vec<Entity>>> {
    state.repository(kind).list_all().await.map(Json)
}

pub async fn post_new(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
    body: Result<Json<EntityFields>, JsonRejection>,
) -> RosterResult<(StatusCode, Json<Entity>)> {
    let Json(fields) = body.context(JsonBodySnafu)?;
    let entity = state.repository(kind).create(fields).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

pub async fn get_one(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<String>,
) -> RosterResult<Json<Entity>> {
    state.repository(kind).get_by_id(&id).await.map(Json)
}

pub async fn put_update(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<String>,
    body: Result<Json<EntityFields>, JsonRejection>,
) -> RosterResult<Json<Entity>> {
    let Json(fields) = body.context(JsonBodySnafu)?;
    state.repository(kind).update(&id, fields).await.map(Json)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
    pub deleted: Entity,
}

pub async fn delete_one(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<String>,
) -> RosterResult<Json<DeleteConfirmation>> {
    let deleted = state.repository(kind).delete_by_id(&id).await?;
    Ok(Json(DeleteConfirmation {
        message: format!("{kind} deleted"),
        deleted,
    }))
}
