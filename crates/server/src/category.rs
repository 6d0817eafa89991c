//! Transaction category API endpoints.

use api_types::category::{
    CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use ledger::Caller;

fn category_view(category: ledger::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        owner: category.owner,
        name: category.name,
        created_at: category.created_at,
    }
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state.ledger.create_category(&caller, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn read(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.ledger.category(&caller, id).await?;
    Ok(Json(category_view(category)))
}

pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .ledger
        .update_category(&caller, id, &payload.name)
        .await?;
    Ok(Json(category_view(category)))
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete_category(&caller, id).await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state.ledger.list_categories(&caller).await?;
    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(category_view).collect(),
    }))
}

pub async fn my(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state.ledger.my_categories(&caller).await?;
    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(category_view).collect(),
    }))
}
