//! The module contains the user entity and the auth endpoints.
//!
//! `/auth/login` checks credentials and returns a signed token;
//! `/auth/upsert` creates the user when missing, updates the password
//! otherwise, and returns a token either way. The `admin` column is never
//! settable over HTTP.

use api_types::auth::{Credentials, TokenResponse};
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{ServerError, server::ServerState, token};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn issue_token(state: &ServerState, username: &str, admin: bool) -> Result<String, ServerError> {
    token::issue(
        &state.auth.signing_secret,
        username,
        admin,
        state.auth.token_ttl,
    )
    .map_err(|err| {
        tracing::error!("failed to sign token: {err}");
        ServerError::Generic("failed to sign token".to_string())
    })
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<TokenResponse>, StatusCode> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = Entity::find_by_id(payload.username.clone())
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("database error: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let user = match user {
        Some(user) if user.password == payload.password => user,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let token = issue_token(&state, &user.username, user.admin)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn upsert(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<TokenResponse>, ServerError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "username and password are required".to_string(),
        ));
    }

    let existing = Entity::find_by_id(payload.username.clone())
        .one(&state.db)
        .await?;

    let admin = match existing {
        Some(user) => {
            let admin = user.admin;
            let mut user: ActiveModel = user.into();
            user.password = ActiveValue::Set(payload.password.clone());
            user.update(&state.db).await?;
            admin
        }
        None => {
            let user = ActiveModel {
                username: ActiveValue::Set(payload.username.clone()),
                password: ActiveValue::Set(payload.password.clone()),
                admin: ActiveValue::Set(false),
            };
            user.insert(&state.db).await?;
            false
        }
    };

    let token = issue_token(&state, &payload.username, admin)?;
    Ok(Json(TokenResponse { token }))
}
