use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
};
use tracing::{info, warn};

use super::{PathParams, Payload, QueryParams};
use crate::{
    AppState,
    db::now_sec,
    error::{AppError, AppResult},
    mail,
    models::{
        CreateUserRequest, ListQuery, SignupRequest, SignupResponse, TokenRequest, TokenResponse,
        UpdateUserRequest, UserOut,
    },
    pagination::{Page, PageRequest},
    policy::{Actor, ResourceKind, Target, authorize},
};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    body: Payload<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    let req = body.into_valid()?;
    let (user, code) = state.users.signup(&req.username, &req.email).await?;

    let mail = mail::confirmation_mail(&state.config.mail_from, &user.email, &code);
    state.mailer.send(mail).map_err(AppError::Internal)?;

    Ok(Json(SignupResponse { username: user.username, email: user.email }))
}

pub async fn token(
    State(state): State<Arc<AppState>>,
    body: Payload<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let req = body.into_valid()?;
    let user = state.users.get(&req.username).await?;

    if state.attempts.check_key(&user.id).is_err() {
        warn!(user_id = user.id, "confirmation attempts exhausted");
        return Err(AppError::RateLimited);
    }

    let user = state.users.confirm(user, &req.confirmation_code).await?;
    let token = state.tokens.issue(user.id, now_sec())?;
    info!(user_id = user.id, "access token issued");
    Ok(Json(TokenResponse { token }))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<Page<UserOut>>> {
    authorize(&actor, &Method::GET, &Target::Collection(ResourceKind::Actor))?;
    let page = PageRequest::new(q.limit, q.offset, state.config.page_size);
    let users = state.users.list(q.search.as_deref(), page).await?;
    Ok(Json(users.map(|u| Ok(u.into()))?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    body: Payload<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserOut>)> {
    authorize(&actor, &Method::POST, &Target::Collection(ResourceKind::Actor))?;
    let req = body.into_valid()?;
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// Other actors' records are not readable by non-admins at all, so the
// permission check runs before the lookup and never reveals existence.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(username): PathParams<String>,
) -> AppResult<Json<UserOut>> {
    authorize(&actor, &Method::GET, &Target::object(ResourceKind::Actor))?;
    Ok(Json(state.users.get(&username).await?.into()))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(username): PathParams<String>,
    body: Payload<UpdateUserRequest>,
) -> AppResult<Json<UserOut>> {
    authorize(&actor, &Method::PATCH, &Target::object(ResourceKind::Actor))?;
    let req = body.into_valid()?;
    let user = state.users.get(&username).await?;
    Ok(Json(state.users.update(user, req, true).await?.into()))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(username): PathParams<String>,
) -> AppResult<StatusCode> {
    authorize(&actor, &Method::DELETE, &Target::object(ResourceKind::Actor))?;
    state.users.delete(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<Arc<AppState>>, actor: Actor) -> AppResult<Json<UserOut>> {
    authorize(&actor, &Method::GET, &Target::object(ResourceKind::OwnProfile))?;
    let id = actor.id().ok_or(AppError::Unauthorized)?;
    let user = state.users.by_id(id).await?.ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    body: Payload<UpdateUserRequest>,
) -> AppResult<Json<UserOut>> {
    authorize(&actor, &Method::PATCH, &Target::object(ResourceKind::OwnProfile))?;
    let req = body.into_valid()?;
    let id = actor.id().ok_or(AppError::Unauthorized)?;
    let user = state.users.by_id(id).await?.ok_or(AppError::NotFound("user"))?;
    Ok(Json(state.users.update(user, req, false).await?.into()))
}
