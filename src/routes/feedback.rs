use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
};

use super::{PathParams, Payload, QueryParams};
use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        CommentOut, CommentRequest, CreateReviewRequest, ListQuery, ReviewOut, UpdateReviewRequest,
    },
    pagination::{Page, PageRequest},
    policy::{Actor, ResourceKind, Target, authorize},
};

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    PathParams(title_id): PathParams<i32>,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<Page<ReviewOut>>> {
    let page = PageRequest::new(q.limit, q.offset, state.config.page_size);
    Ok(Json(state.reviews.list_reviews(title_id, page).await?))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(title_id): PathParams<i32>,
    body: Payload<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewOut>)> {
    authorize(&actor, &Method::POST, &Target::Collection(ResourceKind::Review))?;
    let author_id = actor.id().ok_or(AppError::Unauthorized)?;
    let req = body.into_valid()?;
    let created = state.reviews.create_review(title_id, author_id, req).await?;
    Ok((StatusCode::CREATED, Json(state.reviews.review_out(created).await?)))
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    PathParams((title_id, review_id)): PathParams<(i32, i32)>,
) -> AppResult<Json<ReviewOut>> {
    let review = state.reviews.review(title_id, review_id).await?;
    Ok(Json(state.reviews.review_out(review).await?))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams((title_id, review_id)): PathParams<(i32, i32)>,
    body: Payload<UpdateReviewRequest>,
) -> AppResult<Json<ReviewOut>> {
    let review = state.reviews.review(title_id, review_id).await?;
    authorize(&actor, &Method::PATCH, &Target::authored(ResourceKind::Review, review.author_id))?;
    let req = body.into_valid()?;
    let updated = state.reviews.update_review(review, req).await?;
    Ok(Json(state.reviews.review_out(updated).await?))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams((title_id, review_id)): PathParams<(i32, i32)>,
) -> AppResult<StatusCode> {
    let review = state.reviews.review(title_id, review_id).await?;
    authorize(&actor, &Method::DELETE, &Target::authored(ResourceKind::Review, review.author_id))?;
    state.reviews.delete_review(review).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    PathParams((title_id, review_id)): PathParams<(i32, i32)>,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<Page<CommentOut>>> {
    let page = PageRequest::new(q.limit, q.offset, state.config.page_size);
    Ok(Json(state.reviews.list_comments(title_id, review_id, page).await?))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams((title_id, review_id)): PathParams<(i32, i32)>,
    body: Payload<CommentRequest>,
) -> AppResult<(StatusCode, Json<CommentOut>)> {
    authorize(&actor, &Method::POST, &Target::Collection(ResourceKind::Comment))?;
    let author_id = actor.id().ok_or(AppError::Unauthorized)?;
    let req = body.into_valid()?;
    let created = state.reviews.create_comment(title_id, review_id, author_id, req).await?;
    Ok((StatusCode::CREATED, Json(state.reviews.comment_out(created).await?)))
}

pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    PathParams((title_id, review_id, comment_id)): PathParams<(i32, i32, i32)>,
) -> AppResult<Json<CommentOut>> {
    let comment = state.reviews.comment(title_id, review_id, comment_id).await?;
    Ok(Json(state.reviews.comment_out(comment).await?))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams((title_id, review_id, comment_id)): PathParams<(i32, i32, i32)>,
    body: Payload<CommentRequest>,
) -> AppResult<Json<CommentOut>> {
    let comment = state.reviews.comment(title_id, review_id, comment_id).await?;
    authorize(&actor, &Method::PATCH, &Target::authored(ResourceKind::Comment, comment.author_id))?;
    let req = body.into_valid()?;
    let updated = state.reviews.update_comment(comment, req).await?;
    Ok(Json(state.reviews.comment_out(updated).await?))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams((title_id, review_id, comment_id)): PathParams<(i32, i32, i32)>,
) -> AppResult<StatusCode> {
    let comment = state.reviews.comment(title_id, review_id, comment_id).await?;
    authorize(&actor, &Method::DELETE, &Target::authored(ResourceKind::Comment, comment.author_id))?;
    state.reviews.delete_comment(comment).await?;
    Ok(StatusCode::NO_CONTENT)
}
