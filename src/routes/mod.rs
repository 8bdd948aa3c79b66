mod account;
mod catalog;
mod feedback;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    routing::{delete, get, post},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{AppState, error::AppError, error::AppResult};

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/auth/signup/", post(account::signup))
        .route("/auth/token/", post(account::token))
        .route("/users/", get(account::list_users).post(account::create_user))
        .route("/users/me/", get(account::me).patch(account::update_me))
        .route(
            "/users/{username}/",
            get(account::get_user).patch(account::update_user).delete(account::delete_user),
        )
        .route("/categories/", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/{slug}/", delete(catalog::delete_category))
        .route("/genres/", get(catalog::list_genres).post(catalog::create_genre))
        .route("/genres/{slug}/", delete(catalog::delete_genre))
        .route("/titles/", get(catalog::list_titles).post(catalog::create_title))
        .route(
            "/titles/{title_id}/",
            get(catalog::get_title).patch(catalog::update_title).delete(catalog::delete_title),
        )
        .route(
            "/titles/{title_id}/reviews/",
            get(feedback::list_reviews).post(feedback::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(feedback::get_review).patch(feedback::update_review).delete(feedback::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(feedback::list_comments).post(feedback::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(feedback::get_comment)
                .patch(feedback::update_comment)
                .delete(feedback::delete_comment),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// A JSON body whose parsing and validation are deferred, so handlers can
/// check permissions before rejecting a malformed payload.
pub struct Payload<T>(AppResult<T>);

impl<T> Payload<T>
where
    T: Validate,
{
    pub fn into_valid(self) -> AppResult<T> {
        let value = self.0?;
        value.validate()?;
        Ok(value)
    }
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let parsed = Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| value)
            .map_err(|rejection| AppError::field("body", rejection.body_text()));
        Ok(Self(parsed))
    }
}

/// `Path` whose rejection is a field error under `path`.
pub struct PathParams<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| AppError::field("path", rejection.body_text()))
    }
}

/// `Query` whose rejection is a field error under `query`.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| AppError::field("query", rejection.body_text()))
    }
}
