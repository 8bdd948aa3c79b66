use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
};

use super::{PathParams, Payload, QueryParams};
use crate::{
    AppState,
    catalog::Taxonomy,
    error::AppResult,
    models::{CreateTitleRequest, ListQuery, SlugEntry, TitleOut, TitleQuery, UpdateTitleRequest},
    pagination::{Page, PageRequest},
    policy::{Actor, ResourceKind, Target, authorize},
};

fn kind_of(taxonomy: Taxonomy) -> ResourceKind {
    match taxonomy {
        Taxonomy::Category => ResourceKind::Category,
        Taxonomy::Genre => ResourceKind::Genre,
    }
}

async fn list_entries(
    state: &AppState,
    taxonomy: Taxonomy,
    q: ListQuery,
) -> AppResult<Json<Page<SlugEntry>>> {
    let page = PageRequest::new(q.limit, q.offset, state.config.page_size);
    Ok(Json(state.catalog.list_entries(taxonomy, q.search.as_deref(), page).await?))
}

async fn create_entry(
    state: &AppState,
    actor: &Actor,
    taxonomy: Taxonomy,
    body: Payload<SlugEntry>,
) -> AppResult<(StatusCode, Json<SlugEntry>)> {
    authorize(actor, &Method::POST, &Target::Collection(kind_of(taxonomy)))?;
    let entry = body.into_valid()?;
    Ok((StatusCode::CREATED, Json(state.catalog.create_entry(taxonomy, entry).await?)))
}

async fn delete_entry(
    state: &AppState,
    actor: &Actor,
    taxonomy: Taxonomy,
    slug: &str,
) -> AppResult<StatusCode> {
    state.catalog.ensure_entry(taxonomy, slug).await?;
    authorize(actor, &Method::DELETE, &Target::object(kind_of(taxonomy)))?;
    state.catalog.delete_entry(taxonomy, slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<Page<SlugEntry>>> {
    list_entries(&state, Taxonomy::Category, q).await
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    body: Payload<SlugEntry>,
) -> AppResult<(StatusCode, Json<SlugEntry>)> {
    create_entry(&state, &actor, Taxonomy::Category, body).await
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(slug): PathParams<String>,
) -> AppResult<StatusCode> {
    delete_entry(&state, &actor, Taxonomy::Category, &slug).await
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<Page<SlugEntry>>> {
    list_entries(&state, Taxonomy::Genre, q).await
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    body: Payload<SlugEntry>,
) -> AppResult<(StatusCode, Json<SlugEntry>)> {
    create_entry(&state, &actor, Taxonomy::Genre, body).await
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(slug): PathParams<String>,
) -> AppResult<StatusCode> {
    delete_entry(&state, &actor, Taxonomy::Genre, &slug).await
}

pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    QueryParams(q): QueryParams<TitleQuery>,
) -> AppResult<Json<Page<TitleOut>>> {
    let page = PageRequest::new(q.limit, q.offset, state.config.page_size);
    Ok(Json(state.catalog.list_titles(&q, page).await?))
}

pub async fn create_title(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    body: Payload<CreateTitleRequest>,
) -> AppResult<(StatusCode, Json<TitleOut>)> {
    authorize(&actor, &Method::POST, &Target::Collection(ResourceKind::Title))?;
    let req = body.into_valid()?;
    Ok((StatusCode::CREATED, Json(state.catalog.create_title(req).await?)))
}

pub async fn get_title(
    State(state): State<Arc<AppState>>,
    PathParams(title_id): PathParams<i32>,
) -> AppResult<Json<TitleOut>> {
    Ok(Json(state.catalog.title(title_id).await?))
}

pub async fn update_title(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(title_id): PathParams<i32>,
    body: Payload<UpdateTitleRequest>,
) -> AppResult<Json<TitleOut>> {
    state.catalog.title_model(title_id).await?;
    authorize(&actor, &Method::PATCH, &Target::object(ResourceKind::Title))?;
    let req = body.into_valid()?;
    Ok(Json(state.catalog.update_title(title_id, req).await?))
}

pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    PathParams(title_id): PathParams<i32>,
) -> AppResult<StatusCode> {
    state.catalog.title_model(title_id).await?;
    authorize(&actor, &Method::DELETE, &Target::object(ResourceKind::Title))?;
    state.catalog.delete_title(title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
