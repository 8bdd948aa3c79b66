//! Reviews and their comments.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::{
    db::{is_unique_violation, now_sec},
    entities::{comment, review, title, user},
    error::{AppError, AppResult},
    models::{
        CommentOut, CommentRequest, CreateReviewRequest, ReviewOut, UpdateReviewRequest,
    },
    pagination::{self, Page, PageRequest},
};

const ALREADY_REVIEWED: &str = "you have already reviewed this title";

#[derive(Clone)]
pub struct ReviewStore {
    db: DatabaseConnection,
}

impl ReviewStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_title(&self, title_id: i32) -> AppResult<()> {
        let exists = title::Entity::find_by_id(title_id).count(&self.db).await? > 0;
        if exists { Ok(()) } else { Err(AppError::NotFound("title")) }
    }

    async fn usernames(&self, ids: impl IntoIterator<Item = i32>) -> AppResult<HashMap<i32, String>> {
        let ids: Vec<i32> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect())
    }

    async fn username(&self, id: i32) -> AppResult<String> {
        self.usernames([id]).await?.remove(&id).ok_or(AppError::NotFound("user"))
    }

    pub async fn review_out(&self, model: review::Model) -> AppResult<ReviewOut> {
        let author = self.username(model.author_id).await?;
        ReviewOut::new(model, author)
    }

    pub async fn comment_out(&self, model: comment::Model) -> AppResult<CommentOut> {
        let author = self.username(model.author_id).await?;
        CommentOut::new(model, author)
    }

    pub async fn list_reviews(&self, title_id: i32, page: PageRequest) -> AppResult<Page<ReviewOut>> {
        self.ensure_title(title_id).await?;
        let select = review::Entity::find()
            .filter(review::Column::TitleId.eq(title_id))
            .order_by_asc(review::Column::PubDate)
            .order_by_asc(review::Column::Id);
        let page = pagination::fetch(&self.db, select, page).await?;
        let authors = self.usernames(page.results.iter().map(|r| r.author_id)).await?;
        page.map(|r| {
            let author = authors.get(&r.author_id).cloned().unwrap_or_default();
            ReviewOut::new(r, author)
        })
    }

    /// The review, provided it belongs to `title_id`.
    pub async fn review(&self, title_id: i32, review_id: i32) -> AppResult<review::Model> {
        self.ensure_title(title_id).await?;
        review::Entity::find_by_id(review_id)
            .filter(review::Column::TitleId.eq(title_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("review"))
    }

    pub async fn create_review(
        &self,
        title_id: i32,
        author_id: i32,
        req: CreateReviewRequest,
    ) -> AppResult<review::Model> {
        self.ensure_title(title_id).await?;

        let inserted = review::ActiveModel {
            title_id: Set(title_id),
            author_id: Set(author_id),
            text: Set(req.text),
            score: Set(req.score),
            pub_date: Set(now_sec()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(created) => {
                info!(review_id = created.id, title_id, author_id, score = created.score, "review created");
                Ok(created)
            },
            Err(err) if is_unique_violation(&err) => {
                Err(AppError::field("non_field_errors", ALREADY_REVIEWED))
            },
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_review(
        &self,
        existing: review::Model,
        req: UpdateReviewRequest,
    ) -> AppResult<review::Model> {
        let mut active: review::ActiveModel = existing.into();
        if let Some(text) = req.text {
            active.text = Set(text);
        }
        if let Some(score) = req.score {
            active.score = Set(score);
        }
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_review(&self, existing: review::Model) -> AppResult<()> {
        review::Entity::delete_by_id(existing.id).exec(&self.db).await?;
        info!(review_id = existing.id, title_id = existing.title_id, "review deleted");
        Ok(())
    }

    pub async fn list_comments(
        &self,
        title_id: i32,
        review_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<CommentOut>> {
        self.review(title_id, review_id).await?;
        let select = comment::Entity::find()
            .filter(comment::Column::ReviewId.eq(review_id))
            .order_by_asc(comment::Column::PubDate)
            .order_by_asc(comment::Column::Id);
        let page = pagination::fetch(&self.db, select, page).await?;
        let authors = self.usernames(page.results.iter().map(|c| c.author_id)).await?;
        page.map(|c| {
            let author = authors.get(&c.author_id).cloned().unwrap_or_default();
            CommentOut::new(c, author)
        })
    }

    /// The comment, provided it belongs to the review under `title_id`.
    pub async fn comment(
        &self,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
    ) -> AppResult<comment::Model> {
        self.review(title_id, review_id).await?;
        comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::ReviewId.eq(review_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("comment"))
    }

    pub async fn create_comment(
        &self,
        title_id: i32,
        review_id: i32,
        author_id: i32,
        req: CommentRequest,
    ) -> AppResult<comment::Model> {
        self.review(title_id, review_id).await?;
        let created = comment::ActiveModel {
            review_id: Set(review_id),
            author_id: Set(author_id),
            text: Set(req.text),
            pub_date: Set(now_sec()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        info!(comment_id = created.id, review_id, author_id, "comment created");
        Ok(created)
    }

    pub async fn update_comment(
        &self,
        existing: comment::Model,
        req: CommentRequest,
    ) -> AppResult<comment::Model> {
        let mut active: comment::ActiveModel = existing.into();
        active.text = Set(req.text);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_comment(&self, existing: comment::Model) -> AppResult<()> {
        comment::Entity::delete_by_id(existing.id).exec(&self.db).await?;
        info!(comment_id = existing.id, review_id = existing.review_id, "comment deleted");
        Ok(())
    }
}
