use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    entities::{category, comment, genre, review, user},
    error::AppResult,
    policy::Role,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email(message = "enter a valid email address"), length(max = 254))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<user::Model> for UserOut {
    fn from(m: user::Model) -> Self {
        Self {
            role: Role::from_stored(&m.role),
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            bio: m.bio,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email(message = "enter a valid email address"), length(max = 254))]
    pub email: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(email(message = "enter a valid email address"), length(max = 254))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Category and genre representation, both read and write.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Validate)]
pub struct SlugEntry {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub slug: String,
}

impl From<category::Model> for SlugEntry {
    fn from(m: category::Model) -> Self {
        Self { name: m.name, slug: m.slug }
    }
}

impl From<genre::Model> for SlugEntry {
    fn from(m: genre::Model) -> Self {
        Self { name: m.name, slug: m.slug }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleOut {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: Option<SlugEntry>,
    pub genre: Vec<SlugEntry>,
    pub rating: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ReviewOut {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub score: i32,
    pub pub_date: Timestamp,
}

impl ReviewOut {
    pub fn new(m: review::Model, author: String) -> AppResult<Self> {
        Ok(Self {
            id: m.id,
            text: m.text,
            author,
            score: m.score,
            pub_date: Timestamp::from_second(m.pub_date)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CommentOut {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub pub_date: Timestamp,
}

impl CommentOut {
    pub fn new(m: comment::Model, author: String) -> AppResult<Self> {
        Ok(Self { id: m.id, text: m.text, author, pub_date: Timestamp::from_second(m.pub_date)? })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleQuery {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
