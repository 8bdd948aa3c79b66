use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tracing::{debug, info};

use crate::{
    db::{is_unique_violation, now_sec},
    entities::user,
    error::{AppError, AppResult, FieldErrors},
    models::{CreateUserRequest, UpdateUserRequest},
    pagination::{self, Page, PageRequest},
    policy::{Principal, Role},
    signup::{self, SignupState},
};

const USERNAME_TAKEN: &str = "a user with that username already exists";
const EMAIL_TAKEN: &str = "a user with that email already exists";

impl From<&user::Model> for Principal {
    fn from(m: &user::Model) -> Self {
        Principal { id: m.id, role: Role::from_stored(&m.role), is_superuser: m.is_superuser }
    }
}

#[derive(Clone)]
pub struct UserStore {
    db: DatabaseConnection,
    code_ttl_secs: i64,
}

impl UserStore {
    pub fn new(db: DatabaseConnection, code_ttl_secs: i64) -> Self {
        Self { db, code_ttl_secs }
    }

    pub async fn by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find().filter(user::Column::Username.eq(username)).one(&self.db).await?)
    }

    pub async fn get(&self, username: &str) -> AppResult<user::Model> {
        self.by_username(username).await?.ok_or(AppError::NotFound("user"))
    }

    async fn by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find().filter(user::Column::Email.eq(email)).one(&self.db).await?)
    }

    /// Registers `(username, email)` or, when exactly that pair already
    /// exists, re-issues its confirmation code. Returns the actor and the
    /// plain code to deliver.
    pub async fn signup(&self, username: &str, email: &str) -> AppResult<(user::Model, String)> {
        signup::validate_username(username)?;

        if let Some(existing) = self.same_pair(username, email).await? {
            debug!(username, state = ?SignupState::of(Some(&existing)), "repeated signup");
            return self.rotate_code(existing).await;
        }

        let (code, hash) = signup::issue_code();
        let now = now_sec();
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            bio: Set(String::new()),
            role: Set(Role::User.as_str().to_string()),
            is_superuser: Set(false),
            confirmation_code_hash: Set(Some(hash)),
            confirmation_expires_at: Set(Some(now + self.code_ttl_secs)),
            confirmed_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(user) => {
                info!(user_id = user.id, username, "signup pending confirmation");
                Ok((user, code))
            },
            // A concurrent signup got there first; the index decided, re-read the winner.
            Err(err) if is_unique_violation(&err) => match self.same_pair(username, email).await? {
                Some(existing) => self.rotate_code(existing).await,
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }

    /// The actor owning both `username` and `email`, `None` if neither is
    /// taken, and a conflict if they are taken separately.
    async fn same_pair(&self, username: &str, email: &str) -> AppResult<Option<user::Model>> {
        let by_name = self.by_username(username).await?;
        let by_email = self.by_email(email).await?;
        match (by_name, by_email) {
            (None, None) => Ok(None),
            (Some(a), Some(b)) if a.id == b.id => Ok(Some(a)),
            (a, b) => Err(taken(a.is_some(), b.is_some())),
        }
    }

    async fn rotate_code(&self, user: user::Model) -> AppResult<(user::Model, String)> {
        let (code, hash) = signup::issue_code();
        let mut active: user::ActiveModel = user.into();
        active.confirmation_code_hash = Set(Some(hash));
        active.confirmation_expires_at = Set(Some(now_sec() + self.code_ttl_secs));
        let user = active.update(&self.db).await?;
        Ok((user, code))
    }

    /// Exchanges a confirmation code for activation. The code is consumed.
    pub async fn confirm(&self, user: user::Model, code: &str) -> AppResult<user::Model> {
        let now = now_sec();
        signup::check_code(&user, code, now)?;

        let Some(stored) = user.confirmation_code_hash.clone() else {
            return Err(AppError::field("confirmation_code", "invalid or expired confirmation code"));
        };

        // Conditional on the code still being the one we checked, so a code
        // can only be spent once even under concurrent requests.
        let res = user::Entity::update_many()
            .col_expr(user::Column::ConfirmationCodeHash, Expr::value(Option::<String>::None))
            .col_expr(user::Column::ConfirmationExpiresAt, Expr::value(Option::<i64>::None))
            .col_expr(user::Column::ConfirmedAt, Expr::value(user.confirmed_at.unwrap_or(now)))
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::ConfirmationCodeHash.eq(stored))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::field("confirmation_code", "invalid or expired confirmation code"));
        }

        info!(user_id = user.id, username = %user.username, "confirmation accepted");
        self.by_id(user.id).await?.ok_or(AppError::NotFound("user"))
    }

    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<user::Model>> {
        let mut select = user::Entity::find().order_by_asc(user::Column::Username);
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(user::Column::Username.contains(term));
        }
        pagination::fetch(&self.db, select, page).await
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<user::Model> {
        signup::validate_username(&req.username)?;

        let model = user::ActiveModel {
            username: Set(req.username.clone()),
            email: Set(req.email.clone()),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            bio: Set(req.bio),
            role: Set(req.role.as_str().to_string()),
            is_superuser: Set(false),
            confirmation_code_hash: Set(None),
            confirmation_expires_at: Set(None),
            confirmed_at: Set(None),
            created_at: Set(now_sec()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, role = %req.role, "user created");
                Ok(user)
            },
            Err(err) if is_unique_violation(&err) => {
                Err(self.conflict_for(&req.username, &req.email, None).await?)
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Applies a partial update. `role` is ignored unless `may_set_role`.
    pub async fn update(
        &self,
        user: user::Model,
        req: UpdateUserRequest,
        may_set_role: bool,
    ) -> AppResult<user::Model> {
        if let Some(username) = &req.username {
            signup::validate_username(username)?;
        }

        let id = user.id;
        let username = req.username.clone().unwrap_or_else(|| user.username.clone());
        let email = req.email.clone().unwrap_or_else(|| user.email.clone());

        let mut active: user::ActiveModel = user.into();
        if let Some(v) = req.username {
            active.username = Set(v);
        }
        if let Some(v) = req.email {
            active.email = Set(v);
        }
        if let Some(v) = req.first_name {
            active.first_name = Set(v);
        }
        if let Some(v) = req.last_name {
            active.last_name = Set(v);
        }
        if let Some(v) = req.bio {
            active.bio = Set(v);
        }
        if let Some(role) = req.role.filter(|_| may_set_role) {
            active.role = Set(role.as_str().to_string());
        }

        match active.update(&self.db).await {
            Ok(user) => Ok(user),
            Err(err) if is_unique_violation(&err) => {
                Err(self.conflict_for(&username, &email, Some(id)).await?)
            },
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, username: &str) -> AppResult<()> {
        let user = self.get(username).await?;
        user::Entity::delete_by_id(user.id).exec(&self.db).await?;
        info!(user_id = user.id, username, "user deleted");
        Ok(())
    }

    /// Creates an active superuser, or promotes the existing actor with
    /// that username.
    pub async fn ensure_superuser(&self, username: &str, email: &str) -> AppResult<user::Model> {
        signup::validate_username(username)?;
        let now = now_sec();

        let saved = match self.by_username(username).await? {
            Some(existing) => {
                let confirmed_at = existing.confirmed_at.unwrap_or(now);
                let mut active: user::ActiveModel = existing.into();
                active.email = Set(email.to_string());
                active.role = Set(Role::Admin.as_str().to_string());
                active.is_superuser = Set(true);
                active.confirmed_at = Set(Some(confirmed_at));
                active.update(&self.db).await
            },
            None => {
                user::ActiveModel {
                    username: Set(username.to_string()),
                    email: Set(email.to_string()),
                    first_name: Set(String::new()),
                    last_name: Set(String::new()),
                    bio: Set(String::new()),
                    role: Set(Role::Admin.as_str().to_string()),
                    is_superuser: Set(true),
                    confirmation_code_hash: Set(None),
                    confirmation_expires_at: Set(None),
                    confirmed_at: Set(Some(now)),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
            },
        };

        match saved {
            Ok(user) => {
                info!(user_id = user.id, username, "superuser ready");
                Ok(user)
            },
            Err(err) if is_unique_violation(&err) => Err(taken(false, true)),
            Err(err) => Err(err.into()),
        }
    }

    async fn conflict_for(&self, username: &str, email: &str, exclude: Option<i32>) -> AppResult<AppError> {
        let other = |m: Option<user::Model>| m.is_some_and(|m| Some(m.id) != exclude);
        let name_taken = other(self.by_username(username).await?);
        let email_taken = other(self.by_email(email).await?);
        Ok(taken(name_taken, email_taken))
    }
}

fn taken(username: bool, email: bool) -> AppError {
    let mut fields = FieldErrors::new();
    if username {
        fields.insert("username".to_string(), vec![USERNAME_TAKEN.to_string()]);
    }
    if email {
        fields.insert("email".to_string(), vec![EMAIL_TAKEN.to_string()]);
    }
    AppError::Conflict(fields)
}
