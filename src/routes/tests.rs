use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, sea_query::Expr,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{
    AppState,
    config::Config,
    db,
    db::now_sec,
    entities::{comment, review, title_genre, user},
    mail::testing::MemoryMailer,
};

struct Harness {
    app: Router,
    state: Arc<AppState>,
    mailer: Arc<MemoryMailer>,
    db: DatabaseConnection,
}

async fn harness() -> Harness {
    let config = Arc::new(Config::for_tests());
    let db = db::connect_and_migrate(&config.database_url).await.expect("test database");
    let mailer = Arc::new(MemoryMailer::default());
    let state = Arc::new(AppState::new(config, db.clone(), mailer.clone()));
    Harness { app: super::router(state.clone()), state, mailer, db }
}

impl Harness {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(format!("/api/v1{uri}"));
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("request");

        let resp = self.app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call("GET", uri, token, None).await
    }

    async fn signup(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.call("POST", "/auth/signup/", None, Some(json!({ "username": username, "email": email })))
            .await
    }

    /// Signs up, confirms and returns an access token.
    async fn register(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let (status, _) = self.signup(username, &email).await;
        assert_eq!(status, StatusCode::OK);
        let code = self.mailer.last_code_for(&email).expect("confirmation mail");
        let (status, body) = self
            .call(
                "POST",
                "/auth/token/",
                None,
                Some(json!({ "username": username, "confirmation_code": code })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().expect("token").to_string()
    }

    async fn set_role(&self, username: &str, role: &str) {
        user::Entity::update_many()
            .col_expr(user::Column::Role, Expr::value(role))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await
            .expect("role update");
    }

    async fn rows<E>(&self) -> u64
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        E::find().count(&self.db).await.expect("row count")
    }

    async fn admin(&self) -> String {
        let admin = self.state.users.ensure_superuser("root", "root@example.com").await.unwrap();
        self.state.tokens.issue(admin.id, now_sec()).unwrap()
    }

    async fn seed_title(&self, admin: &str) -> i64 {
        self.call("POST", "/categories/", Some(admin), Some(json!({ "name": "Film", "slug": "film" })))
            .await;
        self.call("POST", "/genres/", Some(admin), Some(json!({ "name": "Drama", "slug": "drama" })))
            .await;
        let (status, body) = self
            .call(
                "POST",
                "/titles/",
                Some(admin),
                Some(json!({
                    "name": "Solaris",
                    "year": 1972,
                    "category": "film",
                    "genre": ["drama"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("title id")
    }
}

#[tokio::test]
async fn signup_then_confirm_issues_single_use_token() {
    let h = harness().await;
    let (status, body) = h.signup("bob", "bob@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": "bob", "email": "bob@example.com" }));

    let code = h.mailer.last_code_for("bob@example.com").unwrap();
    let token_req = |code: &str| json!({ "username": "bob", "confirmation_code": code });

    let (status, _) = h.call("POST", "/auth/token/", None, Some(token_req("wrong"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.call("POST", "/auth/token/", None, Some(token_req(&code))).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = h.call("POST", "/auth/token/", None, Some(token_req(&code))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "a code is spent on first use");

    let (status, me) = h.get("/users/me/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "bob");
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn token_for_unknown_user_is_not_found() {
    let h = harness().await;
    let (status, _) = h
        .call(
            "POST",
            "/auth/token/",
            None,
            Some(json!({ "username": "ghost", "confirmation_code": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_rejects_reserved_and_malformed_usernames() {
    let h = harness().await;
    for name in ["me", "ME", "bob!"] {
        let (status, body) = h.signup(name, "x@example.com").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{name}");
        assert!(body["errors"]["username"].is_array());
    }
    let (status, body) = h.signup("alice", "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn repeated_signup_is_idempotent_but_split_pairs_conflict() {
    let h = harness().await;
    assert_eq!(h.signup("bob", "bob@example.com").await.0, StatusCode::OK);
    let first = h.mailer.last_code_for("bob@example.com").unwrap();

    assert_eq!(h.signup("bob", "bob@example.com").await.0, StatusCode::OK);
    let second = h.mailer.last_code_for("bob@example.com").unwrap();
    assert_ne!(first, second, "re-signup rotates the code");

    let (status, body) = h.signup("bob", "other@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errors"]["username"].is_array());
    assert!(body["errors"].get("email").is_none());

    let (status, body) = h.signup("robert", "bob@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errors"]["email"].is_array());

    let (_, stale) = h
        .call(
            "POST",
            "/auth/token/",
            None,
            Some(json!({ "username": "bob", "confirmation_code": first })),
        )
        .await;
    assert!(stale["errors"]["confirmation_code"].is_array());
}

#[tokio::test]
async fn confirmation_attempts_are_rate_limited() {
    let h = harness().await;
    h.signup("bob", "bob@example.com").await;
    let attempt = json!({ "username": "bob", "confirmation_code": "nope" });
    for _ in 0..3 {
        let (status, _) = h.call("POST", "/auth/token/", None, Some(attempt.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, _) = h.call("POST", "/auth/token/", None, Some(attempt)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unknown_usernames_are_not_tracked_by_the_limiter() {
    let h = harness().await;
    for i in 0..20 {
        let attempt = json!({ "username": format!("ghost{i}"), "confirmation_code": "x" });
        let (status, _) = h.call("POST", "/auth/token/", None, Some(attempt)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    assert_eq!(h.state.attempts.len(), 0);

    h.signup("bob", "bob@example.com").await;
    let attempt = json!({ "username": "bob", "confirmation_code": "nope" });
    h.call("POST", "/auth/token/", None, Some(attempt)).await;
    assert_eq!(h.state.attempts.len(), 1);
}

#[tokio::test]
async fn catalog_is_public_to_read_and_admin_only_to_write() {
    let h = harness().await;
    let admin = h.admin().await;
    let user = h.register("bob").await;
    let moderator = h.register("mod").await;
    h.set_role("mod", "moderator").await;

    let entry = json!({ "name": "Film", "slug": "film" });
    assert_eq!(h.call("POST", "/categories/", None, Some(entry.clone())).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(h.call("POST", "/categories/", Some(&user), Some(entry.clone())).await.0, StatusCode::FORBIDDEN);
    assert_eq!(
        h.call("POST", "/categories/", Some(&moderator), Some(entry.clone())).await.0,
        StatusCode::FORBIDDEN
    );
    assert_eq!(h.call("POST", "/categories/", Some(&admin), Some(entry.clone())).await.0, StatusCode::CREATED);
    assert_eq!(h.call("POST", "/categories/", Some(&admin), Some(entry)).await.0, StatusCode::CONFLICT);

    let (status, body) = h.get("/categories/?search=Fi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["slug"], "film");

    assert_eq!(h.call("DELETE", "/categories/film/", Some(&user), None).await.0, StatusCode::FORBIDDEN);
    assert_eq!(h.call("DELETE", "/categories/nope/", Some(&user), None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(h.call("DELETE", "/categories/film/", Some(&admin), None).await.0, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn title_rating_is_mean_of_reviews_and_null_without_them() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;

    let (_, title) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(title["rating"], Value::Null);
    assert_eq!(title["category"], json!({ "name": "Film", "slug": "film" }));
    assert_eq!(title["genre"], json!([{ "name": "Drama", "slug": "drama" }]));

    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let reviews = format!("/titles/{title_id}/reviews/");
    for (token, score) in [(&alice, 8), (&bob, 10)] {
        let (status, body) =
            h.call("POST", &reviews, Some(token), Some(json!({ "text": "ok", "score": score }))).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, title) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(title["rating"], 9);
    let (_, again) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(again["rating"], title["rating"]);

    let (_, listed) = h.get("/titles/?genre=drama&category=film", None).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["results"][0]["rating"], 9);
    let (_, none) = h.get("/titles/?genre=comedy", None).await;
    assert_eq!(none["count"], 0);
}

#[tokio::test]
async fn one_review_per_title_and_author() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let bob = h.register("bob").await;
    let reviews = format!("/titles/{title_id}/reviews/");

    let review = json!({ "text": "great", "score": 9 });
    assert_eq!(h.call("POST", &reviews, Some(&bob), Some(review.clone())).await.0, StatusCode::CREATED);
    let (status, body) = h.call("POST", &reviews, Some(&bob), Some(review)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"].is_array());

    let (status, _) =
        h.call("POST", &reviews, Some(&bob), Some(json!({ "text": "x", "score": 11 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = h.call("POST", &reviews, None, Some(json!({ "text": "x", "score": 5 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) =
        h.call("POST", "/titles/999/reviews/", Some(&bob), Some(json!({ "text": "x", "score": 5 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_author_or_moderator_may_change_a_review() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let author = h.register("author").await;
    let other = h.register("other").await;
    let moderator = h.register("mod").await;
    h.set_role("mod", "moderator").await;

    let (_, review) = h
        .call(
            "POST",
            &format!("/titles/{title_id}/reviews/"),
            Some(&author),
            Some(json!({ "text": "fine", "score": 6 })),
        )
        .await;
    let review_uri = format!("/titles/{title_id}/reviews/{}/", review["id"]);
    let comments_uri = format!("{review_uri}comments/");

    let (status, comment) =
        h.call("POST", &comments_uri, Some(&other), Some(json!({ "text": "disagree" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author"], "other");
    let comment_uri = format!("{comments_uri}{}/", comment["id"]);

    let edit = json!({ "score": 7 });
    assert_eq!(h.call("PATCH", &review_uri, Some(&other), Some(edit.clone())).await.0, StatusCode::FORBIDDEN);
    assert_eq!(h.call("PATCH", &review_uri, None, Some(edit.clone())).await.0, StatusCode::UNAUTHORIZED);
    let (status, body) = h.call("PATCH", &review_uri, Some(&author), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 7);

    let (status, _) =
        h.call("PATCH", &comment_uri, Some(&author), Some(json!({ "text": "edited" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        h.call("PATCH", &comment_uri, Some(&moderator), Some(json!({ "text": "[removed]" }))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(h.rows::<comment::Entity>().await, 1);
    assert_eq!(h.call("DELETE", &review_uri, Some(&moderator), None).await.0, StatusCode::NO_CONTENT);
    assert_eq!(h.rows::<comment::Entity>().await, 0, "comments go with their review");
    assert_eq!(h.get(&comment_uri, None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(h.get(&review_uri, None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_under_wrong_title_is_not_found() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let (_, other_title) = h
        .call("POST", "/titles/", Some(&admin), Some(json!({ "name": "Stalker", "year": 1979 })))
        .await;
    let bob = h.register("bob").await;
    let (_, review) = h
        .call(
            "POST",
            &format!("/titles/{title_id}/reviews/"),
            Some(&bob),
            Some(json!({ "text": "t", "score": 5 })),
        )
        .await;

    let (status, _) = h.get(&format!("/titles/{}/reviews/{}/", other_title["id"], review["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_category_keeps_titles_and_title_delete_cascades() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let bob = h.register("bob").await;
    let reviews = format!("/titles/{title_id}/reviews/");
    h.call("POST", &reviews, Some(&bob), Some(json!({ "text": "t", "score": 4 }))).await;

    assert_eq!(h.call("DELETE", "/categories/film/", Some(&admin), None).await.0, StatusCode::NO_CONTENT);
    let (status, title) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(title["category"], Value::Null);
    assert_eq!(title["rating"], 4);

    assert_eq!(
        h.call("DELETE", &format!("/titles/{title_id}/"), Some(&admin), None).await.0,
        StatusCode::NO_CONTENT
    );
    assert_eq!(h.get(&reviews, None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn title_year_and_references_are_validated() {
    let h = harness().await;
    let admin = h.admin().await;

    let (status, body) = h
        .call("POST", "/titles/", Some(&admin), Some(json!({ "name": "Future", "year": 9999 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["year"].is_array());

    let (status, body) = h
        .call(
            "POST",
            "/titles/",
            Some(&admin),
            Some(json!({ "name": "Lost", "year": 2000, "genre": ["missing"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["genre"].is_array());
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let h = harness().await;
    let admin = h.admin().await;
    let bob = h.register("bob").await;
    let moderator = h.register("mod").await;
    h.set_role("mod", "moderator").await;

    assert_eq!(h.get("/users/", None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(h.get("/users/", Some(&bob)).await.0, StatusCode::FORBIDDEN);
    assert_eq!(h.get("/users/", Some(&moderator)).await.0, StatusCode::FORBIDDEN);
    assert_eq!(h.get("/users/nobody/", Some(&bob)).await.0, StatusCode::FORBIDDEN);

    let (status, body) = h.get("/users/?search=bo", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, created) = h
        .call(
            "POST",
            "/users/",
            Some(&admin),
            Some(json!({ "username": "carol", "email": "carol@example.com", "role": "moderator" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "moderator");

    let (status, _) = h
        .call(
            "POST",
            "/users/",
            Some(&admin),
            Some(json!({ "username": "carol", "email": "c2@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, patched) =
        h.call("PATCH", "/users/bob/", Some(&admin), Some(json!({ "role": "admin" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["role"], "admin");

    assert_eq!(h.call("DELETE", "/users/carol/", Some(&admin), None).await.0, StatusCode::NO_CONTENT);
    assert_eq!(h.get("/users/carol/", Some(&admin)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn own_profile_edits_cannot_change_role() {
    let h = harness().await;
    let bob = h.register("bob").await;
    let (status, body) = h
        .call("PATCH", "/users/me/", Some(&bob), Some(json!({ "bio": "hi", "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "hi");
    assert_eq!(body["role"], "user");
    assert_eq!(h.get("/users/me/", None).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_stored_role_gets_least_privilege() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let author = h.register("author").await;
    let odd = h.register("odd").await;
    h.set_role("odd", "superadmin").await;

    let (_, review) = h
        .call(
            "POST",
            &format!("/titles/{title_id}/reviews/"),
            Some(&author),
            Some(json!({ "text": "t", "score": 5 })),
        )
        .await;
    let review_uri = format!("/titles/{title_id}/reviews/{}/", review["id"]);

    assert_eq!(h.call("DELETE", &review_uri, Some(&odd), None).await.0, StatusCode::FORBIDDEN);
    let (status, _) = h
        .call("POST", "/genres/", Some(&odd), Some(json!({ "name": "Noir", "slug": "noir" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, me) = h.get("/users/me/", Some(&odd)).await;
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn malformed_bearer_token_is_rejected() {
    let h = harness().await;
    assert_eq!(h.get("/users/me/", Some("not-a-jwt")).await.0, StatusCode::UNAUTHORIZED);
    let entry = json!({ "name": "Film", "slug": "film" });
    let (status, _) = h.call("POST", "/categories/", Some("not-a-jwt"), Some(entry)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.get("/titles/", None).await.0, StatusCode::OK);
}

#[tokio::test]
async fn deleting_an_actor_removes_their_reviews_and_comments() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    let author = h.register("author").await;
    let other = h.register("other").await;
    let reviews = format!("/titles/{title_id}/reviews/");

    let (_, mine) =
        h.call("POST", &reviews, Some(&author), Some(json!({ "text": "a", "score": 2 }))).await;
    let (_, theirs) =
        h.call("POST", &reviews, Some(&other), Some(json!({ "text": "b", "score": 8 }))).await;
    let on_theirs = format!("{reviews}{}/comments/", theirs["id"]);
    let on_mine = format!("{reviews}{}/comments/", mine["id"]);
    h.call("POST", &on_theirs, Some(&author), Some(json!({ "text": "by author" }))).await;
    h.call("POST", &on_mine, Some(&other), Some(json!({ "text": "on author's review" }))).await;
    assert_eq!(h.rows::<review::Entity>().await, 2);
    assert_eq!(h.rows::<comment::Entity>().await, 2);

    assert_eq!(h.call("DELETE", "/users/author/", Some(&admin), None).await.0, StatusCode::NO_CONTENT);
    assert_eq!(h.rows::<review::Entity>().await, 1);
    assert_eq!(h.rows::<comment::Entity>().await, 0);

    let (_, title) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(title["rating"], 8);
}

#[tokio::test]
async fn deleting_a_genre_unlinks_its_titles() {
    let h = harness().await;
    let admin = h.admin().await;
    let title_id = h.seed_title(&admin).await;
    assert_eq!(h.rows::<title_genre::Entity>().await, 1);

    assert_eq!(h.call("DELETE", "/genres/drama/", Some(&admin), None).await.0, StatusCode::NO_CONTENT);
    assert_eq!(h.rows::<title_genre::Entity>().await, 0);

    let (status, title) = h.get(&format!("/titles/{title_id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(title["genre"], json!([]));
}

#[tokio::test]
async fn own_profile_cannot_take_another_actors_username_or_email() {
    let h = harness().await;
    let bob = h.register("bob").await;
    h.register("alice").await;

    let (status, body) =
        h.call("PATCH", "/users/me/", Some(&bob), Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errors"]["username"].is_array());

    let (status, body) = h
        .call("PATCH", "/users/me/", Some(&bob), Some(json!({ "email": "alice@example.com" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"].get("username").is_none());

    let (_, me) = h.get("/users/me/", Some(&bob)).await;
    assert_eq!(me["username"], "bob");
    assert_eq!(me["email"], "bob@example.com");
}

#[tokio::test]
async fn malformed_path_and_query_values_are_field_errors() {
    let h = harness().await;
    let (status, body) = h.get("/titles/abc/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["path"].is_array());

    let (status, body) = h.get("/titles/?year=x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["query"].is_array());

    let (status, body) = h.get("/titles/1/reviews/?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["query"].is_array());
}
