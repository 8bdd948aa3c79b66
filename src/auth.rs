use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::{task::JoinHandle, time::interval};

use crate::{
    AppState,
    error::AppError,
    policy::{Actor, Principal},
    signup::SignupState,
};

/// Confirmation attempts, keyed by the id of an existing actor.
pub type AttemptLimiter = DefaultKeyedRateLimiter<i32>;

pub fn attempt_limiter(per_minute: u32) -> AttemptLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

/// Periodically forgets actors whose attempt budget has fully refilled.
pub fn spawn_attempt_gc(limiter: Arc<AttemptLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::debug!(tracked = limiter.len(), "confirmation limiter pruned");
        }
    })
}

/// No `Authorization` header means an anonymous actor; a header that does
/// not carry a valid token for an active actor is rejected outright.
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Actor::Anonymous);
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let user_id = state.tokens.verify(bearer.token())?;
        let user = state.users.by_id(user_id).await?.ok_or(AppError::Unauthorized)?;
        if SignupState::of(Some(&user)) != SignupState::Active {
            return Err(AppError::Unauthorized);
        }

        Ok(Actor::Authenticated(Principal::from(&user)))
    }
}
