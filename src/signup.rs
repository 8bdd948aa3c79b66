//! Identity rules and the signup/confirmation state machine.
//!
//! `Unregistered -> PendingConfirmation -> Active`. A signup issues a mailed,
//! single-use confirmation code; presenting it with the username activates
//! the actor and clears the code.

use rand::{Rng, distributions::Alphanumeric};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{
    entities::user,
    error::{AppError, AppResult},
};

pub const USERNAME_MAX_LEN: usize = 150;
const RESERVED_USERNAME: &str = "me";
const CODE_LEN: usize = 24;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignupState {
    Unregistered,
    PendingConfirmation,
    Active,
}

impl SignupState {
    pub fn of(user: Option<&user::Model>) -> Self {
        match user {
            None => SignupState::Unregistered,
            Some(u) if u.confirmed_at.is_some() => SignupState::Active,
            Some(_) => SignupState::PendingConfirmation,
        }
    }
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::field("username", "this field may not be blank"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(AppError::field(
            "username",
            format!("ensure this field has no more than {USERNAME_MAX_LEN} characters"),
        ));
    }
    if username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(AppError::field("username", format!("username {username:?} is reserved")));
    }

    let invalid: Vec<String> =
        username.chars().filter(|c| !is_username_char(*c)).map(|c| c.to_string()).collect();
    if !invalid.is_empty() {
        return Err(AppError::field(
            "username",
            format!("username contains invalid characters: {}", invalid.join(", ")),
        ));
    }
    Ok(())
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_')
}

/// A fresh confirmation code and the hash to store for it.
pub fn issue_code() -> (String, String) {
    let code: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(CODE_LEN).map(char::from).collect();
    let hash = hash_code(&code);
    (code, hash)
}

pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Checks a presented code against the actor's current code state.
pub fn check_code(user: &user::Model, code: &str, now: i64) -> AppResult<()> {
    let invalid = || AppError::field("confirmation_code", "invalid or expired confirmation code");

    let (Some(stored), Some(expires_at)) =
        (user.confirmation_code_hash.as_deref(), user.confirmation_expires_at)
    else {
        return Err(invalid());
    };
    if now > expires_at {
        return Err(invalid());
    }
    let matches: bool = stored.as_bytes().ct_eq(hash_code(code).as_bytes()).into();
    if !matches {
        return Err(invalid());
    }
    Ok(())
}
