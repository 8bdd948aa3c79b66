//! Role model and permission evaluation.
//!
//! Every actor resolves to a [`Capabilities`] set and each rule is a
//! membership check against it. Denial is an ordinary `false`; callers
//! that need an error use [`authorize`].

use std::{fmt, str::FromStr};

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Lenient decoding for values read back from storage: anything that is
    /// not a known role is the least-privileged one.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(role = %raw, "unknown stored role, treating as user");
            Role::User
        })
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct UnknownRole;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    /// Create reviews and comments, edit what one authored, manage one's profile.
    pub const AUTHOR_CONTENT: Self = Self(1 << 0);
    /// Edit or delete any review or comment.
    pub const MODERATE_CONTENT: Self = Self(1 << 1);
    /// Write categories, genres and titles.
    pub const MANAGE_CATALOG: Self = Self(1 << 2);
    /// List, create, edit and delete actors, including role assignment.
    pub const MANAGE_ACTORS: Self = Self(1 << 3);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn for_role(role: Role, is_superuser: bool) -> Self {
        const USER: Capabilities = Capabilities::AUTHOR_CONTENT;
        const MODERATOR: Capabilities = USER.union(Capabilities::MODERATE_CONTENT);
        const ADMIN: Capabilities = MODERATOR
            .union(Capabilities::MANAGE_CATALOG)
            .union(Capabilities::MANAGE_ACTORS);

        if is_superuser {
            return ADMIN;
        }
        match role {
            Role::User => USER,
            Role::Moderator => MODERATOR,
            Role::Admin => ADMIN,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
    pub is_superuser: bool,
}

impl Principal {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.role, self.is_superuser)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Actor {
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn id(&self) -> Option<i32> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(p) => Some(p.id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Actor::Anonymous => Capabilities::NONE,
            Actor::Authenticated(p) => p.capabilities(),
        }
    }

    pub fn can(&self, caps: Capabilities) -> bool {
        self.capabilities().contains(caps)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    /// Other actors' records.
    Actor,
    /// The requesting actor's own record.
    OwnProfile,
}

impl ResourceKind {
    pub fn is_public(self) -> bool {
        matches!(
            self,
            ResourceKind::Category
                | ResourceKind::Genre
                | ResourceKind::Title
                | ResourceKind::Review
                | ResourceKind::Comment
        )
    }

    fn has_author(self) -> bool {
        matches!(self, ResourceKind::Review | ResourceKind::Comment)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Collection(ResourceKind),
    Object { kind: ResourceKind, author_id: Option<i32> },
}

impl Target {
    pub fn object(kind: ResourceKind) -> Self {
        Target::Object { kind, author_id: None }
    }

    pub fn authored(kind: ResourceKind, author_id: i32) -> Self {
        Target::Object { kind, author_id: Some(author_id) }
    }

    fn kind(&self) -> ResourceKind {
        match *self {
            Target::Collection(kind) | Target::Object { kind, .. } => kind,
        }
    }
}

pub fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub fn evaluate(actor: &Actor, method: &Method, target: &Target) -> bool {
    let kind = target.kind();
    if !collection_allows(actor, method, kind) {
        return false;
    }

    match *target {
        Target::Collection(_) => true,
        Target::Object { author_id, .. } => {
            if is_safe(method) || !kind.has_author() {
                return true;
            }
            let is_author = matches!((actor.id(), author_id), (Some(a), Some(b)) if a == b);
            is_author || actor.can(Capabilities::MODERATE_CONTENT)
        },
    }
}

fn collection_allows(actor: &Actor, method: &Method, kind: ResourceKind) -> bool {
    if is_safe(method) && kind.is_public() {
        return true;
    }
    match kind {
        ResourceKind::Category | ResourceKind::Genre | ResourceKind::Title => {
            actor.can(Capabilities::MANAGE_CATALOG)
        },
        ResourceKind::Review | ResourceKind::Comment | ResourceKind::OwnProfile => {
            actor.can(Capabilities::AUTHOR_CONTENT)
        },
        ResourceKind::Actor => actor.can(Capabilities::MANAGE_ACTORS),
    }
}

/// [`evaluate`], mapping a denial to 401 for anonymous actors and 403 otherwise.
pub fn authorize(actor: &Actor, method: &Method, target: &Target) -> AppResult<()> {
    if evaluate(actor, method, target) {
        return Ok(());
    }
    tracing::debug!(?actor, %method, ?target, "permission denied");
    if actor.is_authenticated() { Err(AppError::PermissionDenied) } else { Err(AppError::Unauthorized) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn user(id: i32, role: Role) -> Actor {
        Actor::Authenticated(Principal { id, role, is_superuser: false })
    }

    fn superuser(id: i32) -> Actor {
        Actor::Authenticated(Principal { id, role: Role::User, is_superuser: true })
    }

    #[rstest]
    #[case(Actor::Anonymous)]
    #[case(user(1, Role::User))]
    #[case(user(2, Role::Moderator))]
    #[case(user(3, Role::Admin))]
    #[case(superuser(4))]
    fn safe_methods_on_public_resources_are_allowed(#[case] actor: Actor) {
        for kind in [
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Title,
            ResourceKind::Review,
            ResourceKind::Comment,
        ] {
            for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
                assert!(evaluate(&actor, &method, &Target::Collection(kind)));
                assert!(evaluate(&actor, &method, &Target::authored(kind, 99)));
            }
        }
    }

    #[rstest]
    #[case(ResourceKind::Category)]
    #[case(ResourceKind::Genre)]
    #[case(ResourceKind::Title)]
    #[case(ResourceKind::Review)]
    #[case(ResourceKind::Comment)]
    #[case(ResourceKind::Actor)]
    #[case(ResourceKind::OwnProfile)]
    fn anonymous_cannot_write(#[case] kind: ResourceKind) {
        for method in [Method::POST, Method::PATCH, Method::PUT, Method::DELETE] {
            assert!(!evaluate(&Actor::Anonymous, &method, &Target::Collection(kind)));
        }
        assert_eq!(
            authorize(&Actor::Anonymous, &Method::POST, &Target::Collection(kind)).unwrap_err().status(),
            axum::http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn author_may_delete_own_review_other_users_may_not() {
        let review = Target::authored(ResourceKind::Review, 7);
        assert!(evaluate(&user(7, Role::User), &Method::DELETE, &review));
        assert!(evaluate(&user(7, Role::User), &Method::PATCH, &review));
        assert!(!evaluate(&user(8, Role::User), &Method::DELETE, &review));
        assert!(!evaluate(&user(8, Role::User), &Method::PATCH, &review));
    }

    #[rstest]
    #[case(user(2, Role::Moderator))]
    #[case(user(3, Role::Admin))]
    #[case(superuser(4))]
    fn privileged_roles_moderate_any_content(#[case] actor: Actor) {
        for kind in [ResourceKind::Review, ResourceKind::Comment] {
            for method in [Method::PATCH, Method::DELETE] {
                assert!(evaluate(&actor, &method, &Target::authored(kind, 42)));
            }
        }
    }

    #[rstest]
    #[case(ResourceKind::Category)]
    #[case(ResourceKind::Genre)]
    #[case(ResourceKind::Title)]
    #[case(ResourceKind::Actor)]
    fn moderator_cannot_manage_catalog_or_actors(#[case] kind: ResourceKind) {
        let moderator = user(2, Role::Moderator);
        assert!(!evaluate(&moderator, &Method::POST, &Target::Collection(kind)));
        assert!(!evaluate(&moderator, &Method::DELETE, &Target::object(kind)));
        assert_eq!(
            authorize(&moderator, &Method::DELETE, &Target::object(kind)).unwrap_err().status(),
            axum::http::StatusCode::FORBIDDEN
        );
    }

    #[rstest]
    #[case(user(3, Role::Admin))]
    #[case(superuser(4))]
    fn admin_and_superuser_are_unrestricted(#[case] actor: Actor) {
        for kind in [
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Title,
            ResourceKind::Actor,
            ResourceKind::OwnProfile,
        ] {
            for method in [Method::GET, Method::POST, Method::PATCH, Method::DELETE] {
                assert!(evaluate(&actor, &method, &Target::Collection(kind)));
                assert!(evaluate(&actor, &method, &Target::object(kind)));
            }
        }
    }

    #[test]
    fn plain_users_may_create_content_and_edit_own_profile() {
        let actor = user(1, Role::User);
        assert!(evaluate(&actor, &Method::POST, &Target::Collection(ResourceKind::Review)));
        assert!(evaluate(&actor, &Method::POST, &Target::Collection(ResourceKind::Comment)));
        assert!(evaluate(&actor, &Method::PATCH, &Target::object(ResourceKind::OwnProfile)));
        assert!(!evaluate(&actor, &Method::GET, &Target::Collection(ResourceKind::Actor)));
        assert!(!evaluate(&Actor::Anonymous, &Method::GET, &Target::object(ResourceKind::OwnProfile)));
    }

    #[rstest]
    #[case("user", Role::User)]
    #[case("moderator", Role::Moderator)]
    #[case("admin", Role::Admin)]
    #[case("Admin", Role::User)]
    #[case("superadmin", Role::User)]
    #[case("", Role::User)]
    fn stored_roles_decode_to_least_privilege(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::from_stored(raw), expected);
    }

    #[test]
    fn unknown_role_never_grants_moderation() {
        let actor = user(5, Role::from_stored("root"));
        assert!(!evaluate(&actor, &Method::DELETE, &Target::authored(ResourceKind::Review, 6)));
        assert!(!actor.can(Capabilities::MANAGE_CATALOG));
    }
}
