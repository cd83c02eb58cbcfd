use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{User, Uuid};
use crate::error::{AccessError, QueryError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, lifetime_hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(lifetime_hours)).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }

    pub fn is_expired(&self) -> bool {
        (self.exp - Local::now().timestamp()).is_negative()
    }
}

/// The authenticated caller. Every user-scoped action acts on this user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
}

impl SessionData {
    /// Recipes may only be changed by their author.
    pub fn authenticate_author(&self, author_id: Uuid) -> Result<(), potion::Error> {
        if self.user_id != author_id {
            log::warn!(
                "User {} tried to modify a recipe owned by {}",
                self.user_id,
                author_id
            );
            return Err(AccessError::PermissionDenied.into());
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, potion::Error> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| QueryError::new("Invalid signing key".to_owned()).into())
}

pub fn generate_jwt_session(
    user: &User,
    secret: &str,
    lifetime_hours: i64,
) -> Result<String, potion::Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), lifetime_hours);

    claims
        .sign_with_key(&key)
        .map_err(|e| QueryError::new(format!("Failed to sign session: {e}")).into())
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, potion::Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token.verify_with_key(&key).map_err(|_| {
        log::warn!("Rejected session; invalid token");
        AccessError::Unauthenticated.into()
    })?;

    if session.is_expired() {
        log::warn!("Rejected session for {}; token expired", session.username);
        return Err(AccessError::Unauthenticated.into());
    }

    Ok(session)
}
