use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    database::schema::{Id, User, UserRole},
    error::ApiError,
    SessionConfig,
};

use super::permissions::ActionType;

/// HMAC key and token lifetime used to issue and check sessions
#[derive(Clone)]
pub struct SessionKey {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionKey {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, ApiError> {
        let key = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| ApiError::Crypto(format!("{e}")))?;

        Ok(Self { key, lifetime })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, ApiError> {
        let lifetime = Duration::try_hours(config.lifetime_hours)
            .ok_or_else(|| ApiError::Crypto("Session lifetime out of range".to_owned()))?;

        Self::new(config.secret.as_bytes(), lifetime)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub is_staff: bool,
    pub is_active: bool,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user.id,
            username: user.username.to_owned(),
            is_staff: user.is_staff,
            is_active: user.is_active,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// Identity of the caller, as handed to every operation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl SessionData {
    pub fn is_staff(&self) -> bool {
        self.role == UserRole::Staff
    }

    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            log::warn!("> Denied {action:?} for user {}", self.user_id);
            return Err(ApiError::PermissionDenied);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            role: if value.is_staff {
                UserRole::Staff
            } else {
                UserRole::User
            },
            is_active: value.is_active,
        }
    }
}

impl From<&User> for SessionData {
    fn from(user: &User) -> Self {
        SessionData {
            user_id: user.id,
            username: user.username.to_owned(),
            role: user.role(),
            is_active: user.is_active,
        }
    }
}

/// Operations that require a caller call this on the optional session
pub fn require_session(session: Option<&SessionData>) -> Result<&SessionData, ApiError> {
    session.ok_or(ApiError::Unauthorized)
}

pub fn generate_jwt_session(user: &User, key: &SessionKey) -> Result<String, ApiError> {
    JwtSessionData::new(user, key.lifetime)
        .sign_with_key(&key.key)
        .map_err(|e| ApiError::Crypto(format!("{e}")))
}

pub fn verify_jwt_session(token: &str, key: &SessionKey) -> Result<JwtSessionData, ApiError> {
    let session: JwtSessionData = token
        .verify_with_key(&key.key)
        .map_err(|_| ApiError::InvalidSession("Invalid token".to_owned()))?;

    if session.is_expired() {
        return Err(ApiError::InvalidSession("Token expired".to_owned()));
    }

    Ok(session)
}
