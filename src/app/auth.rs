use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context as _;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tokio::sync::RwLock;

use crate::app::document_store::DocumentStore;
use crate::app::repository::Collection;
use crate::error::{ApiError, ValidationErrors};

pub const USERS_COLLECTION: &str = "users";
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Argon2id PHC string for `password`. Runs on the blocking pool.
pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|err| anyhow::anyhow!("encode salt: {err}"))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| anyhow::anyhow!("hash password: {err}"))
    })
    .await
    .context("join password hasher")?
}

pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|err| anyhow::anyhow!("parse password hash: {err}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("join password verifier")?
}

/// Credential records in the `users` collection.
#[derive(Clone)]
pub struct UserDirectory {
    users: Collection<User>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Collection::new(store, USERS_COLLECTION),
        }
    }

    pub async fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.users.all().await?.is_empty())
    }

    pub async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let username = username.trim();
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    pub async fn register(&self, credentials: Credentials) -> Result<User, ApiError> {
        let mut errors = ValidationErrors::new();
        let username = credentials
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let password = credentials.password.filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            return Err(ApiError::invalid(
                "username",
                "Username and password are required",
            ));
        };
        if password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(
                "password",
                format!("Password must be at least {MIN_PASSWORD_CHARS} characters long"),
            );
        }
        errors.finish(())?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(ApiError::invalid("username", "Username already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash: hash_password(password).await?,
            role: ADMIN_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&user.id, &user).await?;
        tracing::info!(username = %user.username, "registered user");
        Ok(user)
    }

    /// `None` for an unknown user or a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<Option<User>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        let ok = verify_password(password.to_string(), user.password_hash.clone()).await?;
        Ok(ok.then_some(user))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// In-process session table. Tokens are stored only as SHA-256 digests.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl_secs: u32) -> Self {
        Self {
            ttl: Duration::seconds(i64::from(ttl_secs)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub async fn issue(&self, user: &User) -> (String, Session) {
        self.issue_at(user, Utc::now()).await
    }

    pub(crate) async fn issue_at(&self, user: &User, now: DateTime<Utc>) -> (String, Session) {
        let token = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        let session = Session {
            username: user.username.clone(),
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(token_digest(&token), session.clone());
        (token, session)
    }

    pub async fn lookup(&self, token: &str) -> Option<Session> {
        self.lookup_at(token, Utc::now()).await
    }

    pub(crate) async fn lookup_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let key = token_digest(token);
        let session = self.sessions.read().await.get(&key).cloned()?;
        if session.expires_at > now {
            return Some(session);
        }
        self.sessions.write().await.remove(&key);
        None
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .await
            .remove(&token_digest(token))
            .is_some()
    }
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
