//! Account session against the hosted auth service.

use crux_http::Http;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::capabilities::http::authorize;
use crate::capabilities::kv::{self, KvError, KvKey};
use crate::error::{AppError, ErrorKind, ValidationError};
use crate::event::{Event, Secret};
use crate::model::UserId;
use crate::remote::RemoteStore;

pub const MIN_PASSWORD_LEN: usize = 6;

pub const SIGN_UP_NOTICE: &str =
    "Account created! Please check your email to verify your account, then sign in.";

/// A signed-in user. Persisted under [`KvKey::SESSION`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: Secret,
    #[serde(default)]
    pub refresh_token: Option<Secret>,
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful password grant.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: Secret,
    #[serde(default)]
    pub refresh_token: Option<Secret>,
    pub user: AuthUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            user_id: token.user.id,
            email: token.user.email,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] KvError),

    #[error("stored session has no access token")]
    MissingToken,
}

pub fn validate_sign_in(email: &str, password: &Secret) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    if password.is_empty() {
        return Err(ValidationError::Required { field: "password" });
    }
    Ok(())
}

pub fn validate_sign_up(
    email: &str,
    password: &Secret,
    confirm: &Secret,
) -> Result<(), ValidationError> {
    validate_sign_in(email, password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.expose().chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn sign_in(
    store: &RemoteStore,
    http: &Http<Event>,
    email: &str,
    password: &Secret,
) -> Result<(), AppError> {
    debug!("requesting password grant");
    let body = Credentials {
        email: email.trim(),
        password: password.expose(),
    };
    authorize(http.post(store.endpoints().password_grant()), store.anon_key(), None)
        .body_json(&body)
        .map_err(|e| encode_error(&e))?
        .expect_json::<TokenResponse>()
        .send(|result| Event::SignedIn(Box::new(result)));
    Ok(())
}

pub fn sign_up(
    store: &RemoteStore,
    http: &Http<Event>,
    email: &str,
    password: &Secret,
) -> Result<(), AppError> {
    debug!("requesting sign-up");
    let body = Credentials {
        email: email.trim(),
        password: password.expose(),
    };
    authorize(http.post(store.endpoints().sign_up()), store.anon_key(), None)
        .body_json(&body)
        .map_err(|e| encode_error(&e))?
        .send(|result| Event::SignedUp(Box::new(result)));
    Ok(())
}

/// Revokes the token server-side. The outcome never blocks local sign-out.
pub fn sign_out(store: &RemoteStore, http: &Http<Event>, session: &Session) {
    debug!("revoking session");
    authorize(
        http.post(store.endpoints().sign_out()),
        store.anon_key(),
        Some(&session.access_token),
    )
    .send(|result| Event::SignedOut(Box::new(result)));
}

fn encode_error(e: &crux_http::Error) -> AppError {
    AppError::new(ErrorKind::Serialization, "Could not encode credentials")
        .with_internal(e.to_string())
}

pub fn encode_session(session: &Session) -> Result<Vec<u8>, SessionError> {
    Ok(kv::encode(KvKey::SESSION, session)?)
}

pub fn decode_session(bytes: &[u8]) -> Result<Session, SessionError> {
    let session: Session = kv::decode(KvKey::SESSION, bytes)?;
    if session.access_token.is_empty() {
        return Err(SessionError::MissingToken);
    }
    Ok(session)
}
