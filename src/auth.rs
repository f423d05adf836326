use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    credentials::{CredentialStore, verify_password},
    error::{CredentialError, LoginError, TokenError},
    handlers::ApiError,
    token::{Identity, IssuedToken, TokenService, TokenState},
};

/// login
///
/// Checks `username`/`password` against the credential store and, on a match, issues a
/// token for that user.
///
/// An unknown username and a wrong password both come back as
/// `LoginError::InvalidCredentials`, so callers cannot probe for valid usernames.
/// A credential store that cannot be read is reported separately as
/// `LoginError::StorageUnavailable`.
pub async fn login(
    credentials: &dyn CredentialStore,
    tokens: &TokenService,
    username: &str,
    password: &str,
) -> Result<IssuedToken, LoginError> {
    let user = match credentials.find_by_username(username).await {
        Ok(user) => user,
        Err(CredentialError::NotFound) => return Err(LoginError::InvalidCredentials),
        Err(CredentialError::StorageUnavailable(e)) => {
            return Err(LoginError::StorageUnavailable(e));
        }
    };

    // Argon2 is deliberately slow; keep it off the async worker threads.
    let hash = user.password_hash.clone();
    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|_| LoginError::VerificationAborted)?;

    if !matches {
        return Err(LoginError::InvalidCredentials);
    }

    Ok(tokens.issue(user.id, user.role)?)
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers receive it as an argument
/// and pass it to the access guard for role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Identity);

/// AuthUser Extractor Implementation
///
/// 0. Reuse: an identity already verified by the route layer is taken from the request
///    extensions.
/// 1. Dependency Resolution: pulls the token service out of the application state.
/// 2. Token Extraction: `Authorization: Bearer <token>`.
/// 3. Verification: signature, then expiry.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure. Whether the token was
/// missing, invalid or expired is logged but not revealed to the client.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(verified) = parts.extensions.get::<AuthUser>() {
            return Ok(*verified);
        }

        let tokens = TokenState::from_ref(state);

        let Some(token) = bearer_token(parts) else {
            tracing::debug!("rejected request without bearer token");
            return Err(ApiError::Unauthenticated);
        };

        match tokens.verify(token) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(TokenError::Expired) => {
                tracing::info!("rejected expired token");
                Err(ApiError::Unauthenticated)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected invalid token");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
