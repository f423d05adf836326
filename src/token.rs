use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::{error::TokenError, models::Role};

/// How long an issued token stays valid.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims
///
/// The payload signed into every token. Claims never change after issuance; acceptance
/// depends only on the signature and `exp`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id, as a decimal string.
    pub sub: String,
    pub role: Role,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: i64,
    /// Expiration Time (exp), always `iat + TOKEN_TTL_SECS`.
    pub exp: i64,
}

/// Identity
///
/// Who a validated token says the caller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: u64,
    pub role: Role,
}

/// IssuedToken
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// --- Time source ---

/// Clock
///
/// Source of "now" for issuance and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// SystemClock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ManualClock
///
/// A clock that only moves when told to. Second resolution, matching the token claims.
#[derive(Debug)]
pub struct ManualClock {
    epoch_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            epoch_secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.epoch_secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.epoch_secs.store(to.timestamp(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.epoch_secs.load(Ordering::SeqCst), 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

// --- Token Service ---

/// TokenService
///
/// Issues and verifies HS256 bearer tokens. The key is fixed for the lifetime of the
/// service; there is no revocation, so a leaked token stays usable until it expires.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

/// TokenState
pub type TokenState = Arc<TokenService>;

impl TokenService {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::default();
        // Expiry is checked against our own clock, after the signature has been verified.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Service reading the system clock.
    pub fn from_secret(secret: &str) -> Self {
        Self::new(secret, Arc::new(SystemClock))
    }

    /// issue
    ///
    /// Signs a token for `user_id`/`role` expiring exactly one hour from now.
    pub fn issue(&self, user_id: u64, role: Role) -> Result<IssuedToken, TokenError> {
        let iat = self.clock.now().timestamp();
        let exp = iat + TOKEN_TTL_SECS;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat,
            exp,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            issued_at: DateTime::from_timestamp(iat, 0).unwrap_or(DateTime::UNIX_EPOCH),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::UNIX_EPOCH),
        })
    }

    /// verify
    ///
    /// Signature and structure first (`Invalid`), then `now <= exp` (`Expired`).
    /// A forged token is therefore always `Invalid`, whatever its claimed expiry.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        let user_id = claims.sub.parse::<u64>().map_err(|_| TokenError::Invalid)?;

        if self.clock.now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}
