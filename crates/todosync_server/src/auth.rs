//! Bearer credentials for the todo API.
//!
//! Credentials are HMAC-SHA256 signed and carry their issue time so they
//! can expire.
//!
//! ## Token Format
//!
//! Tokens are composed of:
//! - 16 bytes: user_id
//! - 8 bytes: timestamp (Unix millis, big-endian)
//! - 32 bytes: HMAC-SHA256 signature
//!
//! Total: 56 bytes, base64url-encoded (no padding) for transport.

use crate::error::{ServerError, ServerResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use todosync_protocol::UserId;

type HmacSha256 = Hmac<Sha256>;

const PAYLOAD_LEN: usize = 24;
const TOKEN_LEN: usize = PAYLOAD_LEN + 32;
const SECRET_LEN: usize = 32;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
        }
    }

    /// Creates a configuration with a fresh random secret.
    ///
    /// Credentials signed with it stop verifying once the process exits.
    #[must_use]
    pub fn generate() -> Self {
        let mut secret = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and verifies bearer credentials.
///
/// Every list and item operation is preceded by [`TokenValidator::verify`];
/// a failure there ends the request before any store access.
#[derive(Clone)]
pub struct TokenValidator {
    config: AuthConfig,
}

impl TokenValidator {
    /// Creates a new token validator.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a credential for a user.
    pub fn issue(&self, user: UserId) -> ServerResult<String> {
        let mut data = Vec::with_capacity(TOKEN_LEN);
        data.extend_from_slice(user.as_bytes());
        data.extend_from_slice(&now_millis().to_be_bytes());

        let signature = self.sign(&data)?;
        data.extend_from_slice(&signature);
        Ok(URL_SAFE_NO_PAD.encode(data))
    }

    /// Verifies a credential and returns the user it was issued to.
    pub fn verify(&self, token: &str) -> ServerResult<UserId> {
        let rejected = |reason: &str| ServerError::AuthenticationFailed(reason.into());

        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| rejected("token is not valid base64"))?;
        if bytes.len() != TOKEN_LEN {
            return Err(rejected("invalid token length"));
        }

        let (payload, signature) = bytes.split_at(PAYLOAD_LEN);
        let (user_bytes, timestamp_bytes) = payload.split_at(16);

        // Verify signature
        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(signature)
            .map_err(|_| rejected("invalid signature"))?;

        // Check expiration
        let timestamp_bytes: [u8; 8] = timestamp_bytes
            .try_into()
            .map_err(|_| rejected("invalid token length"))?;
        let issued_at = u64::from_be_bytes(timestamp_bytes);
        let expiry_millis = u64::try_from(self.config.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if now_millis() > issued_at.saturating_add(expiry_millis) {
            return Err(rejected("token expired"));
        }

        let user_bytes: [u8; 16] = user_bytes
            .try_into()
            .map_err(|_| rejected("invalid token length"))?;
        Ok(UserId::from_bytes(user_bytes))
    }

    /// Extracts and verifies an optional bearer credential.
    pub fn verify_bearer(&self, bearer: Option<&str>) -> ServerResult<UserId> {
        match bearer {
            Some(token) => self.verify(token),
            None => Err(ServerError::AuthenticationFailed(
                "not authorized, no token".into(),
            )),
        }
    }

    fn mac(&self) -> ServerResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("hmac key rejected: {e}")))
    }

    /// Signs data with HMAC-SHA256.
    fn sign(&self, data: &[u8]) -> ServerResult<[u8; 32]> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().into())
    }
}

fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
