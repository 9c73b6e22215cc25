//! Stateless session tokens: HMAC-SHA256 signed claims, base64url encoded
//! as `<claims>.<signature>`. Nothing is persisted server-side, so a token
//! stays valid until its expiry.

use crate::config;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    /// User id the token was issued to.
    pub sub: String,
    pub email: String,
    /// Issued-at and expiry, unix seconds. `exp = iat + ttl`.
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

pub struct TokenService {
    secret: Vec<u8>,
    pub ttl_secs: i64,
}

impl Default for TokenService {
    fn default() -> Self {
        Self {
            secret: config::secret_key(),
            ttl_secs: config::token_ttl_secs(),
        }
    }
}

impl TokenService {
    pub fn new(secret: Vec<u8>, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> anyhow::Result<String> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + self.ttl_secs,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let sig = self.sign(payload.as_bytes())?;
        Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(sig)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, sig_b64) = token.split_once('.').ok_or(TokenError::Invalid)?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Invalid)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Invalid)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).map_err(|_| TokenError::Invalid)?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Invalid)?;
        let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)?;

        if chrono::Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| anyhow::anyhow!("bad signing key: {}", e))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
