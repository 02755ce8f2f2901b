use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of every signed message.
const PURPOSE: &str = "password-reset";

const MAX_CLOCK_SKEW_SECS: i64 = 60;

const NONCE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("reset token expired")]
    Expired,

    #[error("reset token invalid")]
    Invalid,
}

/// Issues and verifies password-reset tokens.
///
/// Format: `base64url(user_id) "." issued_at "." base64url(nonce) "."
/// hex(hmac_sha256)`. The MAC covers the purpose, the user id, the issue
/// timestamp and the nonce, so every issued token is distinct.
#[derive(Clone)]
pub struct ResetTokenSigner {
    mac: HmacSha256,
    ttl: Duration,
}

impl ResetTokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        Self { mac, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str) -> String {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: &str, issued_at: i64) -> String {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let nonce = URL_SAFE_NO_PAD.encode(nonce_bytes);
        let signature = hex::encode(
            self.keyed(user_id, issued_at, &nonce)
                .finalize()
                .into_bytes(),
        );
        format!(
            "{}.{}.{}.{}",
            URL_SAFE_NO_PAD.encode(user_id),
            issued_at,
            nonce,
            signature
        )
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<String, TokenError> {
        let mut parts = token.split('.');
        let (Some(encoded_id), Some(raw_issued_at), Some(nonce), Some(raw_signature), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        )
        else {
            return Err(TokenError::Invalid);
        };

        let user_id = URL_SAFE_NO_PAD
            .decode(encoded_id)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(TokenError::Invalid)?;

        // Only the canonical spelling of each field is accepted, so no two
        // distinct strings verify for the same payload.
        let issued_at: i64 = raw_issued_at.parse().map_err(|_| TokenError::Invalid)?;
        if issued_at.to_string() != raw_issued_at || !is_lower_hex(raw_signature) {
            return Err(TokenError::Invalid);
        }
        match URL_SAFE_NO_PAD.decode(nonce) {
            Ok(bytes) if bytes.len() == NONCE_LEN => {}
            _ => return Err(TokenError::Invalid),
        }
        let signature = hex::decode(raw_signature).map_err(|_| TokenError::Invalid)?;

        // Signature first: expiry is only reported for tokens we actually minted.
        self.keyed(&user_id, issued_at, nonce)
            .verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        if issued_at > now + MAX_CLOCK_SKEW_SECS {
            return Err(TokenError::Invalid);
        }
        if now - issued_at > self.ttl.num_seconds() {
            return Err(TokenError::Expired);
        }

        Ok(user_id)
    }

    fn keyed(&self, user_id: &str, issued_at: i64, nonce: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{}.{}.{}.{}", PURPOSE, user_id, issued_at, nonce).as_bytes());
        mac
    }
}

fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
