//! Bearer token payload decoding.
//!
//! Reads the `exp` claim out of a JWT payload without checking the
//! signature. This only lets the client skip requests that are bound to
//! fail; the backend remains the sole authority on whether a token is
//! valid. Anything that cannot be decoded counts as expired.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::{Result, SessionError};

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<serde_json::Number>,
}

/// Decode the `exp` claim (epoch seconds) from a bearer token.
pub fn decode_expiry(token: &str) -> Result<i64> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(SessionError::InvalidToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::InvalidToken(format!("payload is not base64url: {e}")))?;

    let claim: ExpiryClaim = serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::InvalidToken(format!("payload is not a claims object: {e}")))?;

    let exp = claim
        .exp
        .ok_or_else(|| SessionError::InvalidToken("missing exp claim".to_string()))?;

    exp.as_i64()
        .or_else(|| {
            exp.as_f64()
                .filter(|secs| secs.is_finite())
                .map(|secs| secs.floor() as i64)
        })
        .ok_or_else(|| SessionError::InvalidToken(format!("exp claim out of range: {exp}")))
}

/// Whether `token` is expired at `now` (epoch seconds).
///
/// True when `exp < now` or when the token cannot be decoded at all.
pub fn is_expired(token: &str, now: i64) -> bool {
    match decode_expiry(token) {
        Ok(exp) => exp < now,
        Err(err) => {
            log::debug!("Treating undecodable token as expired: {err}");
            true
        }
    }
}
