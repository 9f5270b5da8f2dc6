//! Carrier ticket codec for the two-factor flows.
//!
//! A ticket is base64-encoded JSON carrying identity, purpose and expiry. It
//! is self-contained: decoding needs no server-side state. It is also not
//! cryptographically signed, which matches the observed contract; the JWT
//! minted after verification is the only signed credential.

use base64ct::{Base64, Encoding};
use serde::Serialize;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::response::ApiError;

/// Validity window for both login and reset tickets.
pub const TICKET_TTL: Duration = Duration::minutes(15);

pub const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// Decoded login-purpose ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTicket {
    pub email: String,
    pub expires_at: i64,
}

/// Decoded reset-purpose ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub user_id: Uuid,
    pub expires_at: i64,
    pub verification_code: Option<String>,
}

pub fn default_expiry(now: OffsetDateTime) -> i64 {
    (now + TICKET_TTL).unix_timestamp()
}

fn encode<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    let bytes = serde_json::to_vec(payload).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Base64::encode_string(&bytes))
}

pub fn encode_login(email: &str, expires_at: i64) -> Result<String, ApiError> {
    encode(&serde_json::json!({
        "email": email,
        "expires_at": expires_at,
    }))
}

pub fn encode_reset(
    user_id: Uuid,
    email: &str,
    verification_code: &str,
    expires_at: i64,
) -> Result<String, ApiError> {
    encode(&serde_json::json!({
        "user_id": user_id,
        "email": email,
        "purpose": PURPOSE_PASSWORD_RESET,
        "expires_at": expires_at,
        "verification_code": verification_code,
    }))
}

fn decode_value(token: &str) -> Result<Value, ApiError> {
    let bytes = Base64::decode_vec(token).map_err(|_| ApiError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidToken)
}

/// Decodes a login ticket, failing closed on any structural defect, on a
/// reset-purpose payload, and on expiry.
pub fn decode_login(token: &str, now: OffsetDateTime) -> Result<LoginTicket, ApiError> {
    let value = decode_value(token)?;
    let email = value
        .get("email")
        .and_then(Value::as_str)
        .ok_or(ApiError::InvalidToken)?
        .to_owned();
    let expires_at = value
        .get("expires_at")
        .and_then(Value::as_i64)
        .ok_or(ApiError::InvalidToken)?;
    // A ticket carrying a purpose tag belongs to another flow.
    if value.get("purpose").is_some() {
        return Err(ApiError::WrongPurpose);
    }
    if now.unix_timestamp() > expires_at {
        return Err(ApiError::TokenExpired);
    }
    Ok(LoginTicket { email, expires_at })
}

/// Decodes a reset ticket. The purpose check runs before the identity fields
/// so a login-flow ticket reports `WrongPurpose` rather than a generic
/// malformed-token error.
pub fn decode_reset(token: &str, now: OffsetDateTime) -> Result<ResetTicket, ApiError> {
    let value = decode_value(token)?;
    let expires_at = value
        .get("expires_at")
        .and_then(Value::as_i64)
        .ok_or(ApiError::InvalidToken)?;
    match value.get("purpose").and_then(Value::as_str) {
        Some(PURPOSE_PASSWORD_RESET) => {}
        _ => return Err(ApiError::WrongPurpose),
    }
    let user_id = value
        .get("user_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(ApiError::InvalidToken)?;
    if now.unix_timestamp() > expires_at {
        return Err(ApiError::TokenExpired);
    }
    let verification_code = value
        .get("verification_code")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Ok(ResetTicket {
        user_id,
        expires_at,
        verification_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    #[test]
    fn login_ticket_roundtrip() {
        let exp = default_expiry(now());
        let token = encode_login("user@example.com", exp).unwrap();
        let ticket = decode_login(&token, now()).unwrap();
        assert_eq!(ticket.email, "user@example.com");
        assert_eq!(ticket.expires_at, exp);
    }

    #[test]
    fn reset_ticket_roundtrip_keeps_code() {
        let exp = default_expiry(now());
        let user_id = Uuid::new_v4();
        let token = encode_reset(user_id, "user@example.com", "000042", exp).unwrap();
        let ticket = decode_reset(&token, now()).unwrap();
        assert_eq!(ticket.user_id, user_id);
        assert_eq!(ticket.verification_code.as_deref(), Some("000042"));
    }

    #[test]
    fn garbage_fails_closed() {
        assert!(matches!(
            decode_login("not base64 at all!", now()),
            Err(ApiError::InvalidToken)
        ));
        let not_json = Base64::encode_string(b"hello world");
        assert!(matches!(
            decode_login(&not_json, now()),
            Err(ApiError::InvalidToken)
        ));
        assert!(matches!(
            decode_reset("%%%", now()),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn missing_fields_fail_closed() {
        let token = encode(&serde_json::json!({ "email": "a@b.c" })).unwrap();
        assert!(matches!(
            decode_login(&token, now()),
            Err(ApiError::InvalidToken)
        ));
        let token = encode(&serde_json::json!({ "expires_at": default_expiry(now()) })).unwrap();
        assert!(matches!(
            decode_login(&token, now()),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn expired_login_ticket_is_rejected() {
        let past = (now() - Duration::minutes(1)).unix_timestamp();
        let token = encode_login("user@example.com", past).unwrap();
        assert!(matches!(
            decode_login(&token, now()),
            Err(ApiError::TokenExpired)
        ));
    }

    #[test]
    fn expired_reset_ticket_is_rejected() {
        let past = (now() - Duration::minutes(1)).unix_timestamp();
        let token = encode_reset(Uuid::new_v4(), "a@b.c", "123456", past).unwrap();
        assert!(matches!(
            decode_reset(&token, now()),
            Err(ApiError::TokenExpired)
        ));
    }

    #[test]
    fn login_ticket_is_wrong_purpose_for_reset() {
        let token = encode_login("user@example.com", default_expiry(now())).unwrap();
        assert!(matches!(
            decode_reset(&token, now()),
            Err(ApiError::WrongPurpose)
        ));
    }

    #[test]
    fn reset_ticket_is_not_accepted_for_login() {
        let token = encode_reset(
            Uuid::new_v4(),
            "user@example.com",
            "123456",
            default_expiry(now()),
        )
        .unwrap();
        assert!(matches!(
            decode_login(&token, now()),
            Err(ApiError::WrongPurpose)
        ));
    }

    #[test]
    fn purpose_check_runs_before_identity_fields() {
        // Malformed reset payload with the right purpose still reports the
        // structural error, while a foreign purpose wins over missing ids.
        let token = encode(&serde_json::json!({
            "purpose": PURPOSE_PASSWORD_RESET,
            "expires_at": default_expiry(now()),
        }))
        .unwrap();
        assert!(matches!(
            decode_reset(&token, now()),
            Err(ApiError::InvalidToken)
        ));
    }
}
