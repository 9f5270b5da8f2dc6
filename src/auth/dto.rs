use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::store::UserRecord;
use crate::response::ApiResponse;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for 2FA verification.
#[derive(Debug, Deserialize)]
pub struct Verify2faRequest {
    #[serde(rename = "temporaryToken")]
    pub temporary_token: String,
    pub code: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PassResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidatorCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "resetToken")]
    pub reset_token: String,
    pub password: String,
}

/// Login response body. `data` carries the masked email; the carrier ticket
/// rides beside the envelope fields, where existing clients read it.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub envelope: ApiResponse<String>,
    #[serde(rename = "temporaryToken")]
    pub temporary_token: String,
}

/// Payload returned by a successful 2FA verification.
#[derive(Debug, Serialize)]
pub struct SessionData {
    pub user: UserRecord,
    pub role: Option<String>,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshData {
    pub token: String,
    pub refresh_token: String,
    pub user: RefreshUser,
}

#[derive(Debug, Serialize)]
pub struct RefreshUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
}

/// Account summary returned as `data` by the reset-code exchange.
#[derive(Debug, Serialize)]
pub struct ResetUserData {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Reset-code exchange response; the reset ticket sits at the top level,
/// as a sibling of `data`.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    #[serde(flatten)]
    pub envelope: ApiResponse<ResetUserData>,
    #[serde(rename = "resetToken")]
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordChangedData {
    pub user_id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub password_changed_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_data_hides_secrets() {
        let data = SessionData {
            user: UserRecord {
                id: Uuid::new_v4(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                phone: None,
                email: "ada@example.com".into(),
                password_hash: "argon2-secret".into(),
                status: "active".into(),
                two_factor_code: Some("123456".into()),
                created_at: OffsetDateTime::now_utc(),
            },
            role: Some("visitor".into()),
            token: "jwt".into(),
            refresh_token: "jwt-refresh".into(),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("argon2-secret"));
        assert!(!json.contains("123456"));
    }

    #[test]
    fn login_ticket_is_a_top_level_field() {
        let body = LoginResponse {
            envelope: ApiResponse::ok(
                "Login successful, authentication code sent by email",
                "ad***@example.com".to_string(),
            ),
            temporary_token: "tok".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json.get("temporaryToken").unwrap(), "tok");
        assert_eq!(json.get("data").unwrap(), "ad***@example.com");
        assert_eq!(json.get("success").unwrap(), true);
    }

    #[test]
    fn reset_ticket_sits_beside_data() {
        let body = ResetTokenResponse {
            envelope: ApiResponse::ok(
                "Code verified successfully",
                ResetUserData {
                    user_id: Uuid::new_v4(),
                    email: "ada@example.com".into(),
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                },
            ),
            reset_token: "reset-tok".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json.get("resetToken").unwrap(), "reset-tok");
        let data = json.get("data").unwrap();
        assert_eq!(data.get("email").unwrap(), "ada@example.com");
        assert!(data.get("resetToken").is_none());
    }

    #[test]
    fn token_fields_use_wire_names() {
        let body = serde_json::json!({
            "temporaryToken": "abc",
            "code": "000042",
        });
        let req: Verify2faRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.temporary_token, "abc");
        assert_eq!(req.code, "000042");

        let body = serde_json::json!({
            "resetToken": "abc",
            "password": "newpassword1",
        });
        let req: ChangePasswordRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.reset_token, "abc");
    }
}
