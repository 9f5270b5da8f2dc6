//! Two-factor login and password-reset flows.
//!
//! Both flows share the single `two_factor_code` field on the user row: the
//! field itself carries no purpose tag, purpose lives only in the carrier
//! ticket. Issuing a code always overwrites the previous one, which orphans
//! any ticket still referencing it; the reset completer re-checks the field
//! to detect exactly that supersession.

use std::sync::Arc;

use rand::Rng;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenPair};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::store::{AuthStore, UserRecord};
use crate::auth::ticket;
use crate::mail::{self, MailKind, Mailer};
use crate::response::ApiError;

/// Uniform random 6-digit code, leading zeros preserved ("000042" is valid
/// and distinct from "42").
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..=999_999);
    format!("{n:06}")
}

/// Keeps at most the first two characters of the local part.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let kept: String = local.chars().take(2).collect();
            format!("{kept}***@{domain}")
        }
        None => "***".into(),
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub masked_email: String,
    pub temporary_token: String,
}

#[derive(Debug)]
pub struct VerifiedSession {
    pub user: UserRecord,
    pub role: Option<String>,
    pub tokens: TokenPair,
}

#[derive(Debug)]
pub struct ResetIssued {
    pub user: UserRecord,
    pub reset_token: String,
}

async fn issue_code(
    store: &dyn AuthStore,
    mailer: &Arc<dyn Mailer>,
    user: &UserRecord,
    kind: MailKind,
) -> Result<String, ApiError> {
    let code = generate_code();
    // Unconditional overwrite: any previously issued code is invalidated.
    store
        .set_two_factor_code(user.id, Some(&code))
        .await
        .map_err(ApiError::Internal)?;
    // Best-effort delivery; a failure must not roll back the code write.
    mail::dispatch(mailer.clone(), user.email.clone(), kind, code.clone());
    Ok(code)
}

/// Credential verification followed by code issuance. Returns the carrier
/// ticket, never a session credential.
pub async fn login(
    store: &dyn AuthStore,
    mailer: &Arc<dyn Mailer>,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, ApiError> {
    let user = store
        .find_by_email(email)
        .await
        .map_err(ApiError::Internal)?;

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = match user {
        Some(u) => u,
        None => return Err(ApiError::InvalidCredentials),
    };
    if !verify_password(password, &user.password_hash).map_err(ApiError::Internal)? {
        return Err(ApiError::InvalidCredentials);
    }
    if !user.is_active() {
        return Err(ApiError::AccountInactive);
    }
    let roles = store.roles_of(user.id).await.map_err(ApiError::Internal)?;
    if roles.is_empty() {
        return Err(ApiError::NoRoleAssigned);
    }

    issue_code(store, mailer, &user, MailKind::TwoFactor).await?;
    let expires_at = ticket::default_expiry(OffsetDateTime::now_utc());
    let temporary_token = ticket::encode_login(&user.email, expires_at)?;

    info!(user_id = %user.id, "2fa code issued for login");
    Ok(LoginOutcome {
        masked_email: mask_email(&user.email),
        temporary_token,
    })
}

/// Consumes a (ticket, code) pair and mints the session credential. The code
/// is cleared on success, so a replay of the same pair fails.
pub async fn verify_two_factor(
    store: &dyn AuthStore,
    keys: &JwtKeys,
    token: &str,
    code: &str,
) -> Result<VerifiedSession, ApiError> {
    let ticket = ticket::decode_login(token, OffsetDateTime::now_utc())?;

    let user = store
        .find_by_email(&ticket.email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Exact string compare, no normalization of leading zeros.
    if user.two_factor_code.as_deref() != Some(code) {
        return Err(ApiError::InvalidCode);
    }

    store
        .set_two_factor_code(user.id, None)
        .await
        .map_err(ApiError::Internal)?;

    let roles = store.roles_of(user.id).await.map_err(ApiError::Internal)?;
    let role = roles.first().map(|r| r.name.clone());
    let tokens = keys.mint_pair(user.id).map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "2fa verified, session minted");
    Ok(VerifiedSession { user, role, tokens })
}

/// Reset variant of code issuance. The carrier for this flow is produced
/// later by `validate_reset_code`; here the code only travels by mail.
pub async fn request_password_reset(
    store: &dyn AuthStore,
    mailer: &Arc<dyn Mailer>,
    email: &str,
) -> Result<String, ApiError> {
    let user = store
        .find_by_email(email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    issue_code(store, mailer, &user, MailKind::PasswordReset).await?;
    info!(user_id = %user.id, "2fa code issued for password reset");
    Ok(user.email)
}

/// Exchanges a mailed code for a reset-purpose ticket. Lookup is by the
/// current code value, not by email: at this point the caller may not know
/// which account the code belongs to.
pub async fn validate_reset_code(
    store: &dyn AuthStore,
    code: &str,
) -> Result<ResetIssued, ApiError> {
    let user = store
        .find_by_two_factor_code(code)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::CodeNotFound)?;

    let expires_at = ticket::default_expiry(OffsetDateTime::now_utc());
    // The matched code rides inside the ticket so completion can detect a
    // supersession without a second lookup by code.
    let reset_token = ticket::encode_reset(user.id, &user.email, code, expires_at)?;

    Ok(ResetIssued { user, reset_token })
}

/// Completes the reset: re-validates the embedded code against the current
/// field, rewrites the password hash and clears the code.
pub async fn change_password(
    store: &dyn AuthStore,
    token: &str,
    new_password: &str,
) -> Result<UserRecord, ApiError> {
    let ticket = ticket::decode_reset(token, OffsetDateTime::now_utc())?;

    let user = store
        .find_by_id(ticket.user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if let Some(embedded) = ticket.verification_code.as_deref() {
        if user.two_factor_code.as_deref() != Some(embedded) {
            return Err(ApiError::CodeMismatch);
        }
    }

    let password_hash = hash_password(new_password).map_err(ApiError::Internal)?;
    store
        .reset_password(user.id, &password_hash)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "password changed via reset flow");
    store
        .find_by_id(ticket.user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

pub fn first_role_name(roles: &[crate::auth::store::RoleRecord]) -> Option<String> {
    roles.first().map(|r| r.name.clone())
}

/// Convenience for handlers that already hold a pool-backed store.
pub async fn load_user(store: &dyn AuthStore, id: Uuid) -> Result<UserRecord, ApiError> {
    store
        .find_by_id(id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::memory::MemoryAuthStore;
    use crate::auth::store::{RoleRecord, STATUS_ACTIVE, STATUS_INACTIVE};
    use crate::config::JwtConfig;
    use crate::mail::LogMailer;
    use time::Duration;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    fn mailer() -> Arc<dyn Mailer> {
        Arc::new(LogMailer)
    }

    fn user(email: &str, password: &str, status: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone: None,
            email: email.into(),
            password_hash: hash_password(password).unwrap(),
            status: status.into(),
            two_factor_code: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn visitor_roles() -> Vec<RoleRecord> {
        vec![RoleRecord {
            id: Uuid::new_v4(),
            name: "visitor".into(),
        }]
    }

    fn store_with_visitor(email: &str, password: &str) -> (MemoryAuthStore, Uuid) {
        let store = MemoryAuthStore::new();
        let u = user(email, password, STATUS_ACTIVE);
        let id = u.id;
        store.insert_user(u, visitor_roles());
        (store, id)
    }

    #[test]
    fn generated_codes_are_six_ascii_digits() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn mask_email_keeps_prefix_and_domain() {
        assert_eq!(mask_email("ada@example.com"), "ad***@example.com");
        assert_eq!(mask_email("a@b.c"), "a***@b.c");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[tokio::test]
    async fn login_issues_ticket_and_writes_code_once() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        assert_eq!(store.code_of(id), None);

        let outcome = login(&store, &mailer(), "ada@example.com", "password123")
            .await
            .unwrap();

        let code = store.code_of(id).expect("code written");
        assert_eq!(code.len(), 6);
        assert_eq!(outcome.masked_email, "ad***@example.com");
        // Ticket references the account and is currently valid.
        let decoded =
            ticket::decode_login(&outcome.temporary_token, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(decoded.email, "ada@example.com");
    }

    #[tokio::test]
    async fn login_rejections() {
        let store = MemoryAuthStore::new();
        store.insert_user(
            user("active@example.com", "password123", STATUS_ACTIVE),
            visitor_roles(),
        );
        store.insert_user(
            user("inactive@example.com", "password123", STATUS_INACTIVE),
            visitor_roles(),
        );
        store.insert_user(
            user("roleless@example.com", "password123", STATUS_ACTIVE),
            vec![],
        );
        let mailer = mailer();

        // Unknown email and wrong password collapse to the same error.
        assert!(matches!(
            login(&store, &mailer, "ghost@example.com", "password123").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, &mailer, "active@example.com", "wrongpassword").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, &mailer, "inactive@example.com", "password123").await,
            Err(ApiError::AccountInactive)
        ));
        assert!(matches!(
            login(&store, &mailer, "roleless@example.com", "password123").await,
            Err(ApiError::NoRoleAssigned)
        ));
    }

    #[tokio::test]
    async fn verify_succeeds_once_then_replay_fails() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        let outcome = login(&store, &mailer(), "ada@example.com", "password123")
            .await
            .unwrap();
        let code = store.code_of(id).unwrap();

        let session = verify_two_factor(&store, &keys(), &outcome.temporary_token, &code)
            .await
            .unwrap();
        assert_eq!(session.role.as_deref(), Some("visitor"));
        assert_eq!(session.user.id, id);
        assert!(keys().verify(&session.tokens.token).is_ok());
        // Code is consumed.
        assert_eq!(store.code_of(id), None);

        // Identical (ticket, code) pair a second time.
        let err = verify_two_factor(&store, &keys(), &outcome.temporary_token, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCode));
    }

    #[tokio::test]
    async fn expired_ticket_fails_even_with_correct_code() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        login(&store, &mailer(), "ada@example.com", "password123")
            .await
            .unwrap();
        let code = store.code_of(id).unwrap();

        let past = (OffsetDateTime::now_utc() - Duration::minutes(16)).unix_timestamp();
        let stale = ticket::encode_login("ada@example.com", past).unwrap();
        let err = verify_two_factor(&store, &keys(), &stale, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TokenExpired));
        // The code itself stays set; only the carrier became unusable.
        assert_eq!(store.code_of(id), Some(code));
    }

    #[tokio::test]
    async fn second_login_orphans_first_ticket() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        let mailer = mailer();

        let first = login(&store, &mailer, "ada@example.com", "password123")
            .await
            .unwrap();
        let first_code = store.code_of(id).unwrap();

        login(&store, &mailer, "ada@example.com", "password123")
            .await
            .unwrap();
        assert_ne!(
            store.code_of(id),
            None,
            "second issuance overwrote the code"
        );

        // First ticket plus its code no longer verify.
        let err = verify_two_factor(&store, &keys(), &first.temporary_token, &first_code)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCode));
    }

    #[tokio::test]
    async fn all_zero_code_roundtrips() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        store.set_two_factor_code(id, Some("000000")).await.unwrap();

        let exp = ticket::default_expiry(OffsetDateTime::now_utc());
        let token = ticket::encode_login("ada@example.com", exp).unwrap();
        let session = verify_two_factor(&store, &keys(), &token, "000000")
            .await
            .unwrap();
        assert_eq!(session.user.id, id);
    }

    #[tokio::test]
    async fn unknown_email_in_ticket_is_not_found() {
        let store = MemoryAuthStore::new();
        let exp = ticket::default_expiry(OffsetDateTime::now_utc());
        let token = ticket::encode_login("ghost@example.com", exp).unwrap();
        let err = verify_two_factor(&store, &keys(), &token, "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn reset_flow_end_to_end() {
        let (store, id) = store_with_visitor("ada@example.com", "oldpassword1");
        let mailer = mailer();

        let email = request_password_reset(&store, &mailer, "ada@example.com")
            .await
            .unwrap();
        assert_eq!(email, "ada@example.com");
        let code = store.code_of(id).unwrap();

        let issued = validate_reset_code(&store, &code).await.unwrap();
        assert_eq!(issued.user.id, id);

        change_password(&store, &issued.reset_token, "newpassword1")
            .await
            .unwrap();
        assert_eq!(store.code_of(id), None);

        // Old password stops working, the new one logs in.
        assert!(matches!(
            login(&store, &mailer, "ada@example.com", "oldpassword1").await,
            Err(ApiError::InvalidCredentials)
        ));
        login(&store, &mailer, "ada@example.com", "newpassword1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_code_lookup_misses() {
        let store = MemoryAuthStore::new();
        assert!(matches!(
            validate_reset_code(&store, "123456").await,
            Err(ApiError::CodeNotFound)
        ));
    }

    #[tokio::test]
    async fn change_password_rejects_login_ticket() {
        let (store, _) = store_with_visitor("ada@example.com", "password123");
        let exp = ticket::default_expiry(OffsetDateTime::now_utc());
        let login_token = ticket::encode_login("ada@example.com", exp).unwrap();
        let err = change_password(&store, &login_token, "newpassword1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::WrongPurpose));
    }

    #[tokio::test]
    async fn superseded_code_fails_reset_completion() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        let mailer = mailer();

        request_password_reset(&store, &mailer, "ada@example.com")
            .await
            .unwrap();
        let code = store.code_of(id).unwrap();
        let issued = validate_reset_code(&store, &code).await.unwrap();

        // A newer issuance overwrites the shared field before completion.
        request_password_reset(&store, &mailer, "ada@example.com")
            .await
            .unwrap();

        let err = change_password(&store, &issued.reset_token, "newpassword1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CodeMismatch));
    }

    #[tokio::test]
    async fn expired_reset_ticket_is_rejected() {
        let (store, id) = store_with_visitor("ada@example.com", "password123");
        store.set_two_factor_code(id, Some("654321")).await.unwrap();
        let past = (OffsetDateTime::now_utc() - Duration::minutes(1)).unix_timestamp();
        let token = ticket::encode_reset(id, "ada@example.com", "654321", past).unwrap();
        let err = change_password(&store, &token, "newpassword1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TokenExpired));
    }
}
