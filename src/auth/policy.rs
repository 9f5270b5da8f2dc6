use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo;
use crate::auth::store::{RoleRecord, UserRecord, ROLE_ADMIN};
use crate::config::AppConfig;
use crate::response::ApiError;

pub fn has_admin_role(roles: &[RoleRecord]) -> bool {
    roles.iter().any(|r| r.name == ROLE_ADMIN)
}

/// Only the designated bootstrap account may create further admin accounts.
pub fn may_register_admins(creator: &UserRecord, config: &AppConfig) -> bool {
    creator.email == config.bootstrap_admin_email
}

/// Gate for catalog write operations.
pub async fn require_admin(db: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
    let roles = repo::roles_of(db, user_id).await.map_err(ApiError::Internal)?;
    if has_admin_role(&roles) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use time::OffsetDateTime;

    fn role(name: &str) -> RoleRecord {
        RoleRecord {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    fn config(bootstrap: &str) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            jwt: JwtConfig {
                secret: "s".into(),
                issuer: "i".into(),
                audience: "a".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            bootstrap_admin_email: bootstrap.into(),
            smtp: None,
        }
    }

    fn user(email: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            first_name: "A".into(),
            last_name: "B".into(),
            phone: None,
            email: email.into(),
            password_hash: "x".into(),
            status: "active".into(),
            two_factor_code: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn admin_role_detection() {
        assert!(has_admin_role(&[role("visitor"), role("admin")]));
        assert!(!has_admin_role(&[role("visitor")]));
        assert!(!has_admin_role(&[]));
    }

    #[test]
    fn bootstrap_capability_is_named_not_positional() {
        let config = config("root@gamevault.local");
        assert!(may_register_admins(&user("root@gamevault.local"), &config));
        assert!(!may_register_admins(&user("other@gamevault.local"), &config));
    }
}
