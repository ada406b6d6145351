//! Startup seeding of the bootstrap administrator account

use shared::{validate_password, Role};
use sqlx::PgPool;

use crate::config::SeedConfig;
use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;
use crate::services::UserService;

/// Ensure the configured admin account exists.
///
/// Safe to run on every start: an existing account, including its password,
/// is left untouched. Returns whether an account was created.
pub async fn ensure_admin(db: &PgPool, config: &SeedConfig) -> AppResult<bool> {
    let Some(password) = config.admin_password.as_deref() else {
        tracing::debug!("No admin password configured, skipping admin seed");
        return Ok(false);
    };

    validate_password(password).map_err(|m| AppError::validation("seed.admin_password", m))?;

    let users = UserService::new(db.clone());
    if users.find_by_username(&config.admin_username).await?.is_some() {
        tracing::debug!(username = %config.admin_username, "Admin account already present");
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    let created = users
        .insert_if_absent(
            &config.admin_username,
            &config.admin_email,
            Role::Admin,
            &password_hash,
        )
        .await?;

    if created {
        tracing::info!(username = %config.admin_username, "Admin account created");
    }

    Ok(created)
}
