//! Admin account management command.

use atelier_core::{Email, UserRole};

use atelier_api::db::users::UserRepository;
use atelier_api::services::auth;

use super::{CliError, connect};

/// Create an admin account directly in the database.
///
/// This is the bootstrap path: the HTTP registration route only grants the
/// admin role to callers who already are admins.
///
/// # Errors
///
/// Returns `CliError` for invalid input, a duplicate email, or a database
/// failure.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    if password.len() < 8 {
        return Err(CliError::InvalidInput(
            "Password must be at least 8 characters".to_owned(),
        ));
    }

    let password_hash =
        auth::hash_password(password).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .create(&email, name, &password_hash, UserRole::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(())
}
