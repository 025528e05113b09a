// src/services/identity.rs

use sqlx::SqlitePool;

use crate::{
    config::{Config, MIN_PASSWORD_LENGTH},
    error::{AppError, is_unique_violation},
    models::role::Role,
    models::user::{User, UserWithRoles},
    utils::{
        hash::{DUMMY_HASH, hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Rejects passwords below the policy: minimum length, at least one
/// letter and one digit.
pub fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::WeakPassword(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }
    Ok(())
}

/// Registers a new account and grants it the 'user' role, in one
/// transaction. The stored password is an Argon2 hash, never plaintext.
pub async fn register(pool: &SqlitePool, email: &str, password: &str) -> Result<User, AppError> {
    check_password_strength(password)?;

    let email = email.trim().to_lowercase();
    let hashed_password = hash_password(password)?;

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password)
        VALUES (?, ?)
        RETURNING id, email, password, active, created_at
        "#,
    )
    .bind(&email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateEmail(email.clone())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = 'user'",
    )
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(user)
}

/// Fetches the role names assigned to a user.
pub async fn roles_of(pool: &SqlitePool, user_id: i64) -> Result<Vec<String>, AppError> {
    let roles = sqlx::query_scalar::<_, String>(
        r#"
        SELECT r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = ?
        ORDER BY r.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

/// Verifies credentials and issues a JWT.
///
/// Unknown email, wrong password and deactivated account all collapse
/// into `InvalidCredentials`; a dummy verification runs when the account
/// is missing so the timing does not reveal which case it was.
pub async fn authenticate(
    pool: &SqlitePool,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<(String, User), AppError> {
    let email = email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, active, created_at FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::StorageUnavailable(e.to_string())
    })?;

    let user = match user {
        Some(user) => user,
        None => {
            let _ = verify_password(password, DUMMY_HASH);
            return Err(AppError::InvalidCredentials);
        }
    };

    let is_valid = verify_password(password, &user.password)?;

    if !is_valid || !user.active {
        return Err(AppError::InvalidCredentials);
    }

    let roles = roles_of(pool, user.id).await?;

    let token = sign_jwt(user.id, &roles, &config.jwt_secret, config.jwt_expiration)?;

    Ok((token, user))
}

/// Deactivates an account. Idempotent: deactivating an already inactive
/// account succeeds. Subsequent `authenticate` calls fail.
pub async fn deactivate(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    set_active(pool, user_id, false).await
}

/// Re-enables a previously deactivated account.
pub async fn reactivate(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    set_active(pool, user_id, true).await
}

async fn set_active(pool: &SqlitePool, user_id: i64, active: bool) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET active = ? WHERE id = ?")
        .bind(active)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(())
}

/// Replaces a user's role set with the named roles.
/// Unknown role names fail with `NotFound` and nothing changes.
pub async fn assign_roles(
    pool: &SqlitePool,
    user_id: i64,
    roles: &[String],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let mut role_ids = Vec::with_capacity(roles.len());
    for name in roles {
        let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", name)))?;
        role_ids.push(role_id);
    }

    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for role_id in role_ids {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Removes an account entirely. Blocked with `HasDependents` while any
/// Score references the user; deactivate instead in that case.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let score_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scores WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    if score_count > 0 {
        return Err(AppError::HasDependents(
            "User has recorded scores; deactivate the account instead".to_string(),
        ));
    }

    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tx.commit().await?;

    Ok(())
}

/// Lists the roles known to the system.
pub async fn list_roles(pool: &SqlitePool) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(roles)
}

/// Lists all users with their aggregated role sets.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserWithRoles>, AppError> {
    let users = sqlx::query_as::<_, UserWithRoles>(
        r#"
        SELECT
            u.id, u.email, u.active, u.created_at,
            (SELECT group_concat(r.name)
             FROM roles r JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = u.id) AS roles
        FROM users u
        ORDER BY u.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Ensures the configured admin account exists. Called once at startup.
pub async fn seed_admin(pool: &SqlitePool, email: &str, password: &str) -> Result<(), AppError> {
    let email = email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    let hashed_password = hash_password(password)?;

    let mut tx = pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, password) VALUES (?, ?) RETURNING id",
    )
    .bind(&email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = 'admin'",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Admin user created successfully.");
    Ok(())
}
