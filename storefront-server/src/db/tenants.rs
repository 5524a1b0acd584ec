use sqlx::PgPool;

use shared::models::TenantStatus;

#[derive(sqlx::FromRow)]
#[allow(dead_code)]
pub struct Tenant {
    pub id: String,
    pub email: String,
    pub hashed_password: String,
    pub name: Option<String>,
    pub status: String,
    pub created_at: i64,
}

pub async fn create(
    pool: &PgPool,
    id: &str,
    email: &str,
    hashed_password: &str,
    name: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tenants (id, email, hashed_password, name, status, created_at)
         VALUES ($1, $2, $3, $4, 'active', $5)",
    )
    .bind(id)
    .bind(email)
    .bind(hashed_password)
    .bind(name)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tenants WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tenants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Look up a tenant by email and verify the password.
///
/// Returns `None` for unknown emails, non-active accounts, and password
/// mismatches alike, so callers cannot distinguish which check failed.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<Tenant>, sqlx::Error> {
    let tenant: Option<Tenant> = find_by_email(pool, email).await?;

    let Some(tenant) = tenant else {
        return Ok(None);
    };

    if TenantStatus::from_db(&tenant.status) != Some(TenantStatus::Active) {
        return Ok(None);
    }

    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let hash = match PasswordHash::new(&tenant.hashed_password) {
        Ok(h) => h,
        Err(_) => return Ok(None),
    };

    if Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
    {
        Ok(Some(tenant))
    } else {
        Ok(None)
    }
}
