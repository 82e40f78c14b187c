use crate::data::{db_error, sqlstate};
use crate::domain::error::DomainError;
use crate::domain::user::{PublicUser, User};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    /// Case-insensitive match on username, names or email.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<PublicUser>, DomainError>;
    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError>;
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_staff, date_joined";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create user: {}", e);
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .map(str::to_owned);
            match constraint.as_deref() {
                Some(c) if c.contains("users_email") => {
                    DomainError::UserAlreadyExists("email already registered".to_string())
                }
                Some(c) if c.contains("users_username") => {
                    DomainError::UserAlreadyExists("username already taken".to_string())
                }
                _ if sqlstate(&e).as_deref() == Some("23505") => {
                    DomainError::UserAlreadyExists(user.username.clone())
                }
                _ => DomainError::Internal(format!("database error: {}", e)),
            }
        })?;

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to find user by email"))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to find user by username"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to find user by id"))
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<PublicUser>, DomainError> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, username, first_name, last_name
            FROM users
            WHERE username ILIKE $1
               OR first_name ILIKE $1
               OR last_name ILIKE $1
               OR email ILIKE $1
            ORDER BY username
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to search users"))
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY date_joined LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to list users"))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<(), DomainError> {
        let updated = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, is_staff = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(is_staff)
        .execute(&self.pool)
        .await
        .map_err(db_error("failed to update credentials"))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id.to_string()));
        }
        info!(user_id = %id, "credentials updated");
        Ok(())
    }
}

/// Escapes LIKE wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
