//! Account storage

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{NewUser, User},
    password,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

/// Columns a single account can be looked up by
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Id,
    Email,
    Username,
}

impl Lookup {
    fn column(self) -> &'static str {
        match self {
            Lookup::Id => "id",
            Lookup::Email => "email",
            Lookup::Username => "username",
        }
    }
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the account with an argon2 hash of `new_user.password`
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let password_hash = password::hash_password(&new_user.password)?;

        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        let user = user_from_row(&row);
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&select_by(Lookup::Id))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    /// `email` must already be normalized
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by_text(Lookup::Email, email).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_by_text(Lookup::Username, username).await
    }

    async fn find_by_text(&self, lookup: Lookup, value: &str) -> Result<Option<User>> {
        let row = sqlx::query(&select_by(lookup))
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub fn verify_password(&self, user: &User, candidate: &str) -> Result<bool> {
        password::verify_password(candidate, &user.password_hash)
    }
}

fn select_by(lookup: Lookup) -> String {
    format!(
        "SELECT {} FROM users WHERE {} = $1",
        USER_COLUMNS,
        lookup.column()
    )
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// True when `error` wraps a PostgreSQL unique constraint violation
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_column() {
        assert_eq!(
            select_by(Lookup::Email),
            "SELECT id, username, email, password_hash, created_at, updated_at FROM users WHERE email = $1"
        );
        assert!(select_by(Lookup::Username).ends_with("WHERE username = $1"));
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&anyhow::anyhow!("boom")));
        assert!(!is_unique_violation(&anyhow::Error::from(
            sqlx::Error::RowNotFound
        )));
    }
}
