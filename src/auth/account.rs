//! Account records and the read-only account store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::fmt;
use tracing::Instrument;
use utoipa::ToSchema;

/// A persisted account as stored in the `users` table.
#[derive(Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub role: String,
}

impl Account {
    /// Split the account into its public projection and the stored hash.
    #[must_use]
    pub fn into_parts(self) -> (AccountProjection, String) {
        (
            AccountProjection {
                id: self.id,
                name: self.name,
                email: self.email,
                role: self.role,
            },
            self.password,
        )
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// What a successful credential check returns. Never carries the hash.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountProjection {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find the single account whose email matches exactly.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}

/// Postgres-backed account store.
#[derive(Clone, Debug)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FIND_BY_EMAIL_SQL: &str =
    "SELECT id::text AS id, name, email, password, role FROM users WHERE email = $1";

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = FIND_BY_EMAIL_SQL;
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account")?;

        row.map(|row| -> Result<Account> {
            Ok(Account {
                id: row.try_get("id").context("account id")?,
                name: row.try_get("name").context("account name")?,
                email: row.try_get("email").context("account email")?,
                password: row.try_get("password").context("account password")?,
                role: row.try_get("role").context("account role")?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, PgConnection, postgres::PgPoolOptions};

    const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

    fn account() -> Account {
        Account {
            id: "42".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: "student".to_string(),
        }
    }

    #[test]
    fn into_parts_separates_hash() {
        let (projection, hash) = account().into_parts();
        assert_eq!(
            projection,
            AccountProjection {
                id: "42".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                role: "student".to_string(),
            }
        );
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn debug_redacts_password_hash() {
        let debug = format!("{:?}", account());
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn projection_serializes_without_password() -> Result<()> {
        let (projection, _) = account().into_parts();
        let value = serde_json::to_value(&projection)?;
        assert!(value.get("password").is_none());
        assert_eq!(
            value.get("role").and_then(serde_json::Value::as_str),
            Some("student")
        );
        Ok(())
    }

    #[test]
    fn schema_has_every_selected_column() {
        let table = SCHEMA_SQL
            .split("CREATE TABLE IF NOT EXISTS users")
            .nth(1)
            .and_then(|rest| rest.split(");").next())
            .unwrap_or_default();
        assert!(!table.is_empty(), "users table missing from schema.sql");

        let columns: Vec<&str> = table
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .collect();
        for column in ["id", "name", "email", "password", "role"] {
            assert!(columns.contains(&column), "users.{column} missing");
        }
        assert!(table.contains("email      TEXT NOT NULL UNIQUE"));
        assert!(FIND_BY_EMAIL_SQL.ends_with("FROM users WHERE email = $1"));
    }

    /// Runs against a live database when `COURSELY_TEST_DSN` is set.
    async fn test_pool() -> Result<Option<PgPool>> {
        let Ok(dsn) = std::env::var("COURSELY_TEST_DSN") else {
            eprintln!("Skipping integration test: COURSELY_TEST_DSN not set");
            return Ok(None);
        };

        let mut connection = PgConnection::connect(&dsn)
            .await
            .context("failed to connect for schema setup")?;
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&mut connection)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&dsn)
            .await
            .context("failed to connect test pool")?;
        Ok(Some(pool))
    }

    fn split_sql_statements(sql: &str) -> Vec<String> {
        let mut statements = Vec::new();
        let mut current = String::new();

        for line in sql.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("--") {
                continue;
            }
            current.push_str(line);
            current.push('\n');

            if trimmed.ends_with(';') {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
        }

        let leftover = current.trim();
        if !leftover.is_empty() {
            statements.push(leftover.to_string());
        }

        statements
    }

    #[test]
    fn split_sql_statements_skips_comments() {
        let statements = split_sql_statements("-- note\nCREATE TABLE a (x INT);\nSELECT 1;\n");
        assert_eq!(statements, vec!["CREATE TABLE a (x INT);", "SELECT 1;"]);
        assert_eq!(split_sql_statements(SCHEMA_SQL).len(), 1);
    }

    #[tokio::test]
    async fn pg_store_finds_account_by_exact_email() -> Result<()> {
        let Some(pool) = test_pool().await? else {
            return Ok(());
        };

        let email = format!("{}@coursely.test", ulid::Ulid::new().to_string().to_lowercase());
        let id: String = sqlx::query_scalar(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING id::text",
        )
        .bind("Alice")
        .bind(&email)
        .bind("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
        .bind("student")
        .fetch_one(&pool)
        .await?;

        let store = PgAccountStore::new(pool.clone());
        let found = store.find_by_email(&email).await?.context("account not found")?;
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Alice");
        assert_eq!(found.role, "student");
        assert!(found.password.starts_with("$argon2id$"));

        assert!(store.find_by_email(&email.to_uppercase()).await?.is_none());
        assert!(store.find_by_email("nobody@coursely.test").await?.is_none());

        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(&email)
            .execute(&pool)
            .await?;
        Ok(())
    }
}
