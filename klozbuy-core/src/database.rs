use crate::common::error::{KlozbuyError, Result};
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Owns the libSQL database handle and hands out configured connections.
pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Connect to a remote Turso database (`libsql://`, `https://`, `wss://`)
    /// or open a local file (`file:` prefix optional).
    pub async fn new(url: &str, auth_token: Option<&str>) -> Result<Self> {
        let db = if is_remote(url) {
            let auth_token = auth_token.ok_or_else(|| KlozbuyError::Database {
                message: "an auth token is required for remote databases".to_string(),
            })?;
            info!("Connecting to Turso database at {}", url);
            Builder::new_remote(url.to_string(), auth_token.to_string())
                .build()
                .await
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            info!("Opening local database at {}", path);
            Builder::new_local(path).build().await
        }
        .map_err(|e| KlozbuyError::Database {
            message: format!("Failed to connect to database: {e}"),
        })?;

        Ok(Self { db })
    }

    /// Create a manager from `LIBSQL_URL` and `LIBSQL_AUTH_TOKEN`.
    pub async fn from_env() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| KlozbuyError::Database {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;
        let auth_token = env::var("LIBSQL_AUTH_TOKEN").ok();
        Self::new(&url, auth_token.as_deref()).await
    }

    /// Get a connection with foreign key enforcement switched on.
    pub async fn get_connection(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(|e| KlozbuyError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| KlozbuyError::Database {
                message: format!("Failed to enable foreign keys: {e}"),
            })?;
        Ok(conn)
    }

    /// Run database migrations. Every statement is idempotent.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;
        for (name, sql) in MIGRATIONS {
            conn.execute_batch(sql)
                .await
                .map_err(|e| KlozbuyError::Database {
                    message: format!("Failed to run migration {name}: {e}"),
                })?;
            info!("Applied migration {}", name);
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn is_remote(url: &str) -> bool {
    ["libsql://", "https://", "http://", "wss://", "ws://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_urls_are_detected() {
        assert!(is_remote("libsql://klozbuy-prod.turso.io"));
        assert!(!is_remote("file:klozbuy.db"));
        assert!(!is_remote("./data/klozbuy.db"));
    }

    #[tokio::test]
    async fn migrations_can_run_twice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("klozbuy.db");
        let manager = DatabaseManager::new(path.to_str().expect("utf-8 path"), None)
            .await
            .expect("open database");
        manager.run_migrations().await.expect("first run");
        manager.run_migrations().await.expect("second run");
    }
}
