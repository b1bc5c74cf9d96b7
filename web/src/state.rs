use crate::config::EnvConfig;
use anyhow::{Context, Result};
use libecoleta::Database;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, trace};

#[derive(Debug)]
pub struct SharedState {
    pub db: Database,
    pub config: EnvConfig,
}

impl SharedState {
    pub async fn new(env: EnvConfig) -> Result<Self> {
        trace!("Creating shared app state");
        let db = Database::open(&env.database)
            .await
            .with_context(|| format!("Unable to open database {}", &env.database))?;
        debug!(upload_dir = %env.upload_dir, "Ensuring upload directory exists");
        tokio::fs::create_dir_all(&env.upload_dir)
            .await
            .with_context(|| format!("Unable to create upload directory {}", &env.upload_dir))?;
        Ok(Self { db, config: env })
    }

    /// The directory where uploaded images are written
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.upload_dir)
    }

    #[cfg(test)]
    pub fn test(pool: sqlx::Pool<sqlx::Sqlite>, upload_dir: &std::path::Path) -> Self {
        debug!("Creating test shared app state");
        Self {
            db: pool.into(),
            config: EnvConfig {
                listen: crate::config::ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 3333,
                },
                database: "test-database.sqlite".to_string(),
                upload_dir: upload_dir.to_string_lossy().into_owned(),
                max_upload_size: 1024 * 1024,
            },
        }
    }
}

pub type AppState = Arc<SharedState>;
