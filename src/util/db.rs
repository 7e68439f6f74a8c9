use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use tracing::{info, instrument};

use crate::error::SyncResult;

/// Single-connection pool over whichever driver the URL names (mysql:// or sqlite:).
#[derive(Clone)]
pub struct Db {
    pub pool: AnyPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> SyncResult<Self> {
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }

    /// Release the connection. Idempotent.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("db connection closed");
        }
    }
}
