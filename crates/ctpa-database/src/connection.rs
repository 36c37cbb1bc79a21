//! 数据库连接管理

use ctpa_core::config::DatabaseConfig;
use ctpa_core::Result;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

/// 数据库连接池
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.url)
            .await?;
        info!("Connected to report database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// 关闭连接池
    pub async fn close(self) {
        self.pool.close().await;
    }
}
