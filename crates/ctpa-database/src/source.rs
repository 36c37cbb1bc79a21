//! 报告来源

use async_trait::async_trait;
use ctpa_core::config::DatabaseConfig;
use ctpa_core::{CtpaError, Report, Result};
use tracing::info;

use crate::connection::DatabasePool;
use crate::queries::ReportQueries;

/// 报告来源：一次性读取全部报告
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_reports(&self) -> Result<Vec<Report>>;

    /// 来源描述，用于日志
    fn describe(&self) -> String;
}

/// MySQL报告来源，连接只在一次读取内存在
pub struct MySqlReportSource {
    config: DatabaseConfig,
}

impl MySqlReportSource {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ReportSource for MySqlReportSource {
    async fn fetch_reports(&self) -> Result<Vec<Report>> {
        let pool = DatabasePool::new(&self.config).await?;
        let result = ReportQueries::new(&pool).fetch_radiology_reports().await;
        pool.close().await;
        result
    }

    fn describe(&self) -> String {
        // 不输出连接串中的口令
        let host = self
            .config
            .url
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or("database");
        format!("mysql://{}", host)
    }
}

/// JSON文件报告来源：`[{"text": ..., "code": ..., "subject_id": ...}]`
pub struct JsonReportSource {
    path: String,
}

impl JsonReportSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReportSource for JsonReportSource {
    async fn fetch_reports(&self) -> Result<Vec<Report>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CtpaError::NotFound(self.path.clone())
            } else {
                CtpaError::Io(e)
            }
        })?;
        let reports: Vec<Report> = serde_json::from_str(&content)?;
        info!("Loaded {} reports from {}", reports.len(), self.path);
        Ok(reports)
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}
