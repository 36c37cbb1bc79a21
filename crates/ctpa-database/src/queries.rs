//! 数据库查询操作

use ctpa_core::{Report, Result};
use tracing::{info, warn};

use crate::connection::DatabasePool;
use crate::models::DbReport;

/// 肺栓塞相关诊断（ICD-9 415.1x）的放射报告，查询条件固定
pub const RADIOLOGY_REPORTS_SQL: &str = r#"
    SELECT DISTINCT noteevents.subject_id,
           noteevents.text,
           icd9.code
    FROM noteevents INNER JOIN icd9 ON
           noteevents.subject_id = icd9.subject_id
    WHERE icd9.code LIKE '415.1%'
          AND noteevents.category = 'RADIOLOGY_REPORT'
"#;

/// 数据库查询操作接口
pub struct ReportQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> ReportQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    /// 读取放射报告，丢弃文本或编码为NULL的行
    pub async fn fetch_radiology_reports(&self) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, DbReport>(RADIOLOGY_REPORTS_SQL)
            .fetch_all(self.pool.pool())
            .await?;

        let total = rows.len();
        let reports: Vec<Report> = rows.into_iter().filter_map(DbReport::into_report).collect();
        if reports.len() < total {
            warn!("丢弃 {} 行文本或编码为空的记录", total - reports.len());
        }
        info!("Fetched {} radiology reports", reports.len());
        Ok(reports)
    }
}
