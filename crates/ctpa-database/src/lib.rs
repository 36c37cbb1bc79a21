//! # CTPA数据库模块
//!
//! 负责从MIMIC-II风格的MySQL库中读取放射报告，也支持从JSON文件离线读取。

pub mod connection;
pub mod models;
pub mod queries;
pub mod source;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use models::DbReport;
pub use queries::ReportQueries;
pub use source::{JsonReportSource, MySqlReportSource, ReportSource};
