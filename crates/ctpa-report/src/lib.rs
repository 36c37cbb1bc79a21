//! # CTPA报告筛选模块
//!
//! 提供报告预处理功能，包括：
//! - 印象段提取：按分段标记的优先级截取报告结论部分
//! - 报告筛选：丢弃无印象段的报告，只保留胸部CT报告

pub mod filter;
pub mod section;

// 重新导出主要类型
pub use filter::{clean_reports, FilterStats, ReportFilter};
pub use section::find_impression;
