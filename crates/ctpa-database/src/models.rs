//! 数据库模型

use ctpa_core::Report;
use sqlx::FromRow;

/// 查询返回的报告行，文本和编码可能为NULL
#[derive(Debug, Clone, FromRow)]
pub struct DbReport {
    pub subject_id: Option<i64>,
    pub text: Option<String>,
    pub code: Option<String>,
}

impl DbReport {
    /// 转为报告；文本或编码为NULL时返回 `None`
    pub fn into_report(self) -> Option<Report> {
        let report = Report {
            text: self.text?,
            code: self.code?,
            subject_id: self.subject_id,
        };
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_report() {
        let row = DbReport {
            subject_id: Some(42),
            text: Some("CT chest. IMPRESSION: PE".to_string()),
            code: Some("415.19".to_string()),
        };
        let report = row.into_report().unwrap();
        assert_eq!(report.subject_id, Some(42));
        assert_eq!(report.code, "415.19");
    }

    #[test]
    fn test_null_columns_are_dropped() {
        let no_text = DbReport {
            subject_id: Some(1),
            text: None,
            code: Some("415.19".to_string()),
        };
        let no_code = DbReport {
            subject_id: None,
            text: Some("text".to_string()),
            code: None,
        };
        assert!(no_text.into_report().is_none());
        assert!(no_code.into_report().is_none());
    }
}
