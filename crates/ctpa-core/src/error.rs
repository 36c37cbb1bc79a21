//! 错误定义模块

use thiserror::Error;

/// 报告分析系统统一错误类型
#[derive(Error, Debug)]
pub enum CtpaError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("知识库错误: {0}")]
    KnowledgeBase(String),

    #[error("解析错误: {resource} 第{line}行: {message}")]
    Parse {
        resource: String,
        line: usize,
        message: String,
    },

    #[error("网络错误: {0}")]
    Network(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("资源未找到: {0}")]
    NotFound(String),
}

impl CtpaError {
    /// 构造带资源名和行号的解析错误
    pub fn parse(resource: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        CtpaError::Parse {
            resource: resource.into(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for CtpaError {
    fn from(err: sqlx::Error) -> Self {
        CtpaError::Database(err.to_string())
    }
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, CtpaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = CtpaError::parse("schema.csv", 3, "缺少规则表达式");
        assert_eq!(err.to_string(), "解析错误: schema.csv 第3行: 缺少规则表达式");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CtpaError = io.into();
        assert!(matches!(err, CtpaError::Io(_)));
    }
}
