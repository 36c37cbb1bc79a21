//! # CTPA Core
//!
//! 放射报告分析流水线的核心模块，提供基础数据结构、错误定义、配置和通用工具。

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use config::{AnalysisOptions, AppConfig, ColorMap};
pub use error::{CtpaError, Result};
pub use models::*;
