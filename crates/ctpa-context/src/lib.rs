//! # CTPA上下文分析模块
//!
//! 对放射报告做上下文标注和文档级分类，包括：
//! - 词典加载：修饰词（否定、不确定、既往等）与目标词（临床发现）
//! - 上下文标注：按句子标记目标词和修饰词，并计算修饰范围
//! - 分类规则与分类模式：把修饰状态映射为最终分类值
//! - 报告分析器：把以上步骤串成一次调用

pub mod analyzer;
pub mod classifier;
mod delimited;
pub mod item_data;
pub mod knowledge_base;
pub mod markup;
pub mod resource;
pub mod rules;
pub mod schema;
pub mod sentence;

// 重新导出主要类型
pub use analyzer::{AnalysisResult, ReportAnalyzer, EXAM_TYPE_CTPA};
pub use classifier::{classify_document_targets, DocumentClassification, TargetClassification, TargetStates};
pub use item_data::{ContextItem, ItemData, ItemRule};
pub use knowledge_base::KnowledgeBase;
pub use markup::{mark_report, ContextDocument, Edge, Tag, TagKind, TaggedSentence};
pub use rules::ClassificationRules;
pub use schema::{Schema, SchemaEntry, StateVariable};
pub use sentence::split_sentences;
