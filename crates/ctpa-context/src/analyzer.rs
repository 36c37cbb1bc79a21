//! 报告分析器

use ctpa_core::utils::preview;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{classify_document_targets, DocumentClassification};
use crate::knowledge_base::KnowledgeBase;
use crate::markup::{mark_report, ContextDocument};

/// 检查类型：CT肺动脉造影
pub const EXAM_TYPE_CTPA: &str = "ctpa";

/// 单份报告的分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub markup: ContextDocument,
    pub exam_type: String,
    pub report_text: String,
    pub classification: DocumentClassification,
}

/// 报告分析器
#[derive(Debug, Clone)]
pub struct ReportAnalyzer {
    kb: KnowledgeBase,
}

impl ReportAnalyzer {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    /// 标注并分类一份报告
    pub fn analyze(&self, report: &str) -> AnalysisResult {
        let markup = mark_report(report, &self.kb.modifiers, &self.kb.targets);
        let classification = classify_document_targets(&markup, &self.kb.rules, &self.kb.schema);
        debug!(
            "Analyzed '{}': {} categories classified",
            preview(report, 60),
            classification.len()
        );

        AnalysisResult {
            markup,
            exam_type: EXAM_TYPE_CTPA.to_string(),
            report_text: report.to_string(),
            classification,
        }
    }

    /// 批量分析，结果顺序与输入一致
    pub fn analyze_all<'a, I>(&self, reports: I) -> Vec<AnalysisResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        reports.into_iter().map(|report| self.analyze(report)).collect()
    }
}
