//! 核心数据模型定义

use serde::{Deserialize, Serialize};

/// 默认的报告分段标记，按优先级排列
pub const DEFAULT_SECTION_MARKERS: [&str; 3] = ["IMPRESSION:", "INTERPRETATION:", "CONCLUSION:"];

/// 放射报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub text: String,                 // 报告原文
    pub code: String,                 // ICD-9 诊断编码
    #[serde(default)]
    pub subject_id: Option<i64>,      // 患者标识
}

impl Report {
    pub fn new(text: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: code.into(),
            subject_id: None,
        }
    }
}

/// 报告分段标记
///
/// 顺序即优先级：列表中第一个出现在报告里的标记生效，与其在文本中的位置无关。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionMarkers(Vec<String>);

impl SectionMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(markers.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION_MARKERS)
    }
}

/// 报告筛选所需的关键词对（部位 + 检查方式）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredKeywords {
    pub body_region: &'static str,
    pub modality: &'static str,
}

impl RequiredKeywords {
    /// 胸部CT
    pub const CHEST_CT: RequiredKeywords = RequiredKeywords {
        body_region: "chest",
        modality: "ct",
    };
}

impl Default for RequiredKeywords {
    fn default() -> Self {
        Self::CHEST_CT
    }
}

/// 筛选后的报告：原文、印象段、编码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredReport {
    pub text: String,
    pub impression: String,
    pub code: String,
}
