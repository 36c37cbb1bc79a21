//! 报告筛选
//!
//! 为每份报告提取印象段，丢弃没有印象段的报告，再按部位和检查方式关键词筛选。

use ctpa_core::utils::contains_ignore_case;
use ctpa_core::{FilteredReport, Report, RequiredKeywords, SectionMarkers};
use serde::Serialize;
use tracing::{debug, info};

use crate::section::find_impression;

/// 一次筛选的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub input: usize,
    pub missing_section: usize,
    pub keyword_rejected: usize,
    pub kept: usize,
}

/// 报告筛选器
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    markers: SectionMarkers,
    keywords: RequiredKeywords,
}

impl ReportFilter {
    pub fn new(markers: SectionMarkers, keywords: RequiredKeywords) -> Self {
        Self { markers, keywords }
    }

    /// 报告原文是否同时包含两个关键词（大小写不敏感）
    pub fn matches_keywords(&self, text: &str) -> bool {
        contains_ignore_case(text, self.keywords.body_region)
            && contains_ignore_case(text, self.keywords.modality)
    }

    /// 执行筛选，输出顺序与输入顺序一致
    pub fn apply(&self, reports: &[Report]) -> (Vec<FilteredReport>, FilterStats) {
        let mut stats = FilterStats {
            input: reports.len(),
            ..FilterStats::default()
        };

        let filtered: Vec<FilteredReport> = reports
            .iter()
            .filter_map(|report| {
                let Some(impression) = find_impression(&report.text, &self.markers) else {
                    stats.missing_section += 1;
                    return None;
                };
                if !self.matches_keywords(&report.text) {
                    stats.keyword_rejected += 1;
                    return None;
                }
                Some(FilteredReport {
                    text: report.text.clone(),
                    impression: impression.to_string(),
                    code: report.code.clone(),
                })
            })
            .collect();

        stats.kept = filtered.len();
        debug!("Filter stats: {:?}", stats);
        (filtered, stats)
    }
}

/// 筛选报告：保留有印象段且为胸部CT的报告
pub fn clean_reports(
    reports: &[Report],
    markers: &SectionMarkers,
    keywords: RequiredKeywords,
) -> Vec<FilteredReport> {
    let (filtered, stats) = ReportFilter::new(markers.clone(), keywords).apply(reports);
    info!(
        "筛选完成: 输入 {} 份, 无印象段 {} 份, 关键词不符 {} 份, 保留 {} 份",
        stats.input, stats.missing_section, stats.keyword_rejected, stats.kept
    );
    filtered
}
