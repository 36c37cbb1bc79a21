//! 批处理流水线：读取 → 筛选 → 分析

use anyhow::{Context, Result};
use ctpa_context::{AnalysisResult, KnowledgeBase, ReportAnalyzer};
use ctpa_core::{AppConfig, FilteredReport, RequiredKeywords};
use ctpa_database::{JsonReportSource, MySqlReportSource, ReportSource};
use ctpa_report::clean_reports;
use tracing::info;

/// 根据配置选择报告来源，设置了离线文件时不访问数据库
pub fn report_source(config: &AppConfig) -> Box<dyn ReportSource> {
    match &config.report.reports_file {
        Some(path) => Box::new(JsonReportSource::new(path.clone())),
        None => Box::new(MySqlReportSource::new(config.database.clone())),
    }
}

/// 读取并筛选报告
pub async fn fetch_filtered(source: &dyn ReportSource, config: &AppConfig) -> Result<Vec<FilteredReport>> {
    info!("读取报告: {}", source.describe());
    let reports = source
        .fetch_reports()
        .await
        .with_context(|| format!("Failed to fetch reports from {}", source.describe()))?;

    Ok(clean_reports(
        &reports,
        &config.report.section_markers,
        RequiredKeywords::CHEST_CT,
    ))
}

/// 对筛选后的报告逐份分析印象段
pub async fn analyze_filtered(config: &AppConfig, reports: &[FilteredReport]) -> Result<Vec<AnalysisResult>> {
    let kb = KnowledgeBase::load(&config.knowledge_base)
        .await
        .context("Failed to load knowledge base")?;
    let analyzer = ReportAnalyzer::new(kb);

    let results = analyzer.analyze_all(reports.iter().map(|r| r.impression.as_str()));
    info!("完成 {} 份报告的分析", results.len());
    Ok(results)
}
