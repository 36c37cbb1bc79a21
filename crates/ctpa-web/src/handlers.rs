//! HTTP处理器

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use ctpa_core::utils::preview;
use ctpa_core::CtpaError;
use serde_json::json;
use tracing::{info, warn};

use crate::viewer::MarkupViewer;

pub type SharedViewer = Arc<MarkupViewer>;

/// API错误响应
#[derive(Debug)]
pub struct ApiError(CtpaError);

impl From<CtpaError> for ApiError {
    fn from(err: CtpaError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CtpaError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed: {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 报告列表
pub async fn list_reports(State(viewer): State<SharedViewer>) -> impl IntoResponse {
    let reports: Vec<_> = viewer
        .results()
        .iter()
        .enumerate()
        .map(|(index, result)| {
            json!({
                "index": index,
                "exam_type": result.exam_type,
                "preview": preview(&result.report_text, 80),
                "classification": result.classification,
            })
        })
        .collect();

    Json(json!({
        "total": viewer.len(),
        "reports": reports,
    }))
}

/// 单份报告的完整分析结果
pub async fn get_report(
    State(viewer): State<SharedViewer>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ApiError> {
    let result = viewer.result(index)?;
    Ok(Json(result.clone()))
}

/// 着色HTML
pub async fn get_report_html(
    State(viewer): State<SharedViewer>,
    Path(index): Path<usize>,
) -> Result<Html<String>, ApiError> {
    info!("Rendering report {}", index);
    let rendered = viewer.render(index)?;
    Ok(Html(rendered.html))
}

/// Graphviz标注图
pub async fn get_report_graph(
    State(viewer): State<SharedViewer>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ApiError> {
    let rendered = viewer.render(index)?;
    Ok(([(header::CONTENT_TYPE, "text/vnd.graphviz; charset=utf-8")], rendered.graph))
}

/// 浏览页面：滑块范围 [0, N-1]，每次移动时请求对应报告的渲染结果
pub async fn index_page(State(viewer): State<SharedViewer>) -> Html<String> {
    let max = viewer.len().saturating_sub(1);
    let disabled = if viewer.is_empty() { " disabled" } else { "" };
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>CTPA Markup Viewer</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
pre {{ background: #f5f5f5; padding: 1em; overflow-x: auto; }}
</style>
</head>
<body>
<h1>CTPA Markup Viewer</h1>
<p>共 {total} 份报告</p>
<input id="index" type="range" min="0" max="{max}" value="0"{disabled}>
<span id="current">0</span>
<h2>Markup</h2>
<div id="markup"></div>
<h2>Classification</h2>
<pre id="classification"></pre>
<h2>Graph (DOT)</h2>
<pre id="graph"></pre>
<script>
async function show(i) {{
  document.getElementById('current').textContent = i;
  const base = '/api/v1/reports/' + i;
  document.getElementById('markup').innerHTML = await (await fetch(base + '/html')).text();
  document.getElementById('graph').textContent = await (await fetch(base + '/graph.dot')).text();
  const result = await (await fetch(base)).json();
  document.getElementById('classification').textContent = JSON.stringify(result.classification, null, 2);
}}
const slider = document.getElementById('index');
slider.addEventListener('input', () => show(slider.value));
if (!slider.disabled) show(0);
</script>
</body>
</html>
"#,
        total = viewer.len(),
        max = max,
        disabled = disabled,
    ))
}
