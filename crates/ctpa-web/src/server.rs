//! Web服务器

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use ctpa_core::Result;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    get_report, get_report_graph, get_report_html, health, index_page, list_reports, SharedViewer,
};
use crate::viewer::MarkupViewer;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, viewer: MarkupViewer) -> Self {
        let app = Self::create_app(Arc::new(viewer));
        Self { addr, app }
    }

    pub fn create_app(viewer: SharedViewer) -> Router {
        Router::new()
            // 浏览页面
            .route("/", get(index_page))
            // 健康检查
            .route("/health", get(health))
            // API路由
            .nest("/api/v1", api_routes())
            .with_state(viewer)
            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting markup viewer on http://{}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// API v1 路由
fn api_routes() -> Router<SharedViewer> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/:index", get(get_report))
        .route("/reports/:index/html", get(get_report_html))
        .route("/reports/:index/graph.dot", get(get_report_graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use ctpa_context::{KnowledgeBase, ReportAnalyzer};
    use ctpa_core::ColorMap;
    use tower::ServiceExt;

    fn app() -> Router {
        let kb = KnowledgeBase::from_sources(
            "Lex\tType\tRegex\tDirection\nno\tDEFINITE_NEGATED_EXISTENCE\t\tforward\n",
            "Lex\tType\tRegex\tDirection\npulmonary embolism\tPULMONARY_EMBOLISM\t\t\n",
            "@CLASSIFICATION_RULE,DISEASE_STATE_RULE,0,DEFINITE_NEGATED_EXISTENCE\n",
            "1,Negative,DISEASE_STATE == 0\n2,Positive,DISEASE_STATE == 1\n",
        )
        .unwrap();
        let results = ReportAnalyzer::new(kb).analyze_all(["No pulmonary embolism.", "Pulmonary embolism."]);
        WebServer::create_app(Arc::new(MarkupViewer::new(results, ColorMap::default())))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("healthy"));
    }

    #[tokio::test]
    async fn test_index_page_slider_bounds() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"type="range" min="0" max="1""#));
    }

    #[tokio::test]
    async fn test_list_reports() {
        let (status, body) = get("/api/v1/reports").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["reports"][1]["classification"]["pulmonary_embolism"]["label"], "Positive");
    }

    #[tokio::test]
    async fn test_report_html_and_graph() {
        let (status, html) = get("/api/v1/reports/0/html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("style=\"color:red\""));

        let (status, graph) = get("/api/v1/reports/0/graph.dot").await;
        assert_eq!(status, StatusCode::OK);
        assert!(graph.contains("m0 -> t1;"));
    }

    #[tokio::test]
    async fn test_report_out_of_range() {
        let (status, body) = get("/api/v1/reports/5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("error"));
    }
}
