//! 知识库资源读取：远程URL或本地文件

use ctpa_core::utils::is_remote_resource;
use ctpa_core::{CtpaError, Result};
use tracing::{debug, info};

/// 读取资源全文
pub async fn fetch_resource(location: &str) -> Result<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(CtpaError::Config("知识库资源位置为空".to_string()));
    }

    if is_remote_resource(location) {
        info!("Fetching knowledge base resource: {}", location);
        let response = reqwest::get(location)
            .await
            .map_err(|e| CtpaError::Network(format!("{}: {}", location, e)))?
            .error_for_status()
            .map_err(|e| CtpaError::Network(format!("{}: {}", location, e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| CtpaError::Network(format!("{}: {}", location, e)))?;
        debug!("Fetched {} bytes from {}", body.len(), location);
        Ok(body)
    } else {
        debug!("Reading knowledge base file: {}", location);
        tokio::fs::read_to_string(location).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CtpaError::NotFound(location.to_string())
            } else {
                CtpaError::Io(e)
            }
        })
    }
}
