/// 门户 HTTP 客户端
///
/// 扩展信息（欠款、申报遗漏）不经过浏览器，直接 GET 查询端点
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// HTTP GET 能力
///
/// 超时必须返回 `QueryError::NetworkTimeout`。
#[allow(async_fn_in_trait)]
pub trait HttpFetcher {
    async fn get(&self, url: &str, params: &[(&str, &str)], timeout: Duration) -> Result<String>;
}

/// 基于 reqwest 的实现
#[derive(Clone, Default)]
pub struct PortalHttpClient {
    client: reqwest::Client,
}

impl PortalHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpFetcher for PortalHttpClient {
    async fn get(&self, url: &str, params: &[(&str, &str)], timeout: Duration) -> Result<String> {
        debug!("GET {} 参数: {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
