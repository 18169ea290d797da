//! 单个 RUC 查询处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **快速校验**：RUC 格式和校验位不通过时直接返回错误，不占用浏览器
//! 2. **会话管理**：每次尝试创建一个 `QuerySession`，结束时回到顶层文档
//! 3. **错误兜底**：查询过程中的任何错误都记录日志并返回 `None`；
//!    网络超时额外等待一段时间，可按配置整体重试

use std::time::Duration;

use tracing::{error, info, warn};

use crate::browser::BrowserDriver;
use crate::clients::{HttpFetcher, OcrEngine};
use crate::config::Config;
use crate::error::Result;
use crate::models::{TaxpayerId, TaxpayerRecord};
use crate::workflow::{QueryFlow, QuerySession};

/// 查询处理器
///
/// 所有查询方法都需要 `&mut self`：同一时间只有一个查询使用浏览器会话。
pub struct QueryProcessor<D: BrowserDriver, O: OcrEngine, H: HttpFetcher> {
    driver: D,
    flow: QueryFlow<O, H>,
    timeout_pause: Duration,
    timeout_retries: u32,
}

impl<D: BrowserDriver, O: OcrEngine, H: HttpFetcher> QueryProcessor<D, O, H> {
    pub fn new(driver: D, ocr: O, http: H, config: &Config) -> Self {
        Self {
            driver,
            flow: QueryFlow::new(ocr, http, config),
            timeout_pause: config.timeout_pause(),
            timeout_retries: config.timeout_retries,
        }
    }

    /// 查询 RUC 对应的纳税人记录
    ///
    /// # 返回
    /// - `Err(MalformedId | InvalidId)`：RUC 未通过校验
    /// - `Ok(None)`：查询过程出错，已记录日志
    /// - `Ok(Some(record))`：查询成功
    pub async fn get_record(&mut self, ruc: &str) -> Result<Option<TaxpayerRecord>> {
        let id = TaxpayerId::parse(ruc)?;
        Ok(self.query(&id).await)
    }

    /// 整数形式的 RUC
    pub async fn get_record_by_number(&mut self, ruc: u64) -> Result<Option<TaxpayerRecord>> {
        let id = TaxpayerId::from_number(ruc)?;
        Ok(self.query(&id).await)
    }

    /// 按名称搜索 RUC（尚未支持）
    pub fn search_by_name(&self, name: &str) -> Vec<TaxpayerId> {
        warn!("⚠️ 暂不支持按名称搜索: {}", name);
        Vec::new()
    }

    async fn query(&mut self, id: &TaxpayerId) -> Option<TaxpayerRecord> {
        let mut attempt = 0;

        loop {
            let mut session = QuerySession::new(&mut self.driver);
            let outcome = self.flow.run(&mut session, id).await;
            session.finish().await;

            match outcome {
                Ok(record) => {
                    info!("[RUC {}] ✅ 查询完成", id);
                    return Some(record);
                }
                Err(e) if e.is_timeout() => {
                    error!("[RUC {}] ⏱️ 网络超时: {}", id, e);
                    tokio::time::sleep(self.timeout_pause).await;

                    if attempt >= self.timeout_retries {
                        return None;
                    }
                    attempt += 1;
                    warn!(
                        "[RUC {}] 🔄 第 {}/{} 次重试",
                        id, attempt, self.timeout_retries
                    );
                }
                Err(e) => {
                    error!("[RUC {}] ❌ 查询失败: {}", id, e);
                    return None;
                }
            }
        }
    }
}
