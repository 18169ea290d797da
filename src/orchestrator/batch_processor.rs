//! 批量 RUC 查询 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志、获取浏览器、组装 `QueryProcessor`
//! 2. **顺序处理**：所有 RUC 共用一个浏览器会话，逐个查询
//! 3. **结果输出**：每条记录以 JSON 打印到标准输出
//! 4. **全局统计**：成功 / 无结果 / RUC 无效

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::clients::{PortalHttpClient, TesseractOcr};
use crate::config::Config;
use crate::infrastructure::{CdpDriver, JsExecutor};
use crate::models::TaxpayerRecord;
use crate::orchestrator::QueryProcessor;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    processor: QueryProcessor<CdpDriver, TesseractOcr, PortalHttpClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init(config.verbose_logging);

        let (browser, page) = browser::acquire_browser(&config)
            .await
            .context("获取浏览器失败")?;

        let driver = CdpDriver::new(JsExecutor::new(page), config.page_load_timeout());
        let processor = QueryProcessor::new(
            driver,
            TesseractOcr::new(&config),
            PortalHttpClient::new(),
            &config,
        );

        Ok(Self {
            config,
            _browser: browser,
            processor,
        })
    }

    /// 依次查询所有 RUC，返回查询成功的记录
    pub async fn run(&mut self, rucs: &[String]) -> Result<Vec<TaxpayerRecord>> {
        if rucs.is_empty() {
            warn!("⚠️ 没有需要查询的 RUC，程序结束");
            return Ok(Vec::new());
        }

        logging::log_startup(rucs.len(), &self.config.portal_url);

        let mut stats = QueryStats::default();
        let mut records = Vec::new();

        for (index, ruc) in rucs.iter().enumerate() {
            info!("\n[{}/{}] 🔍 查询 RUC {}", index + 1, rucs.len(), ruc);

            match self.processor.get_record(ruc).await {
                Ok(Some(record)) => {
                    let json =
                        serde_json::to_string_pretty(&record).context("序列化查询结果失败")?;
                    println!("{}", json);
                    stats.found += 1;
                    records.push(record);
                }
                Ok(None) => stats.not_found += 1,
                Err(e) => {
                    warn!("[RUC {}] ❌ {}", ruc, e);
                    stats.rejected += 1;
                }
            }
        }

        logging::print_final_stats(stats.found, stats.not_found, stats.rejected);
        Ok(records)
    }
}

/// 查询统计
#[derive(Debug, Default)]
struct QueryStats {
    found: usize,
    not_found: usize,
    rejected: usize,
}
