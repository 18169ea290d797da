//! 单个 RUC 的查询流程 - 流程层
//!
//! 流程顺序：
//! 1. 打开查询入口 → 识别验证码 → 提交表单
//! 2. 保存结果 frame 的源码 → 解析基本信息
//! 3. HTTP 查询欠款和申报遗漏 → 合并
//!
//! 本层不做错误兜底，错误原样交给编排层。

use tracing::{debug, info};

use crate::browser::BrowserDriver;
use crate::clients::{HttpFetcher, OcrEngine};
use crate::config::Config;
use crate::error::{QueryError, Result};
use crate::models::{TaxpayerId, TaxpayerRecord};
use crate::services::{
    find_search_frame, CaptchaSolver, ExtendedInfoClient, FormSubmitter, QueryMode,
    ResultExtractor,
};
use crate::utils::truncate_text;
use crate::workflow::QuerySession;

/// 查询结果所在的 frame
pub const RESULT_FRAME_XPATH: &str = r#"//frame[@src="frameResultadoBusqueda.html"]"#;

/// 查询流程，只依赖业务能力，不持有浏览器
pub struct QueryFlow<O: OcrEngine, H: HttpFetcher> {
    captcha_solver: CaptchaSolver<O>,
    form_submitter: FormSubmitter,
    result_extractor: ResultExtractor,
    extended_info: ExtendedInfoClient<H>,
    portal_url: String,
    verbose_logging: bool,
}

impl<O: OcrEngine, H: HttpFetcher> QueryFlow<O, H> {
    pub fn new(ocr: O, http: H, config: &Config) -> Self {
        Self {
            captcha_solver: CaptchaSolver::new(ocr),
            form_submitter: FormSubmitter::new(),
            result_extractor: ResultExtractor::new(),
            extended_info: ExtendedInfoClient::new(
                http,
                config.portal_url.clone(),
                config.http_timeout(),
            ),
            portal_url: config.portal_url.clone(),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run<D: BrowserDriver>(
        &self,
        session: &mut QuerySession<'_, D>,
        id: &TaxpayerId,
    ) -> Result<TaxpayerRecord> {
        info!("[RUC {}] 🌐 打开查询页面", id);
        session.driver().navigate(&self.portal_url).await?;

        // ========== 验证码 + 表单 ==========
        let search_frame = find_search_frame(session).await?;
        let captcha = self.captcha_solver.solve(session, &search_frame).await?;
        self.form_submitter
            .submit(session, QueryMode::Ruc, id.as_str(), &captcha)
            .await?;

        // ========== 结果页 ==========
        self.save_result_page(session).await?;
        let markup = session
            .markup()
            .ok_or_else(|| QueryError::ElementNotFound("结果页源码未保存".to_string()))?;
        let basic = self.result_extractor.extract(markup)?;
        info!("[RUC {}] ✓ 基本信息: {}", id, basic.legal_name);

        // ========== 扩展信息 ==========
        let ruc = basic.id.to_string();
        let extended = self
            .extended_info
            .fetch_all(&ruc, &basic.legal_name)
            .await?;

        Ok(TaxpayerRecord::merge(basic, extended))
    }

    /// 进入结果 frame 读取源码并保存到会话中
    async fn save_result_page<D: BrowserDriver>(
        &self,
        session: &mut QuerySession<'_, D>,
    ) -> Result<()> {
        let result_frame = session.driver().find_element(RESULT_FRAME_XPATH).await?;
        session.enter_frame(&result_frame).await?;
        let markup = session.driver().page_source().await?;
        session.leave_frame().await?;

        if self.verbose_logging {
            debug!("结果页: {}", truncate_text(&markup, 200));
        }
        session.store_markup(markup);
        Ok(())
    }
}
