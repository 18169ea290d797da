//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"截图"的能力

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::browser::{DriverError, DriverResult};

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() / screenshot() 能力
/// - 不认识 RUC / 表单
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> DriverResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await.map_err(cdp_error)?;
        result.into_value().map_err(json_error)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> DriverResult<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(json_error)
    }

    /// 截取当前视口（PNG）
    pub async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        self.page.screenshot(params).await.map_err(cdp_error)
    }
}

impl Clone for JsExecutor {
    fn clone(&self) -> Self {
        // Page 内部使用 Arc，可以安全 clone
        Self::new(self.page.clone())
    }
}

/// CDP 错误转换为驱动错误
pub(crate) fn cdp_error(err: CdpError) -> DriverError {
    match err {
        CdpError::Timeout => DriverError::Timeout("CDP 请求超时".to_string()),
        CdpError::JavascriptException(e) => DriverError::Script(format!("{:?}", e)),
        other => DriverError::Protocol(other.to_string()),
    }
}

/// 脚本返回值无法解码
fn json_error(err: serde_json::Error) -> DriverError {
    DriverError::Script(format!("无法解析脚本返回值: {}", err))
}
