//! 浏览器能力抽象
//!
//! 查询流程只依赖这里的 trait，不直接依赖 chromiumoxide。
//! 真实实现见 `infrastructure::CdpDriver`，测试使用内存假实现。

#![allow(async_fn_in_trait)]

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// 驱动层错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// 元素不存在，`payload` 为驱动返回的结构化错误（JSON 文本）
    #[error("元素不存在: {payload}")]
    NoSuchElement { payload: String },
    /// 页面加载超时
    #[error("页面加载超时: {0}")]
    Timeout(String),
    /// 脚本执行失败
    #[error("脚本执行失败: {0}")]
    Script(String),
    /// CDP 协议错误
    #[error("协议错误: {0}")]
    Protocol(String),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// 元素左上角坐标（所在 frame 的坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// 元素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// 元素所占的矩形区域
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBox {
    pub location: Point,
    pub size: Size,
}

impl ElementBox {
    pub fn new(location: Point, size: Size) -> Self {
        Self { location, size }
    }

    /// 裁剪矩形 (left, top, right, bottom)，负坐标按 0 处理
    pub fn crop_rect(&self) -> (u32, u32, u32, u32) {
        let left = self.location.x.max(0.0).round() as u32;
        let top = self.location.y.max(0.0).round() as u32;
        let right = (self.location.x + self.size.width).max(0.0).round() as u32;
        let bottom = (self.location.y + self.size.height).max(0.0).round() as u32;
        (left, top, right, bottom)
    }
}

/// 页面元素能力
pub trait PageElement {
    async fn location(&self) -> DriverResult<Point>;
    async fn size(&self) -> DriverResult<Size>;
    async fn click(&self) -> DriverResult<()>;
    async fn send_keys(&self, text: &str) -> DriverResult<()>;
}

/// 浏览器自动化能力
///
/// 当前 frame 是驱动内部的可变状态，所以切换 frame 和查找元素都需要 `&mut self`。
/// 元素定位统一使用 XPath。
pub trait BrowserDriver {
    type Element: PageElement;

    async fn navigate(&mut self, url: &str) -> DriverResult<()>;
    async fn find_element(&mut self, xpath: &str) -> DriverResult<Self::Element>;
    async fn find_elements(&mut self, xpath: &str) -> DriverResult<Vec<Self::Element>>;
    /// 当前视口截图（PNG 字节）
    async fn screenshot(&mut self) -> DriverResult<Vec<u8>>;
    async fn switch_to_frame(&mut self, frame: &Self::Element) -> DriverResult<()>;
    async fn switch_to_top(&mut self) -> DriverResult<()>;
    /// 当前 frame 的完整页面源码
    async fn page_source(&mut self) -> DriverResult<String>;
}

/// 解码驱动的结构化错误信息
///
/// 载荷是 JSON 对象时读取 `errorMessage` 字段，否则原样返回。
pub fn decode_error_payload(payload: &str) -> String {
    serde_json::from_str::<JsonValue>(payload)
        .ok()
        .and_then(|v| {
            v.get("errorMessage")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| payload.to_string())
}

/// 构造"元素不存在"错误
pub fn no_such_element(xpath: &str, message: impl Into<String>) -> DriverError {
    let payload = serde_json::json!({
        "errorMessage": message.into(),
        "locator": xpath,
    });
    DriverError::NoSuchElement {
        payload: payload.to_string(),
    }
}
