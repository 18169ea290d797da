//! 基于 chromiumoxide 的浏览器驱动
//!
//! 门户页面是老式的 `<frameset>`，CDP 没有"切换 frame"的概念，
//! 这里把当前 frame 记录为一条 (xpath, index) 路径，每次执行 JS 时
//! 沿路径通过 `contentDocument` 找到目标文档。元素句柄同理，
//! 保存所在 frame 路径 + 自身 xpath + 序号。

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::browser::{
    no_such_element, BrowserDriver, DriverError, DriverResult, PageElement, Point, Size,
};
use crate::infrastructure::js_executor::{cdp_error, JsExecutor};

/// frame 路径中的一段
#[derive(Debug, Clone, Serialize)]
struct FrameRef {
    xpath: String,
    index: usize,
}

/// JS 端统一返回结构
#[derive(Debug, Deserialize)]
struct JsReply<T> {
    ok: bool,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    error: Option<String>,
    value: Option<T>,
}

/// 生成"定位文档 + 定位元素"的 JS 前缀，执行后可用变量 `doc`、`snap`
fn locate_script(frames: &[FrameRef], xpath: &str) -> DriverResult<String> {
    let frames_json = serde_json::to_string(frames).map_err(|e| DriverError::Script(e.to_string()))?;
    let xpath_json = serde_json::to_string(xpath).map_err(|e| DriverError::Script(e.to_string()))?;
    Ok(format!(
        r#"
        let doc = document;
        for (const f of {frames}) {{
            const fs = doc.evaluate(f.xpath, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            const frame = fs.snapshotItem(f.index);
            if (!frame || !frame.contentDocument) {{
                return {{ ok: false, missing: true, error: "无法进入 frame: " + f.xpath }};
            }}
            doc = frame.contentDocument;
        }}
        const snap = doc.evaluate({xpath}, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        "#,
        frames = frames_json,
        xpath = xpath_json,
    ))
}

/// 在目标元素上执行 `body`（可使用变量 `el`）
async fn run_on_element<T: DeserializeOwned>(
    executor: &JsExecutor,
    frames: &[FrameRef],
    xpath: &str,
    index: usize,
    body: &str,
) -> DriverResult<T> {
    let script = format!(
        r#"
        (() => {{
            {locate}
            const el = snap.snapshotItem({index});
            if (!el) {{
                return {{ ok: false, missing: true, error: "元素已失效: " + {xpath} }};
            }}
            {body}
        }})()
        "#,
        locate = locate_script(frames, xpath)?,
        index = index,
        xpath = serde_json::to_string(xpath).map_err(|e| DriverError::Script(e.to_string()))?,
        body = body,
    );
    let reply: JsReply<T> = executor.eval_as(script).await?;
    unwrap_reply(reply, xpath)
}

fn unwrap_reply<T>(reply: JsReply<T>, xpath: &str) -> DriverResult<T> {
    let message = reply.error.unwrap_or_else(|| "未知错误".to_string());
    if !reply.ok {
        return Err(if reply.missing {
            no_such_element(xpath, message)
        } else {
            DriverError::Script(message)
        });
    }
    reply
        .value
        .ok_or_else(|| DriverError::Script(format!("脚本没有返回值: {}", xpath)))
}

/// chromiumoxide 页面元素句柄
#[derive(Clone)]
pub struct CdpElement {
    executor: JsExecutor,
    frames: Vec<FrameRef>,
    xpath: String,
    index: usize,
}

impl PageElement for CdpElement {
    async fn location(&self) -> DriverResult<Point> {
        run_on_element(
            &self.executor,
            &self.frames,
            &self.xpath,
            self.index,
            "const r = el.getBoundingClientRect(); return { ok: true, value: { x: r.left, y: r.top } };",
        )
        .await
    }

    async fn size(&self) -> DriverResult<Size> {
        run_on_element(
            &self.executor,
            &self.frames,
            &self.xpath,
            self.index,
            "const r = el.getBoundingClientRect(); return { ok: true, value: { width: r.width, height: r.height } };",
        )
        .await
    }

    async fn click(&self) -> DriverResult<()> {
        let _: bool = run_on_element(
            &self.executor,
            &self.frames,
            &self.xpath,
            self.index,
            "el.click(); return { ok: true, value: true };",
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        let text_json = serde_json::to_string(text).map_err(|e| DriverError::Script(e.to_string()))?;
        let body = format!(
            r#"
            el.focus();
            el.value = (el.value || "") + {text};
            el.dispatchEvent(new Event("input", {{ bubbles: true }}));
            el.dispatchEvent(new Event("change", {{ bubbles: true }}));
            return {{ ok: true, value: true }};
            "#,
            text = text_json
        );
        let _: bool =
            run_on_element(&self.executor, &self.frames, &self.xpath, self.index, &body).await?;
        Ok(())
    }
}

/// chromiumoxide 浏览器驱动
pub struct CdpDriver {
    executor: JsExecutor,
    frames: Vec<FrameRef>,
    page_load_timeout: Duration,
    implicit_wait: Duration,
}

impl CdpDriver {
    pub fn new(executor: JsExecutor, page_load_timeout: Duration) -> Self {
        Self {
            executor,
            frames: Vec::new(),
            page_load_timeout,
            implicit_wait: Duration::from_secs(5),
        }
    }

    async fn count_matches(&self, xpath: &str) -> DriverResult<usize> {
        let script = format!(
            r#"
            (() => {{
                {locate}
                return {{ ok: true, value: snap.snapshotLength }};
            }})()
            "#,
            locate = locate_script(&self.frames, xpath)?
        );
        let reply: JsReply<usize> = self.executor.eval_as(script).await?;
        unwrap_reply(reply, xpath)
    }

    /// 在隐式等待时间内轮询，直到至少匹配一个元素
    async fn wait_for_matches(&self, xpath: &str) -> DriverResult<usize> {
        let deadline = Instant::now() + self.implicit_wait;
        loop {
            let count = match self.count_matches(xpath).await {
                Ok(count) => count,
                // frame 尚未加载完成时也继续等待
                Err(DriverError::NoSuchElement { .. }) => 0,
                Err(e) => return Err(e),
            };
            if count > 0 || Instant::now() >= deadline {
                return Ok(count);
            }
            sleep(Duration::from_millis(250)).await;
        }
    }

    fn element(&self, xpath: &str, index: usize) -> CdpElement {
        CdpElement {
            executor: self.executor.clone(),
            frames: self.frames.clone(),
            xpath: xpath.to_string(),
            index,
        }
    }
}

impl BrowserDriver for CdpDriver {
    type Element = CdpElement;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);
        match timeout(self.page_load_timeout, self.executor.page().goto(url)).await {
            Err(_) => Err(DriverError::Timeout(format!(
                "{} 未在 {} 秒内加载完成",
                url,
                self.page_load_timeout.as_secs()
            ))),
            Ok(result) => {
                result.map_err(cdp_error)?;
                self.frames.clear();
                Ok(())
            }
        }
    }

    async fn find_element(&mut self, xpath: &str) -> DriverResult<CdpElement> {
        let count = self.wait_for_matches(xpath).await?;
        if count == 0 {
            return Err(no_such_element(
                xpath,
                format!("Unable to find element with xpath '{}'", xpath),
            ));
        }
        Ok(self.element(xpath, 0))
    }

    async fn find_elements(&mut self, xpath: &str) -> DriverResult<Vec<CdpElement>> {
        let count = self.wait_for_matches(xpath).await?;
        Ok((0..count).map(|i| self.element(xpath, i)).collect())
    }

    async fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        self.executor.screenshot().await
    }

    async fn switch_to_frame(&mut self, frame: &CdpElement) -> DriverResult<()> {
        // 等待 frame 文档加载完成再切换
        let deadline = Instant::now() + self.page_load_timeout;
        loop {
            let ready: bool = run_on_element(
                &frame.executor,
                &frame.frames,
                &frame.xpath,
                frame.index,
                r#"return { ok: true, value: !!(el.contentDocument && el.contentDocument.readyState === "complete") };"#,
            )
            .await?;
            if ready {
                break;
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(format!("frame 加载超时: {}", frame.xpath)));
            }
            sleep(Duration::from_millis(250)).await;
        }

        let mut frames = frame.frames.clone();
        frames.push(FrameRef {
            xpath: frame.xpath.clone(),
            index: frame.index,
        });
        self.frames = frames;
        Ok(())
    }

    async fn switch_to_top(&mut self) -> DriverResult<()> {
        self.frames.clear();
        Ok(())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        let script = format!(
            r#"
            (() => {{
                {locate}
                return {{ ok: true, value: doc.documentElement.outerHTML }};
            }})()
            "#,
            locate = locate_script(&self.frames, "/html")?
        );
        let reply: JsReply<String> = self.executor.eval_as(script).await?;
        unwrap_reply(reply, "/html")
    }
}
