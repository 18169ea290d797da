//! 查询会话
//!
//! 一次查询独占浏览器驱动：当前 frame 和结果页源码都挂在会话上，
//! 查询结束（无论成功与否）时通过 `finish` 回到顶层文档。

use tracing::{debug, warn};

use crate::browser::BrowserDriver;
use crate::error::Result;

pub struct QuerySession<'a, D: BrowserDriver> {
    driver: &'a mut D,
    page_markup: Option<String>,
}

impl<'a, D: BrowserDriver> QuerySession<'a, D> {
    pub fn new(driver: &'a mut D) -> Self {
        Self {
            driver,
            page_markup: None,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        self.driver
    }

    pub async fn enter_frame(&mut self, frame: &D::Element) -> Result<()> {
        self.driver.switch_to_frame(frame).await?;
        Ok(())
    }

    pub async fn leave_frame(&mut self) -> Result<()> {
        self.driver.switch_to_top().await?;
        Ok(())
    }

    /// 保存结果页源码
    pub fn store_markup(&mut self, markup: String) {
        debug!("结果页源码长度: {} 字节", markup.len());
        self.page_markup = Some(markup);
    }

    pub fn markup(&self) -> Option<&str> {
        self.page_markup.as_deref()
    }

    /// 结束会话：回到顶层文档并释放缓存的页面源码
    pub async fn finish(self) {
        if let Err(e) = self.driver.switch_to_top().await {
            warn!("回到顶层文档失败: {}", e);
        }
    }
}
