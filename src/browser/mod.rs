pub mod connection;
pub mod driver;
pub mod headless;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

pub use connection::connect_to_browser;
pub use driver::{
    decode_error_payload, no_such_element, BrowserDriver, DriverError, DriverResult, ElementBox,
    PageElement, Point, Size,
};
pub use headless::launch_headless_browser;

/// 按配置获取浏览器：无头模式启动新浏览器，否则连接调试端口
pub async fn acquire_browser(config: &Config) -> Result<(Browser, Page)> {
    if config.headless {
        launch_headless_browser(
            config.chrome_executable.as_deref(),
            config.page_load_timeout(),
        )
        .await
    } else {
        connect_to_browser(config.browser_debug_port).await
    }
}
