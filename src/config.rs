use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{QueryError, Result};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 查询入口（同时也是扩展信息的查询端点）
    pub portal_url: String,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否启动无头浏览器（否则连接调试端口）
    pub headless: bool,
    /// 浏览器可执行文件路径（仅无头模式）
    pub chrome_executable: Option<String>,
    /// 页面加载超时（秒）
    pub page_load_timeout_secs: u64,
    /// 扩展信息 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 超时后的等待时间（秒）
    pub timeout_pause_secs: u64,
    /// 超时后整体重试次数，0 表示不重试
    pub timeout_retries: u32,
    // --- OCR 配置 ---
    pub tesseract_path: String,
    /// tesseract 页面分割模式，7 = 单行文本
    pub tesseract_psm: u8,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: "http://e-consultaruc.sunat.gob.pe/cl-ti-itmrconsruc/jcrS00Alias"
                .to_string(),
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            page_load_timeout_secs: 30,
            http_timeout_secs: 5,
            timeout_pause_secs: 5,
            timeout_retries: 0,
            tesseract_path: "tesseract".to_string(),
            tesseract_psm: 7,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(default.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            page_load_timeout_secs: env_parse("PAGE_LOAD_TIMEOUT_SECS").unwrap_or(default.page_load_timeout_secs),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS").unwrap_or(default.http_timeout_secs),
            timeout_pause_secs: env_parse("TIMEOUT_PAUSE_SECS").unwrap_or(default.timeout_pause_secs),
            timeout_retries: env_parse("TIMEOUT_RETRIES").unwrap_or(default.timeout_retries),
            tesseract_path: std::env::var("TESSERACT_PATH").unwrap_or(default.tesseract_path),
            tesseract_psm: env_parse("TESSERACT_PSM").unwrap_or(default.tesseract_psm),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文本加载，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// `RUC_QUERY_CONFIG` 指定了配置文件时从文件加载，否则读取环境变量
    pub fn load() -> Result<Self> {
        match std::env::var("RUC_QUERY_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path)),
            Err(_) => Ok(Self::from_env()),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn timeout_pause(&self) -> Duration {
        Duration::from_secs(self.timeout_pause_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
