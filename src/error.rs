use thiserror::Error;

use crate::browser::DriverError;

/// 查询管线错误类型
///
/// 前两个变体（RUC 格式 / 校验）在获取浏览器会话之前抛出，直接返回给调用方；
/// 其余变体发生在查询过程中，由编排层统一记录并转换为"无结果"。
#[derive(Debug, Error)]
pub enum QueryError {
    /// RUC 不是 11 位纯数字
    #[error("RUC 格式错误: {0}")]
    MalformedId(String),
    /// RUC 校验位不通过或前缀不合法
    #[error("无效的 RUC: {0}")]
    InvalidId(String),
    /// 页面元素未找到（消息已从驱动的结构化错误中解码）
    #[error("页面元素未找到: {0}")]
    ElementNotFound(String),
    /// 验证码识别结果不是 4 个字符
    #[error("验证码识别失败: {0:?}")]
    CaptchaRead(String),
    /// 查询模式不是 ruc / dni / name 之一
    #[error("查询模式必须是 ruc、dni 或 name 之一: {0}")]
    InvalidQueryMode(String),
    /// 网站返回的错误页面
    #[error("网站返回错误: {0}")]
    Portal(String),
    /// 字段解析失败
    #[error("字段解析失败 ({field}): {message}")]
    FieldParse { field: String, message: String },
    /// 表格行的单元格数量不符合记录结构
    #[error("{record} 记录的字段数量错误: 期望 {expected}, 实际 {actual}")]
    RecordShape {
        record: &'static str,
        expected: usize,
        actual: usize,
    },
    /// 页面加载或 HTTP 请求超时
    #[error("网络超时: {0}")]
    NetworkTimeout(String),
    /// 其他浏览器驱动错误
    #[error("浏览器错误: {0}")]
    Browser(String),
    /// OCR 引擎错误
    #[error("OCR 错误: {0}")]
    Ocr(String),
    /// 截图解码 / 编码失败
    #[error("图片处理失败: {0}")]
    Image(#[from] image::ImageError),
    /// HTTP 请求失败（非超时）
    #[error("HTTP 请求失败: {0}")]
    Http(String),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
    /// 正则或选择器编译失败
    #[error("匹配模式无效: {0}")]
    Pattern(String),
}

impl QueryError {
    /// 是否为超时错误（编排层唯一区别对待的错误）
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::NetworkTimeout(_))
    }

    // ========== 便捷构造函数 ==========

    /// 创建字段解析错误
    pub fn field_parse(field: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::FieldParse {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建记录结构错误
    pub fn record_shape(record: &'static str, expected: usize, actual: usize) -> Self {
        QueryError::RecordShape {
            record,
            expected,
            actual,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<DriverError> for QueryError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NoSuchElement { payload } => {
                QueryError::ElementNotFound(crate::browser::decode_error_payload(&payload))
            }
            DriverError::Timeout(msg) => QueryError::NetworkTimeout(msg),
            DriverError::Script(msg) | DriverError::Protocol(msg) => QueryError::Browser(msg),
        }
    }
}

impl From<regex::Error> for QueryError {
    fn from(err: regex::Error) -> Self {
        QueryError::Pattern(err.to_string())
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::NetworkTimeout(err.to_string())
        } else {
            QueryError::Http(err.to_string())
        }
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        QueryError::Config(err.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 查询结果类型
pub type Result<T> = std::result::Result<T, QueryError>;
