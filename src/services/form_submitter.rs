//! 查询表单提交服务 - 业务能力层
//!
//! 选择查询方式 → 填写查询值和验证码 → 点击"Buscar"

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::browser::{BrowserDriver, PageElement};
use crate::error::{QueryError, Result};
use crate::workflow::QuerySession;

/// 查询表单所在的 frame
pub const SEARCH_FRAME_XPATH: &str = r#"//frame[@src="frameCriterioBusqueda.jsp"]"#;
/// 查询方式单选按钮组
pub const MODE_RADIO_XPATH: &str = r#"//input[@type="radio" and @name="tQuery"]"#;
pub const CAPTCHA_INPUT_XPATH: &str = r#"//input[@name="codigo"]"#;
pub const SUBMIT_BUTTON_XPATH: &str = r#"//input[@value="Buscar"]"#;

/// 查询方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Ruc,
    Dni,
    Name,
}

/// 查询方式对应的表单控件
#[derive(Debug)]
pub struct FormBinding {
    /// 查询值输入框
    pub input_xpath: &'static str,
    /// 在单选按钮组中的位置
    pub radio_index: usize,
}

const RUC_BINDING: FormBinding = FormBinding {
    input_xpath: r#"//input[@name="search1"]"#,
    radio_index: 0,
};
const DNI_BINDING: FormBinding = FormBinding {
    input_xpath: r#"//input[@name="search2"]"#,
    radio_index: 1,
};
const NAME_BINDING: FormBinding = FormBinding {
    input_xpath: r#"//input[@name="search3"]"#,
    radio_index: 2,
};

impl QueryMode {
    pub fn binding(self) -> &'static FormBinding {
        match self {
            QueryMode::Ruc => &RUC_BINDING,
            QueryMode::Dni => &DNI_BINDING,
            QueryMode::Name => &NAME_BINDING,
        }
    }
}

impl FromStr for QueryMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ruc" => Ok(QueryMode::Ruc),
            "dni" => Ok(QueryMode::Dni),
            "name" => Ok(QueryMode::Name),
            other => Err(QueryError::InvalidQueryMode(other.to_string())),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryMode::Ruc => "ruc",
            QueryMode::Dni => "dni",
            QueryMode::Name => "name",
        };
        f.write_str(name)
    }
}

/// 在顶层文档中查找查询表单 frame
pub async fn find_search_frame<D: BrowserDriver>(
    session: &mut QuerySession<'_, D>,
) -> Result<D::Element> {
    Ok(session.driver().find_element(SEARCH_FRAME_XPATH).await?)
}

/// 表单提交服务
#[derive(Debug, Default)]
pub struct FormSubmitter;

impl FormSubmitter {
    pub fn new() -> Self {
        Self
    }

    /// 提交查询表单
    ///
    /// 先定位全部控件，任何一个缺失都不会产生点击或输入；
    /// 完成后回到顶层文档。
    pub async fn submit<D: BrowserDriver>(
        &self,
        session: &mut QuerySession<'_, D>,
        mode: QueryMode,
        value: &str,
        captcha: &str,
    ) -> Result<()> {
        let search_frame = find_search_frame(session).await?;
        session.enter_frame(&search_frame).await?;

        let binding = mode.binding();
        let driver = session.driver();
        let mut radios = driver.find_elements(MODE_RADIO_XPATH).await?;
        let value_input = driver.find_element(binding.input_xpath).await?;
        let captcha_input = driver.find_element(CAPTCHA_INPUT_XPATH).await?;
        let submit_btn = driver.find_element(SUBMIT_BUTTON_XPATH).await?;

        if binding.radio_index >= radios.len() {
            return Err(QueryError::ElementNotFound(format!(
                "查询方式 {} 的单选按钮不存在 (共 {} 个)",
                mode,
                radios.len()
            )));
        }
        let mode_radio = radios.swap_remove(binding.radio_index);
        debug!("查询方式: {} | 查询值: {}", mode, value);

        mode_radio.click().await?;
        value_input.send_keys(value).await?;
        captcha_input.send_keys(captcha).await?;
        submit_btn.click().await?;
        info!("📤 查询表单已提交");

        session.leave_frame().await?;
        Ok(())
    }
}
