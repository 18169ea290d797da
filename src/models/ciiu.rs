//! CIIU 经济活动分类代码
//!
//! 文本格式（不区分大小写，分隔符两侧空白忽略）：
//!
//! ```text
//! [标签 -] 代码 - 描述 [[-] [CIIU] REV[.] 版本]
//! Principal    - 74996 - OTRAS ACTIVIDADES EMPRESARIALES NCP - CIIU Rev.3
//! 93098 - OTRAS ACTIVIDADES DE TIPO SERVICIO NCP
//! ```
//!
//! 没有版本标记时按第 3 版处理（注释中的历史数据）。

use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

use crate::error::{QueryError, Result};

/// 注释块中未标注版本时使用的版本号
pub const HISTORICAL_REVISION: u8 = 3;
/// 下拉框来源的代码统一使用的版本号
pub const CURRENT_REVISION: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationCode {
    /// 代码（保留前导零）
    pub code: String,
    pub description: String,
    pub revision: u8,
}

impl ClassificationCode {
    pub fn new(code: impl Into<String>, description: impl Into<String>, revision: u8) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            revision,
        }
    }

    /// 代码相同即视为同一条目，不比较描述和版本
    pub fn same_entry(&self, other: &ClassificationCode) -> bool {
        self.code == other.code
    }
}

impl FromStr for ClassificationCode {
    type Err = QueryError;

    fn from_str(token: &str) -> Result<Self> {
        let re = Regex::new(
            r"(?i)^\s*(?:[a-záéíóúñ]+(?:\s+\d+)?\s*-\s*)?(\d{4,6})\s*-\s*(.*?)(?:(?:\s*-\s*|\s+)(?:ciiu\s*)?\brev\.?\s*(\d+))?\s*$",
        )?;

        let caps = re
            .captures(token)
            .ok_or_else(|| QueryError::field_parse("CIIU", format!("无法识别的代码格式: {:?}", token)))?;

        let code = caps[1].to_string();
        let description = caps[2].trim().trim_end_matches('-').trim().to_string();
        if description.is_empty() {
            return Err(QueryError::field_parse("CIIU", format!("缺少描述: {:?}", token)));
        }

        let revision = match caps.get(3) {
            Some(rev) => rev
                .as_str()
                .parse()
                .map_err(|_| QueryError::field_parse("CIIU", format!("版本号无效: {:?}", token)))?,
            None => HISTORICAL_REVISION,
        };

        Ok(Self {
            code,
            description,
            revision,
        })
    }
}

/// 合并两个来源的 CIIU 列表
///
/// 结果 = [下拉框中代码不在注释列表里的条目（版本改为当前版本）] + [全部注释条目]。
pub fn reconcile_codes(
    comment_codes: &[ClassificationCode],
    dropdown_codes: &[ClassificationCode],
) -> Vec<ClassificationCode> {
    let mut merged: Vec<ClassificationCode> = dropdown_codes
        .iter()
        .filter(|op| !comment_codes.iter().any(|c| c.same_entry(op)))
        .map(|op| ClassificationCode {
            revision: CURRENT_REVISION,
            ..op.clone()
        })
        .collect();
    merged.extend(comment_codes.iter().cloned());
    merged
}
