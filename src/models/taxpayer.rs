use std::fmt;

use serde::Serialize;

use crate::error::{QueryError, Result};
use crate::models::ciiu::ClassificationCode;
use crate::models::extended::{DebtRecord, ExtendedInfo, OmissionRecord};
use crate::services::ruc_validator;

/// 已通过校验的 RUC（11 位数字）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaxpayerId(String);

impl TaxpayerId {
    /// 解析并校验 RUC
    ///
    /// 格式错误返回 `MalformedId`，校验位不通过返回 `InvalidId`。
    pub fn parse(ruc: &str) -> Result<Self> {
        if ruc_validator::is_valid(ruc)? {
            Ok(Self(ruc.to_string()))
        } else {
            Err(QueryError::InvalidId(ruc.to_string()))
        }
    }

    /// 从整数形式解析（按十进制文本处理，不补零）
    pub fn from_number(ruc: u64) -> Result<Self> {
        Self::parse(&ruc.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxpayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 结果页中的基本信息
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicRecord {
    /// 结果页中解析出的 RUC
    pub id: u64,
    pub legal_name: String,
    pub commercial_name: Option<String>,
    pub status: String,
    pub condition: String,
    pub classification_codes: Vec<ClassificationCode>,
}

/// 完整的纳税人记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxpayerRecord {
    pub id: u64,
    pub legal_name: String,
    pub commercial_name: Option<String>,
    pub status: String,
    pub condition: String,
    pub classification_codes: Vec<ClassificationCode>,
    pub debts: Vec<DebtRecord>,
    pub omissions: Vec<OmissionRecord>,
}

impl TaxpayerRecord {
    /// 合并基本信息和扩展信息
    pub fn merge(basic: BasicRecord, extended: ExtendedInfo) -> Self {
        Self {
            id: basic.id,
            legal_name: basic.legal_name,
            commercial_name: basic.commercial_name,
            status: basic.status,
            condition: basic.condition,
            classification_codes: basic.classification_codes,
            debts: extended.debts,
            omissions: extended.omissions,
        }
    }
}
