use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{QueryError, Result};

/// 扩展信息查询类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedAction {
    /// 强制执行欠款（Deuda Coactiva）
    Debt,
    /// 申报遗漏（Omisión Tributaria）
    Omission,
}

impl ExtendedAction {
    /// 门户使用的 accion 参数
    pub fn code(self) -> &'static str {
        match self {
            ExtendedAction::Debt => "getInfoDC",
            ExtendedAction::Omission => "getInfoOT",
        }
    }

    /// 记录名称（用于日志和错误信息）
    pub fn record_name(self) -> &'static str {
        match self {
            ExtendedAction::Debt => "Deuda Coactiva",
            ExtendedAction::Omission => "Omisión Tributaria",
        }
    }
}

/// 可以从结果表格的一行解析出来的记录
pub trait ExtendedRecord: Sized {
    const ACTION: ExtendedAction;
    const CELL_COUNT: usize;

    /// `cells` 为已去除首尾空白的单元格文本，数量已校验
    fn from_cells(cells: &[String]) -> Result<Self>;

    /// 校验单元格数量后解析
    fn from_row(cells: &[String]) -> Result<Self> {
        if cells.len() != Self::CELL_COUNT {
            return Err(QueryError::record_shape(
                Self::ACTION.record_name(),
                Self::CELL_COUNT,
                cells.len(),
            ));
        }
        Self::from_cells(cells)
    }
}

/// 强制执行欠款
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRecord {
    pub amount: Decimal,
    pub period: String,
    pub date: String,
    pub entity: String,
}

impl ExtendedRecord for DebtRecord {
    const ACTION: ExtendedAction = ExtendedAction::Debt;
    const CELL_COUNT: usize = 4;

    fn from_cells(cells: &[String]) -> Result<Self> {
        // 金额可能带千位分隔符
        let raw_amount = cells[0].replace(',', "");
        let amount = Decimal::from_str(&raw_amount)
            .map_err(|e| QueryError::field_parse("monto", format!("{:?}: {}", cells[0], e)))?;

        Ok(Self {
            amount,
            period: cells[1].clone(),
            date: cells[2].clone(),
            entity: cells[3].clone(),
        })
    }
}

/// 申报遗漏
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OmissionRecord {
    pub period: String,
    pub tax_type: String,
}

impl ExtendedRecord for OmissionRecord {
    const ACTION: ExtendedAction = ExtendedAction::Omission;
    const CELL_COUNT: usize = 2;

    fn from_cells(cells: &[String]) -> Result<Self> {
        Ok(Self {
            period: cells[0].clone(),
            tax_type: cells[1].clone(),
        })
    }
}

/// 扩展信息汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedInfo {
    pub debts: Vec<DebtRecord>,
    pub omissions: Vec<OmissionRecord>,
}
