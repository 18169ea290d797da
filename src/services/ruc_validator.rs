//! RUC 校验 - 业务能力层
//!
//! 纯函数，不依赖浏览器和网络

use crate::error::{QueryError, Result};

/// RUC 长度
pub const RUC_LEN: usize = 11;
/// 允许的前两位
pub const ALLOWED_PREFIXES: [&str; 4] = ["10", "15", "17", "20"];
/// 前 10 位数字的固定乘数
const MULTIPLIERS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// 根据前 10 位数字计算校验位
pub fn check_digit(digits: &[u32; 10]) -> u32 {
    let weighted_sum: u32 = digits.iter().zip(MULTIPLIERS).map(|(d, m)| d * m).sum();
    let quotient = weighted_sum / RUC_LEN as u32;
    (RUC_LEN as u32 - (weighted_sum - quotient * RUC_LEN as u32)) % 10
}

/// 校验 RUC
///
/// 不是 11 位纯数字时返回 `MalformedId`；前缀不合法或校验位不符时返回 `Ok(false)`。
pub fn is_valid(ruc: &str) -> Result<bool> {
    let digits: Vec<u32> = ruc
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| QueryError::MalformedId(format!("包含非数字字符: {:?}", ruc)))?;

    if digits.len() != RUC_LEN {
        return Err(QueryError::MalformedId(format!(
            "长度必须为 {} 位，实际 {} 位: {:?}",
            RUC_LEN,
            digits.len(),
            ruc
        )));
    }

    if !ALLOWED_PREFIXES.contains(&&ruc[..2]) {
        return Ok(false);
    }

    let mut first_ten = [0u32; 10];
    first_ten.copy_from_slice(&digits[..10]);

    Ok(check_digit(&first_ten) == digits[10])
}
