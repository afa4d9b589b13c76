//! 定点金额
//!
//! 所有金额均为 i64 定点整数，1 个业务单位 = 100000 个最小单位

/// 定点金额（最小单位计）
pub type Amount = i64;

/// 每个业务单位对应的最小单位数
pub const MICRO_UNIT: Amount = 100_000;

/// 转换为整业务单位（向零截断）
#[inline]
pub const fn to_units(amount: Amount) -> Amount { amount / MICRO_UNIT }

/// `a * b / c`，中间结果按 i128 计算
///
/// 除数不为正时返回 0，结果超出 i64 时饱和
pub fn mul_div(a: Amount, b: Amount, c: Amount) -> Amount {
    if c <= 0 {
        return 0;
    }
    let v = (a as i128) * (b as i128) / (c as i128);
    v.clamp(i64::MIN as i128, i64::MAX as i128) as Amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_truncates_and_guards_zero() {
        assert_eq!(mul_div(10, 3, 4), 7);
        assert_eq!(mul_div(10, 3, 0), 0);
        assert_eq!(mul_div(i64::MAX, 4, 2), i64::MAX);
    }

    #[test]
    fn to_units_truncates_toward_zero() {
        assert_eq!(to_units(250_000), 2);
        assert_eq!(to_units(99_999), 0);
    }
}
