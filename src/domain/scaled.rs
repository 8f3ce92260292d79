// ==========================================
// SPC 汇总引擎 - 定点缩放数值
// ==========================================
// 存储约定: 测量值 (mean/stdDev/min/max/range/ucl/lcl) ×10000
//           能力指数 (cp/cpk) ×1000
// 红线: 汇总结果与输入保持同一缩放表示，仅在判定状态时还原
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 测量值缩放倍数
pub const MEASURE_SCALE: i64 = 10_000;

/// 能力指数缩放倍数
pub const CAPABILITY_SCALE: i64 = 1_000;

/// 定点整数（原始缩放值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scaled(i64);

impl Scaled {
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> i64 {
        self.0
    }

    /// 将计算结果（已处于缩放域）四舍五入为定点值
    ///
    /// 非有限值或超出 i64 范围时返回 None，保证存储中不会出现 NaN。
    pub fn round_from(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let rounded = value.round();
        if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
            return None;
        }
        Some(Self(rounded as i64))
    }

    /// 缩放域中的浮点值
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// 还原为真实值
    pub fn unscale(&self, scale: i64) -> f64 {
        self.0 as f64 / scale as f64
    }
}

impl fmt::Display for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 存储边界读取: 把任意数值列转换为缩放值（丢弃非有限值）
pub fn scaled_from_storage(value: Option<f64>) -> Option<Scaled> {
    value.and_then(Scaled::round_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Scaled::round_from(1166.666).unwrap().raw(), 1167);
        assert_eq!(Scaled::round_from(2.5).unwrap().raw(), 3);
        assert_eq!(Scaled::round_from(-2.5).unwrap().raw(), -3);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        assert!(Scaled::round_from(f64::NAN).is_none());
        assert!(Scaled::round_from(f64::INFINITY).is_none());
        assert!(Scaled::round_from(1e300).is_none());
        assert!(scaled_from_storage(None).is_none());
    }

    #[test]
    fn test_unscale() {
        let cpk = Scaled::from_raw(1330);
        assert!((cpk.unscale(CAPABILITY_SCALE) - 1.33).abs() < 1e-12);
        let mean = Scaled::from_raw(252_500);
        assert!((mean.unscale(MEASURE_SCALE) - 25.25).abs() < 1e-12);
    }
}
