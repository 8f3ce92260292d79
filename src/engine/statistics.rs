// ==========================================
// SPC 汇总引擎 - 统计引擎 (Statistics Engine)
// ==========================================
// 职责: 描述统计 (均值/样本标准差/极值/极差) 与能力状态判定
// 红线: 非有限值在计算前剔除，结果不允许出现 NaN
// ==========================================

use crate::domain::types::OverallStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// DescriptiveStats - 描述统计结果
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
}

/// 计算描述统计
///
/// - 空序列: 全部为 None
/// - 方差分母为 (n-1)，n = 1 时按 1 处理，因此单值标准差为 0
pub fn calculate_statistics(values: &[f64]) -> DescriptiveStats {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return DescriptiveStats::default();
    }

    let n = finite.len();
    let mean = finite.iter().sum::<f64>() / n as f64;
    let denominator = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / denominator;

    let mut min = finite[0];
    let mut max = finite[0];
    for &v in &finite[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    DescriptiveStats {
        mean: Some(mean),
        std_dev: Some(variance.sqrt()),
        min: Some(min),
        max: Some(max),
        range: Some(max - min),
    }
}

/// 算术平均（不加权），空序列返回 None
pub fn mean_of(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

// ==========================================
// StatusThresholds - 能力状态阈值
// ==========================================
// 各档下限包含在本档内，自上而下判定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub excellent_min: f64,
    pub good_min: f64,
    pub acceptable_min: f64,
    pub needs_improvement_min: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            excellent_min: 1.67,
            good_min: 1.33,
            acceptable_min: 1.0,
            needs_improvement_min: 0.67,
        }
    }
}

impl StatusThresholds {
    /// 按未缩放的 Cpk 判定能力状态
    pub fn classify(&self, cpk: Option<f64>) -> OverallStatus {
        let cpk = match cpk {
            Some(v) if v.is_finite() => v,
            _ => return OverallStatus::NeedsImprovement,
        };

        if cpk >= self.excellent_min {
            OverallStatus::Excellent
        } else if cpk >= self.good_min {
            OverallStatus::Good
        } else if cpk >= self.acceptable_min {
            OverallStatus::Acceptable
        } else if cpk >= self.needs_improvement_min {
            OverallStatus::NeedsImprovement
        } else {
            OverallStatus::Critical
        }
    }

    /// 阈值必须严格递减
    pub fn validate(&self) -> Result<(), String> {
        let ordered = [
            self.excellent_min,
            self.good_min,
            self.acceptable_min,
            self.needs_improvement_min,
        ];
        if ordered.iter().any(|v| !v.is_finite()) {
            return Err("能力状态阈值必须为有限数".to_string());
        }
        if ordered.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(format!("能力状态阈值必须严格递减: {:?}", ordered));
        }
        Ok(())
    }
}

/// 按默认阈值判定能力状态
pub fn overall_status(cpk: Option<f64>) -> OverallStatus {
    StatusThresholds::default().classify(cpk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_all_none() {
        let stats = calculate_statistics(&[]);
        assert_eq!(stats, DescriptiveStats::default());
        assert!(stats.mean.is_none() && stats.std_dev.is_none() && stats.range.is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = calculate_statistics(&[100.0]);
        assert_eq!(stats.mean, Some(100.0));
        assert_eq!(stats.min, Some(100.0));
        assert_eq!(stats.max, Some(100.0));
        assert_eq!(stats.range, Some(0.0));
        assert_eq!(stats.std_dev, Some(0.0));
    }

    #[test]
    fn test_five_values() {
        let stats = calculate_statistics(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(stats.mean, Some(30.0));
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(50.0));
        assert_eq!(stats.range, Some(40.0));
        assert!((stats.std_dev.unwrap() - 15.811388).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let stats = calculate_statistics(&[f64::NAN, 10.0, f64::INFINITY, 20.0]);
        assert_eq!(stats.mean, Some(15.0));
        assert_eq!(stats.range, Some(10.0));

        let only_bad = calculate_statistics(&[f64::NAN]);
        assert!(only_bad.mean.is_none());
    }

    #[test]
    fn test_mean_of() {
        assert_eq!(mean_of(&[]), None);
        let avg = mean_of(&[1200.0, 1400.0, 900.0]).unwrap();
        assert!((avg - 1166.6667).abs() < 1e-3);
    }

    #[test]
    fn test_overall_status_bands() {
        assert_eq!(overall_status(Some(1.67)), OverallStatus::Excellent);
        assert_eq!(overall_status(Some(2.5)), OverallStatus::Excellent);
        assert_eq!(overall_status(Some(1.33)), OverallStatus::Good);
        assert_eq!(overall_status(Some(1.66)), OverallStatus::Good);
        assert_eq!(overall_status(Some(1.0)), OverallStatus::Acceptable);
        assert_eq!(overall_status(Some(0.67)), OverallStatus::NeedsImprovement);
        assert_eq!(overall_status(Some(0.5)), OverallStatus::Critical);
        assert_eq!(overall_status(Some(-0.2)), OverallStatus::Critical);
        assert_eq!(overall_status(None), OverallStatus::NeedsImprovement);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(StatusThresholds::default().validate().is_ok());
        let bad = StatusThresholds {
            good_min: 2.0,
            ..StatusThresholds::default()
        };
        assert!(bad.validate().is_err());
    }
}
