// ==========================================
// SPC 汇总引擎 - 汇总统计领域模型
// ==========================================
// 唯一键: (plan_id, period_type, period_start)
// 红线: 同一键只允许一行，重复汇总就地更新
// ==========================================

use crate::domain::scaled::{Scaled, CAPABILITY_SCALE};
use crate::domain::types::{OverallStatus, PeriodType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Western Electric 判异规则数量
pub const RUN_RULE_COUNT: usize = 8;

// ==========================================
// SummaryKey - 汇总唯一键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    pub plan_id: i64,
    pub period_type: PeriodType,
    pub period_start: NaiveDateTime,
}

// ==========================================
// SummaryStat - 周期汇总统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStat {
    // ===== 唯一键 =====
    pub plan_id: i64,
    pub period_type: PeriodType,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,

    // ===== 冗余维度 =====
    pub production_line_id: i64,
    pub mapping_id: Option<i64>,

    // ===== 数量 =====
    pub sample_count: i64,   // 各子组样本数之和
    pub subgroup_count: i64, // 参与汇总的分析记录数

    // ===== 子组均值的描述统计 (×10000) =====
    pub mean: Option<Scaled>,
    pub std_dev: Option<Scaled>,
    pub min: Option<Scaled>,
    pub max: Option<Scaled>,
    pub range: Option<Scaled>,

    // ===== 能力指数 (×1000, 不加权平均) =====
    pub cp: Option<Scaled>,
    pub cpk: Option<Scaled>,

    // ===== 违规计数 =====
    pub out_of_spec_count: i64,
    pub out_of_control_count: i64,
    pub rule_violations: [i64; RUN_RULE_COUNT], // 判异规则 1..8，目前恒为 0

    pub overall_status: OverallStatus,
}

impl SummaryStat {
    pub fn key(&self) -> SummaryKey {
        SummaryKey {
            plan_id: self.plan_id,
            period_type: self.period_type,
            period_start: self.period_start,
        }
    }

    /// 还原后的 Cpk
    pub fn cpk_unscaled(&self) -> Option<f64> {
        self.cpk.map(|v| v.unscale(CAPABILITY_SCALE))
    }

    /// 还原后的 Cp
    pub fn cp_unscaled(&self) -> Option<f64> {
        self.cp.map(|v| v.unscale(CAPABILITY_SCALE))
    }
}
