// ==========================================
// SPC 汇总引擎 - 违规计数器 (Violation Counter)
// ==========================================
// 计数单位为子组（一条分析记录），不是单个测量值
// ==========================================

use crate::domain::analysis::AnalysisRecord;
use crate::domain::summary::RUN_RULE_COUNT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    /// alert_triggered 的子组数
    pub out_of_spec: i64,
    /// 均值越出自身控制限的子组数
    pub out_of_control: i64,
    /// 判异规则 1..8。上游尚无规则引擎，恒为 0
    pub rule_violations: [i64; RUN_RULE_COUNT],
}

pub fn count_violations(records: &[AnalysisRecord]) -> ViolationCounts {
    records
        .iter()
        .fold(ViolationCounts::default(), |mut counts, record| {
            if record.alert_triggered {
                counts.out_of_spec += 1;
            }
            if record.is_out_of_control() {
                counts.out_of_control += 1;
            }
            counts
        })
}
