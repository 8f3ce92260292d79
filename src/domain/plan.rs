// ==========================================
// SPC 汇总引擎 - 抽样计划领域模型
// ==========================================
// 外部实体: 仅用于解析 mapping_id 与枚举 active 计划
// ==========================================

use crate::domain::types::PlanStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// SamplingPlan - SPC 抽样计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub id: i64,
    pub name: String,
    pub mapping_id: Option<i64>, // None: 不限定数据源
    pub production_line_id: i64,
    pub status: PlanStatus,
}

impl SamplingPlan {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
