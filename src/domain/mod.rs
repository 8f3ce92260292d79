// ==========================================
// SPC 汇总引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、定点数值
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod analysis;
pub mod plan;
pub mod scaled;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use analysis::AnalysisRecord;
pub use plan::SamplingPlan;
pub use scaled::{Scaled, CAPABILITY_SCALE, MEASURE_SCALE};
pub use summary::{SummaryKey, SummaryStat, RUN_RULE_COUNT};
pub use types::{OverallStatus, PeriodType, PlanStatus, ShiftType};
