// ==========================================
// SPC 汇总引擎 - 引擎层
// ==========================================
// 职责: 周期解析、统计计算、汇总编排、班次对比
// 红线: Engine 不拼 SQL，所有持久化经由 Repository Trait
// ==========================================

pub mod aggregation;
pub mod period;
pub mod repositories;
pub mod shift_compare;
pub mod statistics;
pub mod violation;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心引擎
pub use aggregation::{close_out_period_types, summarize, SpcAggregationEngine};
pub use period::PeriodWindow;
pub use repositories::SpcRepositories;
pub use shift_compare::{ShiftComparator, ShiftComparison, ShiftCpkStats};
pub use statistics::{calculate_statistics, overall_status, DescriptiveStats, StatusThresholds};
pub use violation::{count_violations, ViolationCounts};
