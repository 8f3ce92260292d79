// ==========================================
// SPC 汇总引擎 - 汇总统计 Repository Trait
// ==========================================
// 职责: 定义 spc_summary_stats 的读写接口
// 红线: upsert 必须是按唯一键的原子“插入或更新”，
//       不允许先查后写
// ==========================================

use crate::domain::summary::{SummaryKey, SummaryStat};
use crate::domain::types::PeriodType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;

// ==========================================
// SummaryStatRepository Trait
// ==========================================
// 实现者: SummaryStatRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait SummaryStatRepository: Send + Sync {
    /// 按 (plan_id, period_type, period_start) 原子插入或就地更新
    async fn upsert(&self, summary: &SummaryStat) -> RepositoryResult<()>;

    /// 按唯一键查询
    async fn find_by_key(&self, key: &SummaryKey) -> RepositoryResult<Option<SummaryStat>>;

    /// 查询窗口与 [from, to] 相交的汇总（period_start <= to 且 period_end > from），
    /// 按 period_start 升序
    async fn find_overlapping(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>>;

    /// 查询 period_start 落在闭区间 [from, to] 的汇总，按 period_start 升序
    async fn find_starting_between(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>>;

    /// 查询完全落在 [start, end] 内的汇总，按 period_start 降序
    ///
    /// # 参数
    /// - production_line_id: Some 时仅返回该产线
    async fn find_by_time_range(
        &self,
        period_type: PeriodType,
        start: NaiveDateTime,
        end: NaiveDateTime,
        production_line_id: Option<i64>,
    ) -> RepositoryResult<Vec<SummaryStat>>;

    /// 查询计划在某周期类型下最新的一条汇总
    async fn find_latest(
        &self,
        plan_id: i64,
        period_type: PeriodType,
    ) -> RepositoryResult<Option<SummaryStat>>;
}
