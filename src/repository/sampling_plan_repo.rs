// ==========================================
// SPC 汇总引擎 - 抽样计划 Repository Trait
// ==========================================
// 职责: 定义抽样计划的只读访问接口
// ==========================================

use crate::domain::plan::SamplingPlan;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SamplingPlanRepository Trait
// ==========================================
// 实现者: SamplingPlanRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait SamplingPlanRepository: Send + Sync {
    /// 按 ID 查询计划
    ///
    /// # 返回
    /// - Ok(Some(SamplingPlan)): 找到计划
    /// - Ok(None): 计划不存在（可能已在调度与执行之间被删除）
    /// - Err: 数据库错误
    async fn find_by_id(&self, plan_id: i64) -> RepositoryResult<Option<SamplingPlan>>;

    /// 查询全部 active 计划，按 ID 升序
    async fn list_active(&self) -> RepositoryResult<Vec<SamplingPlan>>;
}
