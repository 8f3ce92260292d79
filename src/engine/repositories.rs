// ==========================================
// SPC 汇总引擎 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合汇总引擎所需的所有 Repository
// 目标: 编排器与班次对比器共用一份依赖，便于测试时整体替换为内存实现
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    AnalysisRecordRepository, AnalysisRecordRepositoryImpl, SamplingPlanRepository,
    SamplingPlanRepositoryImpl, SummaryStatRepository, SummaryStatRepositoryImpl,
};

/// 汇总引擎仓储集合
///
/// # 包含的仓储
/// - `analysis_repo`: 分析记录（只读）
/// - `plan_repo`: 抽样计划（只读）
/// - `summary_repo`: 周期汇总（读写）
#[derive(Clone)]
pub struct SpcRepositories {
    /// 分析记录仓储
    pub analysis_repo: Arc<dyn AnalysisRecordRepository>,
    /// 抽样计划仓储
    pub plan_repo: Arc<dyn SamplingPlanRepository>,
    /// 汇总统计仓储
    pub summary_repo: Arc<dyn SummaryStatRepository>,
}

impl SpcRepositories {
    /// 创建新的仓储集合
    pub fn new(
        analysis_repo: Arc<dyn AnalysisRecordRepository>,
        plan_repo: Arc<dyn SamplingPlanRepository>,
        summary_repo: Arc<dyn SummaryStatRepository>,
    ) -> Self {
        Self {
            analysis_repo,
            plan_repo,
            summary_repo,
        }
    }

    /// 基于同一个 SQLite 连接构造全部 rusqlite 实现
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            analysis_repo: Arc::new(AnalysisRecordRepositoryImpl::from_connection(conn.clone())),
            plan_repo: Arc::new(SamplingPlanRepositoryImpl::from_connection(conn.clone())),
            summary_repo: Arc::new(SummaryStatRepositoryImpl::from_connection(conn)),
        }
    }

    /// 获取分析记录仓储
    pub fn analysis_repo(&self) -> &Arc<dyn AnalysisRecordRepository> {
        &self.analysis_repo
    }

    /// 获取抽样计划仓储
    pub fn plan_repo(&self) -> &Arc<dyn SamplingPlanRepository> {
        &self.plan_repo
    }

    /// 获取汇总统计仓储
    pub fn summary_repo(&self) -> &Arc<dyn SummaryStatRepository> {
        &self.summary_repo
    }
}
