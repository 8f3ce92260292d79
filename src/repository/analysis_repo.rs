// ==========================================
// SPC 汇总引擎 - 分析记录 Repository Trait
// ==========================================
// 职责: 定义分析记录的只读访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据读取
// ==========================================

use crate::domain::analysis::AnalysisRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;

// ==========================================
// AnalysisRecordRepository Trait
// ==========================================
// 用途: 按数据源映射与时间范围拉取子组分析记录
// 实现者: AnalysisRecordRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait AnalysisRecordRepository: Send + Sync {
    /// 查询时间范围内的分析记录，按 created_at 升序
    ///
    /// # 参数
    /// - mapping_id: 数据源映射；None 表示不限定数据源
    /// - from: 起始时刻（包含）
    /// - until: 结束时刻（不包含）
    ///
    /// # 返回
    /// - Ok(Vec<AnalysisRecord>): 记录列表，非有限数值已置为 None
    /// - Err: 数据库错误
    async fn find_by_mapping_and_time_range(
        &self,
        mapping_id: Option<i64>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> RepositoryResult<Vec<AnalysisRecord>>;
}
