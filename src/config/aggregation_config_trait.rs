// ==========================================
// SPC 汇总引擎 - 汇总配置读取 Trait
// ==========================================
// 职责: 定义汇总引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::statistics::StatusThresholds;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 班次对比默认回看天数
pub const DEFAULT_COMPARE_DAYS: i64 = 7;

// ==========================================
// AggregationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
//         DefaultAggregationConfig（内置默认值）
#[async_trait]
pub trait AggregationConfigReader: Send + Sync {
    /// 获取能力状态阈值
    ///
    /// # 默认值
    /// - excellent >= 1.67, good >= 1.33, acceptable >= 1.00, needs_improvement >= 0.67
    async fn get_status_thresholds(&self) -> RepositoryResult<StatusThresholds>;

    /// 获取班次对比默认回看天数
    ///
    /// # 默认值
    /// - 7
    async fn get_compare_default_days(&self) -> RepositoryResult<i64>;
}

// ==========================================
// DefaultAggregationConfig - 内置默认配置
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAggregationConfig;

#[async_trait]
impl AggregationConfigReader for DefaultAggregationConfig {
    async fn get_status_thresholds(&self) -> RepositoryResult<StatusThresholds> {
        Ok(StatusThresholds::default())
    }

    async fn get_compare_default_days(&self) -> RepositoryResult<i64> {
        Ok(DEFAULT_COMPARE_DAYS)
    }
}
