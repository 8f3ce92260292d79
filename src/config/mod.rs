// ==========================================
// SPC 汇总引擎 - 配置层
// ==========================================
// 职责: 能力状态阈值、班次对比窗口等可覆写配置
// 存储: config_kv 表
// ==========================================

pub mod aggregation_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use aggregation_config_trait::{
    AggregationConfigReader, DefaultAggregationConfig, DEFAULT_COMPARE_DAYS,
};
pub use config_manager::{config_keys, ConfigManager};
