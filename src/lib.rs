// ==========================================
// SPC 汇总引擎 - 核心库
// ==========================================
// 职责: 把子组分析记录按班次/日/周/月汇总为过程能力统计
// 技术栈: Rust + SQLite + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 周期解析、统计、汇总编排
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 查询与导出
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{OverallStatus, PeriodType, PlanStatus, ShiftType};

// 领域实体
pub use domain::{AnalysisRecord, SamplingPlan, Scaled, SummaryKey, SummaryStat};

// 引擎
pub use engine::{
    PeriodWindow, ShiftComparator, ShiftComparison, SpcAggregationEngine, SpcRepositories,
    StatusThresholds,
};

// 配置
pub use config::{AggregationConfigReader, ConfigManager, DefaultAggregationConfig};

// API
pub use api::{ApiError, ApiResult, SpcSummaryApi};

// 仓储错误
pub use repository::{RepositoryError, RepositoryResult};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "SPC 汇总引擎";
