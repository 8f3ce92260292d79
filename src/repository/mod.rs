// ==========================================
// SPC 汇总引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod analysis_repo;
pub mod analysis_repo_impl;
pub mod error;
pub mod sampling_plan_repo;
pub mod sampling_plan_repo_impl;
pub mod summary_repo;
pub mod summary_repo_impl;

// 重导出核心仓储
pub use analysis_repo::AnalysisRecordRepository;
pub use analysis_repo_impl::AnalysisRecordRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use sampling_plan_repo::SamplingPlanRepository;
pub use sampling_plan_repo_impl::SamplingPlanRepositoryImpl;
pub use summary_repo::SummaryStatRepository;
pub use summary_repo_impl::SummaryStatRepositoryImpl;
