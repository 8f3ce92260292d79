// ==========================================
// SPC 汇总引擎 - API 层
// ==========================================
// 职责: 提供汇总查询与导出接口，供 CLI 与上层服务调用
// ==========================================

pub mod error;
pub mod export;
pub mod summary_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use export::{export_summaries_csv, SummaryExportRow};
pub use summary_api::SpcSummaryApi;
