// ==========================================
// SPC 汇总引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::SpcSummaryApi;
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{SpcAggregationEngine, SpcRepositories};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SPC_AGGREGATOR_DB_PATH";

/// 应用状态
///
/// 所有组件共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 汇总编排器
    pub engine: Arc<SpcAggregationEngine<ConfigManager>>,

    /// 汇总查询API
    pub summary_api: Arc<SpcSummaryApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建编排器与API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层与配置
        // ==========================================
        let repos = SpcRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );

        // ==========================================
        // 初始化Engine与API层
        // ==========================================
        let summary_api = Arc::new(SpcSummaryApi::new(
            repos.summary_repo().clone(),
            config_manager.clone(),
        ));
        let engine = Arc::new(SpcAggregationEngine::new(repos, config_manager.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            conn,
            config_manager,
            engine,
            summary_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 SPC_AGGREGATOR_DB_PATH，其次使用用户数据目录，
/// 都不可用时回退到当前目录。
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./spc_aggregator.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("spc-aggregator");
        // 目录创建失败时沿用当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("spc_aggregator.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        if std::env::var(DB_PATH_ENV).is_err() {
            assert!(path.ends_with(".db"));
        }
    }

    #[tokio::test]
    async fn test_app_state_wires_components() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state
            .summary_api
            .get_latest_summary(1, crate::domain::types::PeriodType::Day)
            .await
            .unwrap()
            .is_none());
        // 无 active 计划
        assert_eq!(
            state
                .engine
                .aggregate_all_active_plans(crate::domain::types::PeriodType::Day)
                .await
                .unwrap(),
            0
        );
    }
}
