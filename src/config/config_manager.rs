// ==========================================
// SPC 汇总引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::aggregation_config_trait::{AggregationConfigReader, DEFAULT_COMPARE_DAYS};
use crate::db::open_sqlite_connection;
use crate::engine::statistics::StatusThresholds;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RepositoryError::ConfigError {
                key: key.to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取 global scope 全部配置（按键排序）
    pub fn list_global_config(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取并解析配置值，缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Debug,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = ?default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// AggregationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AggregationConfigReader for ConfigManager {
    async fn get_status_thresholds(&self) -> RepositoryResult<StatusThresholds> {
        let defaults = StatusThresholds::default();
        let thresholds = StatusThresholds {
            excellent_min: self
                .get_parsed_or_default(config_keys::STATUS_EXCELLENT_MIN, defaults.excellent_min)?,
            good_min: self.get_parsed_or_default(config_keys::STATUS_GOOD_MIN, defaults.good_min)?,
            acceptable_min: self
                .get_parsed_or_default(config_keys::STATUS_ACCEPTABLE_MIN, defaults.acceptable_min)?,
            needs_improvement_min: self.get_parsed_or_default(
                config_keys::STATUS_NEEDS_IMPROVEMENT_MIN,
                defaults.needs_improvement_min,
            )?,
        };

        // 阈值不成序时整体回退，避免出现无法命中的档位
        if let Err(msg) = thresholds.validate() {
            tracing::warn!(error = %msg, "能力状态阈值配置无效，使用默认阈值");
            return Ok(defaults);
        }
        Ok(thresholds)
    }

    async fn get_compare_default_days(&self) -> RepositoryResult<i64> {
        let days = self.get_parsed_or_default(config_keys::COMPARE_DEFAULT_DAYS, DEFAULT_COMPARE_DAYS)?;
        if days <= 0 {
            tracing::warn!(
                config_key = config_keys::COMPARE_DEFAULT_DAYS,
                days,
                "班次对比天数必须为正数，使用默认值"
            );
            return Ok(DEFAULT_COMPARE_DAYS);
        }
        Ok(days)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 能力状态阈值（未缩放 Cpk）
    pub const STATUS_EXCELLENT_MIN: &str = "spc.status.excellent_min";
    pub const STATUS_GOOD_MIN: &str = "spc.status.good_min";
    pub const STATUS_ACCEPTABLE_MIN: &str = "spc.status.acceptable_min";
    pub const STATUS_NEEDS_IMPROVEMENT_MIN: &str = "spc.status.needs_improvement_min";

    // 班次对比
    pub const COMPARE_DEFAULT_DAYS: &str = "spc.compare.default_days";
}
