// ==========================================
// SPC 汇总引擎 - SQLite 连接与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少定时任务与分析回调并发写入时的 busy 错误
// - 汇总表以 UNIQUE(plan_id, period_type, period_start) 约束兜底唯一性
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间列存储格式（定长，字典序即时间序）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 上游写入的 created_at 可能为 `T` 分隔或不带毫秒，比较前先在 SQL 中归一化为 TIMESTAMP_FORMAT
///
/// SQLite 的 `%f` 输出 `SS.SSS`，与 format_timestamp 逐字节一致；无法识别的文本得到 NULL，不参与比较。
pub const NORMALIZED_CREATED_AT: &str = "strftime('%Y-%m-%d %H:%M:%f', created_at)";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 分析记录表与抽样计划表归上游所有，这里只建出本引擎读取所需的列，
/// 便于独立部署与测试。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS spc_sampling_plan (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            mapping_id INTEGER,
            production_line_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'active'
        );

        CREATE INDEX IF NOT EXISTS idx_spc_plan_status
            ON spc_sampling_plan(status);

        CREATE TABLE IF NOT EXISTS spc_analysis_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mapping_id INTEGER,
            created_at TEXT NOT NULL,
            sample_count INTEGER NOT NULL DEFAULT 0,
            mean INTEGER,
            std_dev INTEGER,
            cp INTEGER,
            cpk INTEGER,
            ucl INTEGER,
            lcl INTEGER,
            alert_triggered INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_spc_analysis_mapping_time
            ON spc_analysis_history(mapping_id, created_at);

        CREATE TABLE IF NOT EXISTS spc_summary_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL,
            production_line_id INTEGER NOT NULL,
            mapping_id INTEGER,
            period_type TEXT NOT NULL CHECK (period_type IN ('shift', 'day', 'week', 'month')),
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL,
            sample_count INTEGER NOT NULL DEFAULT 0,
            subgroup_count INTEGER NOT NULL DEFAULT 0,
            mean INTEGER,
            std_dev INTEGER,
            min_value INTEGER,
            max_value INTEGER,
            range_value INTEGER,
            cp INTEGER,
            cpk INTEGER,
            out_of_spec_count INTEGER NOT NULL DEFAULT 0,
            out_of_control_count INTEGER NOT NULL DEFAULT 0,
            rule1_violations INTEGER NOT NULL DEFAULT 0,
            rule2_violations INTEGER NOT NULL DEFAULT 0,
            rule3_violations INTEGER NOT NULL DEFAULT 0,
            rule4_violations INTEGER NOT NULL DEFAULT 0,
            rule5_violations INTEGER NOT NULL DEFAULT 0,
            rule6_violations INTEGER NOT NULL DEFAULT 0,
            rule7_violations INTEGER NOT NULL DEFAULT 0,
            rule8_violations INTEGER NOT NULL DEFAULT 0,
            overall_status TEXT NOT NULL DEFAULT 'good',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(plan_id, period_type, period_start)
        );

        CREATE INDEX IF NOT EXISTS idx_spc_summary_line
            ON spc_summary_stats(production_line_id);
        CREATE INDEX IF NOT EXISTS idx_spc_summary_period
            ON spc_summary_stats(period_type, period_start);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 时间列编解码
// ==========================================

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// 解析时间列
///
/// 兼容上游写入的 `T` 分隔与不带毫秒的格式。
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
}

/// 在行映射闭包中读取时间列
pub fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
