// ==========================================
// SPC 汇总引擎 - 分析记录 Repository 实现
// ==========================================
// 职责: 从 spc_analysis_history 读取子组分析记录（使用 rusqlite）
// 存储边界: 数值列按 REAL 读取，非有限值在此丢弃
// ==========================================

use crate::db::{format_timestamp, open_sqlite_connection, timestamp_column, NORMALIZED_CREATED_AT};
use crate::domain::analysis::AnalysisRecord;
use crate::domain::scaled::{scaled_from_storage, Scaled};
use crate::repository::analysis_repo::AnalysisRecordRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, mapping_id, created_at, sample_count,
        mean, std_dev, cp, cpk, ucl, lcl, alert_triggered
    FROM spc_analysis_history
"#;

/// 读取缩放列，丢弃非有限值并记录告警
fn scaled_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
    record_id: i64,
    field: &'static str,
) -> rusqlite::Result<Option<Scaled>> {
    let raw: Option<f64> = row.get(idx)?;
    let scaled = scaled_from_storage(raw);
    if raw.is_some() && scaled.is_none() {
        tracing::warn!(record_id, field, "分析记录含非有限数值，按缺失处理");
    }
    Ok(scaled)
}

fn map_analysis_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let id: i64 = row.get(0)?;
    let alert: i64 = row.get(10)?;
    Ok(AnalysisRecord {
        id,
        mapping_id: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        sample_count: row.get(3)?,
        mean: scaled_column(row, 4, id, "mean")?,
        std_dev: scaled_column(row, 5, id, "std_dev")?,
        cp: scaled_column(row, 6, id, "cp")?,
        cpk: scaled_column(row, 7, id, "cpk")?,
        ucl: scaled_column(row, 8, id, "ucl")?,
        lcl: scaled_column(row, 9, id, "lcl")?,
        alert_triggered: alert == 1,
    })
}

// ==========================================
// AnalysisRecordRepositoryImpl
// ==========================================
pub struct AnalysisRecordRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl AnalysisRecordRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入一条分析记录（上游 analyze 例程与测试数据使用）
    ///
    /// # 返回
    /// - Ok(i64): 新记录 ID（忽略 record.id）
    pub fn insert(&self, record: &AnalysisRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO spc_analysis_history (
                mapping_id, created_at, sample_count,
                mean, std_dev, cp, cpk, ucl, lcl, alert_triggered
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.mapping_id,
                format_timestamp(record.created_at),
                record.sample_count,
                record.mean.map(|v| v.raw()),
                record.std_dev.map(|v| v.raw()),
                record.cp.map(|v| v.raw()),
                record.cpk.map(|v| v.raw()),
                record.ucl.map(|v| v.raw()),
                record.lcl.map(|v| v.raw()),
                record.alert_triggered as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl AnalysisRecordRepository for AnalysisRecordRepositoryImpl {
    async fn find_by_mapping_and_time_range(
        &self,
        mapping_id: Option<i64>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> RepositoryResult<Vec<AnalysisRecord>> {
        let conn = self.get_conn()?;
        let from_str = format_timestamp(from);
        let until_str = format_timestamp(until);

        let records = match mapping_id {
            Some(mapping_id) => {
                let sql = format!(
                    "{cols} WHERE mapping_id = ?1 AND {ts} >= ?2 AND {ts} < ?3 ORDER BY {ts} ASC, id ASC",
                    cols = SELECT_COLUMNS,
                    ts = NORMALIZED_CREATED_AT
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![mapping_id, from_str, until_str], map_analysis_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "{cols} WHERE {ts} >= ?1 AND {ts} < ?2 ORDER BY {ts} ASC, id ASC",
                    cols = SELECT_COLUMNS,
                    ts = NORMALIZED_CREATED_AT
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![from_str, until_str], map_analysis_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(records)
    }
}
