// ==========================================
// SPC 汇总引擎 - 抽样计划 Repository 实现
// ==========================================
// 职责: 从 spc_sampling_plan 读取计划（使用 rusqlite）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::plan::SamplingPlan;
use crate::domain::types::PlanStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sampling_plan_repo::SamplingPlanRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

fn map_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SamplingPlan> {
    let status: String = row.get(4)?;
    Ok(SamplingPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        mapping_id: row.get(2)?,
        production_line_id: row.get(3)?,
        status: PlanStatus::from(status.as_str()),
    })
}

// ==========================================
// SamplingPlanRepositoryImpl
// ==========================================
pub struct SamplingPlanRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SamplingPlanRepositoryImpl {
    /// 创建新的 Repository 实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入或覆盖一个计划（上游计划管理与测试数据使用）
    pub fn save(&self, plan: &SamplingPlan) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO spc_sampling_plan (id, name, mapping_id, production_line_id, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                mapping_id = excluded.mapping_id,
                production_line_id = excluded.production_line_id,
                status = excluded.status
            "#,
            params![
                plan.id,
                plan.name,
                plan.mapping_id,
                plan.production_line_id,
                plan.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// 删除计划
    pub fn delete(&self, plan_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM spc_sampling_plan WHERE id = ?1", params![plan_id])?)
    }
}

#[async_trait]
impl SamplingPlanRepository for SamplingPlanRepositoryImpl {
    async fn find_by_id(&self, plan_id: i64) -> RepositoryResult<Option<SamplingPlan>> {
        let conn = self.get_conn()?;
        let plan = conn
            .query_row(
                r#"
                SELECT id, name, mapping_id, production_line_id, status
                FROM spc_sampling_plan
                WHERE id = ?1
                "#,
                params![plan_id],
                map_plan_row,
            )
            .optional()?;
        Ok(plan)
    }

    async fn list_active(&self) -> RepositoryResult<Vec<SamplingPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, mapping_id, production_line_id, status
            FROM spc_sampling_plan
            WHERE status = 'active'
            ORDER BY id ASC
            "#,
        )?;
        let plans = stmt
            .query_map([], map_plan_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plans)
    }
}
