// ==========================================
// SPC 汇总引擎 - 汇总统计 Repository 实现
// ==========================================
// 职责: spc_summary_stats 的读写（使用 rusqlite）
// 并发: 以 INSERT ... ON CONFLICT DO UPDATE 保证同一键只有一行，
//       定时任务与分析回调竞争同一键时由约束收敛
// ==========================================

use crate::db::{format_timestamp, open_sqlite_connection, timestamp_column};
use crate::domain::scaled::Scaled;
use crate::domain::summary::{SummaryKey, SummaryStat, RUN_RULE_COUNT};
use crate::domain::types::{OverallStatus, PeriodType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::summary_repo::SummaryStatRepository;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT
        plan_id, period_type, period_start, period_end,
        production_line_id, mapping_id,
        sample_count, subgroup_count,
        mean, std_dev, min_value, max_value, range_value,
        cp, cpk,
        out_of_spec_count, out_of_control_count,
        rule1_violations, rule2_violations, rule3_violations, rule4_violations,
        rule5_violations, rule6_violations, rule7_violations, rule8_violations,
        overall_status
    FROM spc_summary_stats
"#;

fn raw(value: Option<Scaled>) -> Option<i64> {
    value.map(|v| v.raw())
}

fn scaled(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Scaled>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(Scaled::from_raw))
}

fn text_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let value: String = row.get(idx)?;
    value.parse::<T>().map_err(|msg| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
    })
}

fn map_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SummaryStat> {
    let mut rule_violations = [0i64; RUN_RULE_COUNT];
    for (offset, slot) in rule_violations.iter_mut().enumerate() {
        *slot = row.get(17 + offset)?;
    }

    Ok(SummaryStat {
        plan_id: row.get(0)?,
        period_type: text_enum::<PeriodType>(row, 1)?,
        period_start: timestamp_column(row, 2)?,
        period_end: timestamp_column(row, 3)?,
        production_line_id: row.get(4)?,
        mapping_id: row.get(5)?,
        sample_count: row.get(6)?,
        subgroup_count: row.get(7)?,
        mean: scaled(row, 8)?,
        std_dev: scaled(row, 9)?,
        min: scaled(row, 10)?,
        max: scaled(row, 11)?,
        range: scaled(row, 12)?,
        cp: scaled(row, 13)?,
        cpk: scaled(row, 14)?,
        out_of_spec_count: row.get(15)?,
        out_of_control_count: row.get(16)?,
        rule_violations,
        overall_status: text_enum::<OverallStatus>(row, 25)?,
    })
}

// ==========================================
// SummaryStatRepositoryImpl
// ==========================================
pub struct SummaryStatRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SummaryStatRepositoryImpl {
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

    /// 汇总行数（按计划 + 周期类型）
    pub fn count(&self, plan_id: i64, period_type: PeriodType) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM spc_summary_stats WHERE plan_id = ?1 AND period_type = ?2",
            params![plan_id, period_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    fn query_list(
        &self,
        where_clause: &str,
        order_by: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE {} ORDER BY {}", SELECT_COLUMNS, where_clause, order_by);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, map_summary_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl SummaryStatRepository for SummaryStatRepositoryImpl {
    async fn upsert(&self, summary: &SummaryStat) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let r = &summary.rule_violations;

        conn.execute(
            r#"
            INSERT INTO spc_summary_stats (
                plan_id, production_line_id, mapping_id,
                period_type, period_start, period_end,
                sample_count, subgroup_count,
                mean, std_dev, min_value, max_value, range_value,
                cp, cpk,
                out_of_spec_count, out_of_control_count,
                rule1_violations, rule2_violations, rule3_violations, rule4_violations,
                rule5_violations, rule6_violations, rule7_violations, rule8_violations,
                overall_status, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25,
                ?26, datetime('now')
            )
            ON CONFLICT(plan_id, period_type, period_start) DO UPDATE SET
                production_line_id = excluded.production_line_id,
                mapping_id = excluded.mapping_id,
                period_end = excluded.period_end,
                sample_count = excluded.sample_count,
                subgroup_count = excluded.subgroup_count,
                mean = excluded.mean,
                std_dev = excluded.std_dev,
                min_value = excluded.min_value,
                max_value = excluded.max_value,
                range_value = excluded.range_value,
                cp = excluded.cp,
                cpk = excluded.cpk,
                out_of_spec_count = excluded.out_of_spec_count,
                out_of_control_count = excluded.out_of_control_count,
                rule1_violations = excluded.rule1_violations,
                rule2_violations = excluded.rule2_violations,
                rule3_violations = excluded.rule3_violations,
                rule4_violations = excluded.rule4_violations,
                rule5_violations = excluded.rule5_violations,
                rule6_violations = excluded.rule6_violations,
                rule7_violations = excluded.rule7_violations,
                rule8_violations = excluded.rule8_violations,
                overall_status = excluded.overall_status,
                updated_at = datetime('now')
            "#,
            params![
                summary.plan_id,
                summary.production_line_id,
                summary.mapping_id,
                summary.period_type.as_str(),
                format_timestamp(summary.period_start),
                format_timestamp(summary.period_end),
                summary.sample_count,
                summary.subgroup_count,
                raw(summary.mean),
                raw(summary.std_dev),
                raw(summary.min),
                raw(summary.max),
                raw(summary.range),
                raw(summary.cp),
                raw(summary.cpk),
                summary.out_of_spec_count,
                summary.out_of_control_count,
                r[0],
                r[1],
                r[2],
                r[3],
                r[4],
                r[5],
                r[6],
                r[7],
                summary.overall_status.as_str(),
            ],
        )?;

        Ok(())
    }

    async fn find_by_key(&self, key: &SummaryKey) -> RepositoryResult<Option<SummaryStat>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE plan_id = ?1 AND period_type = ?2 AND period_start = ?3",
            SELECT_COLUMNS
        );
        let summary = conn
            .query_row(
                &sql,
                params![
                    key.plan_id,
                    key.period_type.as_str(),
                    format_timestamp(key.period_start)
                ],
                map_summary_row,
            )
            .optional()?;
        Ok(summary)
    }

    async fn find_overlapping(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let from_str = format_timestamp(from);
        let to_str = format_timestamp(to);
        self.query_list(
            "plan_id = ?1 AND period_type = ?2 AND period_start <= ?4 AND period_end > ?3",
            "period_start ASC",
            params![plan_id, period_type.as_str(), from_str, to_str],
        )
    }

    async fn find_starting_between(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let from_str = format_timestamp(from);
        let to_str = format_timestamp(to);
        self.query_list(
            "plan_id = ?1 AND period_type = ?2 AND period_start >= ?3 AND period_start <= ?4",
            "period_start ASC",
            params![plan_id, period_type.as_str(), from_str, to_str],
        )
    }

    async fn find_by_time_range(
        &self,
        period_type: PeriodType,
        start: NaiveDateTime,
        end: NaiveDateTime,
        production_line_id: Option<i64>,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let start_str = format_timestamp(start);
        let end_str = format_timestamp(end);
        match production_line_id {
            Some(line_id) => self.query_list(
                "period_type = ?1 AND period_start >= ?2 AND period_end <= ?3 AND production_line_id = ?4",
                "period_start DESC, plan_id ASC",
                params![period_type.as_str(), start_str, end_str, line_id],
            ),
            None => self.query_list(
                "period_type = ?1 AND period_start >= ?2 AND period_end <= ?3",
                "period_start DESC, plan_id ASC",
                params![period_type.as_str(), start_str, end_str],
            ),
        }
    }

    async fn find_latest(
        &self,
        plan_id: i64,
        period_type: PeriodType,
    ) -> RepositoryResult<Option<SummaryStat>> {
        let mut rows = self.query_list(
            "plan_id = ?1 AND period_type = ?2",
            "period_start DESC LIMIT 1",
            params![plan_id, period_type.as_str()],
        )?;
        Ok(rows.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::NaiveDate;

    fn setup() -> SummaryStatRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        SummaryStatRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn summary(start: NaiveDateTime, end: NaiveDateTime, cpk: i64) -> SummaryStat {
        SummaryStat {
            plan_id: 1,
            period_type: PeriodType::Shift,
            period_start: start,
            period_end: end,
            production_line_id: 7,
            mapping_id: Some(10),
            sample_count: 15,
            subgroup_count: 3,
            mean: Some(Scaled::from_raw(100_000)),
            std_dev: Some(Scaled::from_raw(1_000)),
            min: Some(Scaled::from_raw(99_000)),
            max: Some(Scaled::from_raw(101_000)),
            range: Some(Scaled::from_raw(2_000)),
            cp: Some(Scaled::from_raw(1_500)),
            cpk: Some(Scaled::from_raw(cpk)),
            out_of_spec_count: 1,
            out_of_control_count: 0,
            rule_violations: [0; RUN_RULE_COUNT],
            overall_status: OverallStatus::Acceptable,
        }
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let repo = setup();
        let first = summary(at(10, 6), at(10, 14), 1_100);
        repo.upsert(&first).await.unwrap();

        let mut second = first.clone();
        second.cpk = Some(Scaled::from_raw(1_400));
        second.overall_status = OverallStatus::Good;
        repo.upsert(&second).await.unwrap();

        assert_eq!(repo.count(1, PeriodType::Shift).unwrap(), 1);
        let stored = repo.find_by_key(&first.key()).await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_range_queries() {
        let repo = setup();
        repo.upsert(&summary(at(10, 6), at(10, 14), 1_000)).await.unwrap();
        repo.upsert(&summary(at(10, 14), at(10, 22), 1_100)).await.unwrap();
        repo.upsert(&summary(at(10, 22), at(11, 6), 1_200)).await.unwrap();
        repo.upsert(&summary(at(11, 6), at(11, 14), 1_300)).await.unwrap();

        let overlapping = repo
            .find_overlapping(1, PeriodType::Shift, at(10, 23), at(11, 7))
            .await
            .unwrap();
        assert_eq!(overlapping.len(), 2);
        assert_eq!(overlapping[0].period_start, at(10, 22));

        let starting = repo
            .find_starting_between(1, PeriodType::Shift, at(10, 0), at(10, 23))
            .await
            .unwrap();
        assert_eq!(starting.len(), 3);

        let contained = repo
            .find_by_time_range(PeriodType::Shift, at(10, 0), at(11, 0), Some(7))
            .await
            .unwrap();
        assert_eq!(contained.len(), 2);
        assert_eq!(contained[0].period_start, at(10, 14));

        let other_line = repo
            .find_by_time_range(PeriodType::Shift, at(10, 0), at(11, 0), Some(8))
            .await
            .unwrap();
        assert!(other_line.is_empty());

        let latest = repo.find_latest(1, PeriodType::Shift).await.unwrap().unwrap();
        assert_eq!(latest.period_start, at(11, 6));
        assert!(repo.find_latest(1, PeriodType::Day).await.unwrap().is_none());
    }
}
