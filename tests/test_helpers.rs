// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use spc_aggregator::db::{init_schema, open_sqlite_connection};
use spc_aggregator::domain::types::PlanStatus;
use spc_aggregator::repository::{AnalysisRecordRepositoryImpl, SamplingPlanRepositoryImpl};
use spc_aggregator::{AnalysisRecord, SamplingPlan, Scaled};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

pub fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 写入 active 抽样计划
pub fn seed_plan(conn: &Arc<Mutex<Connection>>, id: i64, mapping_id: Option<i64>, line: i64) {
    SamplingPlanRepositoryImpl::from_connection(conn.clone())
        .save(&SamplingPlan {
            id,
            name: format!("测试计划{}", id),
            mapping_id,
            production_line_id: line,
            status: PlanStatus::Active,
        })
        .expect("写入计划失败");
}

/// 写入一条分析记录（控制限固定为 9.0 ~ 11.0）
pub fn seed_record(
    conn: &Arc<Mutex<Connection>>,
    mapping_id: i64,
    created_at: NaiveDateTime,
    mean: i64,
    cpk: i64,
    alert: bool,
) -> i64 {
    AnalysisRecordRepositoryImpl::from_connection(conn.clone())
        .insert(&AnalysisRecord {
            id: 0,
            mapping_id: Some(mapping_id),
            created_at,
            sample_count: 5,
            mean: Some(Scaled::from_raw(mean)),
            std_dev: Some(Scaled::from_raw(1_000)),
            ucl: Some(Scaled::from_raw(110_000)),
            lcl: Some(Scaled::from_raw(90_000)),
            cp: Some(Scaled::from_raw(cpk + 100)),
            cpk: Some(Scaled::from_raw(cpk)),
            alert_triggered: alert,
        })
        .expect("写入分析记录失败")
}

/// 规格示例数据: 2024-03-10 早班内 3 条记录，cpk 1200/1400/900，第 3 条告警
pub fn seed_reference_day(conn: &Arc<Mutex<Connection>>, mapping_id: i64) {
    seed_record(conn, mapping_id, dt(2024, 3, 10, 8, 0), 100_000, 1200, false);
    seed_record(conn, mapping_id, dt(2024, 3, 10, 9, 0), 102_000, 1400, false);
    seed_record(conn, mapping_id, dt(2024, 3, 10, 10, 0), 98_000, 900, true);
}
