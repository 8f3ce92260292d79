// ==========================================
// 引擎单元测试用内存仓储
// ==========================================

use crate::domain::analysis::AnalysisRecord;
use crate::domain::plan::SamplingPlan;
use crate::domain::scaled::Scaled;
use crate::domain::summary::{SummaryKey, SummaryStat};
use crate::domain::types::{PeriodType, PlanStatus};
use crate::engine::repositories::SpcRepositories;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{AnalysisRecordRepository, SamplingPlanRepository, SummaryStatRepository};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

pub fn plan(id: i64, mapping_id: Option<i64>, line: i64) -> SamplingPlan {
    SamplingPlan {
        id,
        name: format!("plan-{}", id),
        mapping_id,
        production_line_id: line,
        status: PlanStatus::Active,
    }
}

pub fn record(mapping_id: i64, created_at: NaiveDateTime, mean: i64, cpk: i64, alert: bool) -> AnalysisRecord {
    AnalysisRecord {
        id: 0,
        mapping_id: Some(mapping_id),
        created_at,
        sample_count: 5,
        mean: Some(Scaled::from_raw(mean)),
        std_dev: Some(Scaled::from_raw(500)),
        ucl: Some(Scaled::from_raw(110_000)),
        lcl: Some(Scaled::from_raw(90_000)),
        cp: Some(Scaled::from_raw(cpk + 100)),
        cpk: Some(Scaled::from_raw(cpk)),
        alert_triggered: alert,
    }
}

// ===== 分析记录 =====

#[derive(Default)]
pub struct MemoryAnalysisRepo {
    pub records: Mutex<Vec<AnalysisRecord>>,
}

impl MemoryAnalysisRepo {
    pub fn push(&self, record: AnalysisRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl AnalysisRecordRepository for MemoryAnalysisRepo {
    async fn find_by_mapping_and_time_range(
        &self,
        mapping_id: Option<i64>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> RepositoryResult<Vec<AnalysisRecord>> {
        let mut out: Vec<AnalysisRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| mapping_id.is_none() || r.mapping_id == mapping_id)
            .filter(|r| r.created_at >= from && r.created_at < until)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }
}

// ===== 抽样计划 =====

#[derive(Default)]
pub struct MemoryPlanRepo {
    pub plans: Mutex<Vec<SamplingPlan>>,
}

#[async_trait]
impl SamplingPlanRepository for MemoryPlanRepo {
    async fn find_by_id(&self, plan_id: i64) -> RepositoryResult<Option<SamplingPlan>> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }

    async fn list_active(&self) -> RepositoryResult<Vec<SamplingPlan>> {
        let mut active: Vec<SamplingPlan> = self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|p| p.id);
        Ok(active)
    }
}

// ===== 汇总统计 =====

#[derive(Default)]
pub struct MemorySummaryRepo {
    pub rows: Mutex<HashMap<SummaryKey, SummaryStat>>,
    /// 对该计划的写入返回存储错误
    pub failing_plan: Option<i64>,
}

impl MemorySummaryRepo {
    pub fn all(&self) -> Vec<SummaryStat> {
        let mut rows: Vec<SummaryStat> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by_key(|s| (s.plan_id, s.period_start));
        rows
    }

    pub fn insert(&self, summary: SummaryStat) {
        self.rows.lock().unwrap().insert(summary.key(), summary);
    }

    fn filtered<F>(&self, pred: F) -> Vec<SummaryStat>
    where
        F: Fn(&SummaryStat) -> bool,
    {
        let mut rows: Vec<SummaryStat> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| pred(s))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.period_start);
        rows
    }
}

#[async_trait]
impl SummaryStatRepository for MemorySummaryRepo {
    async fn upsert(&self, summary: &SummaryStat) -> RepositoryResult<()> {
        if self.failing_plan == Some(summary.plan_id) {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        self.insert(summary.clone());
        Ok(())
    }

    async fn find_by_key(&self, key: &SummaryKey) -> RepositoryResult<Option<SummaryStat>> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    async fn find_overlapping(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        Ok(self.filtered(|s| {
            s.plan_id == plan_id
                && s.period_type == period_type
                && s.period_start <= to
                && s.period_end > from
        }))
    }

    async fn find_starting_between(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        Ok(self.filtered(|s| {
            s.plan_id == plan_id
                && s.period_type == period_type
                && s.period_start >= from
                && s.period_start <= to
        }))
    }

    async fn find_by_time_range(
        &self,
        period_type: PeriodType,
        start: NaiveDateTime,
        end: NaiveDateTime,
        production_line_id: Option<i64>,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let mut rows = self.filtered(|s| {
            s.period_type == period_type
                && s.period_start >= start
                && s.period_end <= end
                && production_line_id.map_or(true, |line| s.production_line_id == line)
        });
        rows.reverse();
        Ok(rows)
    }

    async fn find_latest(
        &self,
        plan_id: i64,
        period_type: PeriodType,
    ) -> RepositoryResult<Option<SummaryStat>> {
        Ok(self
            .filtered(|s| s.plan_id == plan_id && s.period_type == period_type)
            .pop())
    }
}

/// 内存仓储三件套
pub struct MemoryStores {
    pub analysis: Arc<MemoryAnalysisRepo>,
    pub plans: Arc<MemoryPlanRepo>,
    pub summaries: Arc<MemorySummaryRepo>,
}

impl MemoryStores {
    pub fn new(plans: Vec<SamplingPlan>) -> Self {
        Self::with_summary_repo(plans, MemorySummaryRepo::default())
    }

    pub fn with_summary_repo(plans: Vec<SamplingPlan>, summaries: MemorySummaryRepo) -> Self {
        Self {
            analysis: Arc::new(MemoryAnalysisRepo::default()),
            plans: Arc::new(MemoryPlanRepo {
                plans: Mutex::new(plans),
            }),
            summaries: Arc::new(summaries),
        }
    }

    pub fn repositories(&self) -> SpcRepositories {
        SpcRepositories::new(
            self.analysis.clone(),
            self.plans.clone(),
            self.summaries.clone(),
        )
    }
}
