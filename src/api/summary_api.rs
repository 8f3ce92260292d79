// ==========================================
// SPC 汇总引擎 - 汇总查询 API
// ==========================================
// 职责: 面向看板/报表的只读查询、班次对比、CSV 导出
// 红线: 只读，不触发汇总
// ==========================================

use std::io::Write;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::api::error::{ApiError, ApiResult};
use crate::api::export;
use crate::config::AggregationConfigReader;
use crate::domain::summary::SummaryStat;
use crate::domain::types::PeriodType;
use crate::engine::shift_compare::{ShiftComparator, ShiftComparison};
use crate::repository::SummaryStatRepository;

// ==========================================
// SpcSummaryApi - 汇总查询 API
// ==========================================
pub struct SpcSummaryApi {
    summary_repo: Arc<dyn SummaryStatRepository>,
    comparator: ShiftComparator,
    config: Arc<dyn AggregationConfigReader>,
}

impl SpcSummaryApi {
    /// 创建新的SpcSummaryApi实例
    pub fn new(
        summary_repo: Arc<dyn SummaryStatRepository>,
        config: Arc<dyn AggregationConfigReader>,
    ) -> Self {
        Self {
            comparator: ShiftComparator::new(summary_repo.clone()),
            summary_repo,
            config,
        }
    }

    /// 查询某天开始的三个班次汇总
    ///
    /// 按 period_start 落在当天筛选，而不是要求整个班次落在当天之内
    /// （period_end <= 当天 23:59:59.999）；因此当晚 22:00 开始、次日 06:00
    /// 结束的夜班会返回，前一晚跨入当天的夜班不会返回。
    ///
    /// # 返回
    /// - Ok(Vec<SummaryStat>): 按开始时间升序
    pub async fn get_shift_summary_for_day(
        &self,
        plan_id: i64,
        date: NaiveDate,
    ) -> ApiResult<Vec<SummaryStat>> {
        Ok(self.comparator.shift_summaries_for_day(plan_id, date).await?)
    }

    /// 最近 N 天的班次对比
    ///
    /// # 参数
    /// - days: None 时使用配置 spc.compare.default_days
    pub async fn compare_shifts(&self, plan_id: i64, days: Option<i64>) -> ApiResult<ShiftComparison> {
        self.compare_shifts_at(plan_id, days, Local::now().naive_local())
            .await
    }

    pub async fn compare_shifts_at(
        &self,
        plan_id: i64,
        days: Option<i64>,
        now: NaiveDateTime,
    ) -> ApiResult<ShiftComparison> {
        let days = match days {
            Some(d) if d < 1 => {
                return Err(ApiError::InvalidInput(format!(
                    "对比天数必须大于等于1: {}",
                    d
                )))
            }
            Some(d) => d,
            None => self.config.get_compare_default_days().await?,
        };

        Ok(self.comparator.compare_shifts_at(plan_id, days, now).await?)
    }

    /// 查询完全落在 [start, end] 内的汇总，按开始时间降序
    ///
    /// # 参数
    /// - production_line_id: Some 时仅返回该产线
    pub async fn get_summary_by_time_range(
        &self,
        period_type: PeriodType,
        start: NaiveDateTime,
        end: NaiveDateTime,
        production_line_id: Option<i64>,
    ) -> ApiResult<Vec<SummaryStat>> {
        if start > end {
            return Err(ApiError::InvalidInput(format!(
                "开始时间不能晚于结束时间: start={}, end={}",
                start, end
            )));
        }

        Ok(self
            .summary_repo
            .find_by_time_range(period_type, start, end, production_line_id)
            .await?)
    }

    /// 查询计划在某周期类型下最新的汇总
    ///
    /// # 返回
    /// - Ok(None): 尚无汇总
    pub async fn get_latest_summary(
        &self,
        plan_id: i64,
        period_type: PeriodType,
    ) -> ApiResult<Option<SummaryStat>> {
        Ok(self.summary_repo.find_latest(plan_id, period_type).await?)
    }

    /// 导出汇总为 CSV，返回数据行数
    pub fn export_summaries_csv<W: Write>(&self, rows: &[SummaryStat], writer: W) -> ApiResult<usize> {
        export::export_summaries_csv(rows, writer)
    }
}
