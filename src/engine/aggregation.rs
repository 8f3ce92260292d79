// ==========================================
// SPC 汇总引擎 - 汇总编排器 (Aggregation Orchestrator)
// ==========================================
// 用途: 把一个计划在一个时间窗口内的分析记录汇总为一行 SummaryStat
// 流程: 计划解析 → 拉取记录 → 描述统计 + 违规计数 → 状态判定 → 原子 upsert
// ==========================================
// 红线:
// - 计划不存在返回 Ok(false)，不视为错误
// - 窗口内无记录返回 Ok(true)，不写入
// - 批量调用中单个计划失败只记日志，不影响其他计划
// ==========================================

use crate::config::AggregationConfigReader;
use crate::domain::analysis::AnalysisRecord;
use crate::domain::plan::SamplingPlan;
use crate::domain::scaled::{Scaled, CAPABILITY_SCALE};
use crate::domain::summary::SummaryStat;
use crate::domain::types::PeriodType;
use crate::engine::period::{current_window, previous_window, windows_overlapping, PeriodWindow};
use crate::engine::repositories::SpcRepositories;
use crate::engine::statistics::{calculate_statistics, mean_of, StatusThresholds};
use crate::engine::violation::count_violations;
use crate::repository::error::RepositoryResult;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// summarize - 纯计算部分
// ==========================================

/// 由窗口内的分析记录生成汇总行
///
/// 描述统计针对各子组均值；cp/cpk 为非空值的不加权平均；
/// 状态按还原后的平均 Cpk 判定。
pub fn summarize(
    plan: &SamplingPlan,
    period_type: PeriodType,
    window: &PeriodWindow,
    records: &[AnalysisRecord],
    thresholds: &StatusThresholds,
) -> SummaryStat {
    let means: Vec<f64> = records
        .iter()
        .filter_map(|r| r.mean.map(|v| v.as_f64()))
        .collect();
    let cps: Vec<f64> = records
        .iter()
        .filter_map(|r| r.cp.map(|v| v.as_f64()))
        .collect();
    let cpks: Vec<f64> = records
        .iter()
        .filter_map(|r| r.cpk.map(|v| v.as_f64()))
        .collect();

    let stats = calculate_statistics(&means);
    let avg_cp = mean_of(&cps);
    let avg_cpk = mean_of(&cpks);
    let violations = count_violations(records);

    let overall_status =
        thresholds.classify(avg_cpk.map(|v| v / CAPABILITY_SCALE as f64));

    SummaryStat {
        plan_id: plan.id,
        period_type,
        period_start: window.start,
        period_end: window.end,
        production_line_id: plan.production_line_id,
        mapping_id: plan.mapping_id,
        sample_count: records.iter().map(|r| r.sample_count).sum(),
        subgroup_count: records.len() as i64,
        mean: stats.mean.and_then(Scaled::round_from),
        std_dev: stats.std_dev.and_then(Scaled::round_from),
        min: stats.min.and_then(Scaled::round_from),
        max: stats.max.and_then(Scaled::round_from),
        range: stats.range.and_then(Scaled::round_from),
        cp: avg_cp.and_then(Scaled::round_from),
        cpk: avg_cpk.and_then(Scaled::round_from),
        out_of_spec_count: violations.out_of_spec,
        out_of_control_count: violations.out_of_control,
        rule_violations: violations.rule_violations,
        overall_status,
    }
}

// ==========================================
// SpcAggregationEngine - 汇总编排器
// ==========================================

pub struct SpcAggregationEngine<C>
where
    C: AggregationConfigReader,
{
    repos: SpcRepositories,
    config: Arc<C>,
}

impl<C> SpcAggregationEngine<C>
where
    C: AggregationConfigReader + 'static,
{
    /// 创建新的 SpcAggregationEngine 实例
    ///
    /// # 参数
    /// - repos: 仓储集合
    /// - config: 配置读取器（能力状态阈值）
    pub fn new(repos: SpcRepositories, config: Arc<C>) -> Self {
        Self { repos, config }
    }

    pub fn repositories(&self) -> &SpcRepositories {
        &self.repos
    }

    /// 汇总单个计划的单个窗口
    ///
    /// # 返回
    /// - Ok(true): 已写入，或窗口内无记录
    /// - Ok(false): 计划不存在
    /// - Err: 存储错误
    #[instrument(skip(self), fields(period_type = %period_type))]
    pub async fn aggregate(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        period_start: NaiveDateTime,
        period_end: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let plan = match self.repos.plan_repo.find_by_id(plan_id).await? {
            Some(plan) => plan,
            None => {
                warn!(plan_id, "抽样计划不存在，跳过汇总");
                return Ok(false);
            }
        };

        let window = PeriodWindow::for_period(period_type, period_start, period_end);
        // 左闭右开取数: 恰在班次结束时刻的记录只计入下一班次，闭区间取数会被相邻两个班次重复计入
        let records = self
            .repos
            .analysis_repo
            .find_by_mapping_and_time_range(plan.mapping_id, window.start, window.end_exclusive())
            .await?;

        if records.is_empty() {
            debug!(plan_id, %period_start, "窗口内无分析记录");
            return Ok(true);
        }

        let thresholds = self.config.get_status_thresholds().await?;
        let summary = summarize(&plan, period_type, &window, &records, &thresholds);
        self.repos.summary_repo.upsert(&summary).await?;

        info!(
            plan_id,
            %period_start,
            subgroup_count = summary.subgroup_count,
            sample_count = summary.sample_count,
            cpk = ?summary.cpk.map(|v| v.raw()),
            overall_status = %summary.overall_status,
            "汇总已写入"
        );
        Ok(true)
    }

    async fn aggregate_window(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        window: PeriodWindow,
    ) -> RepositoryResult<bool> {
        self.aggregate(plan_id, period_type, window.start, window.end)
            .await
    }

    /// 按当前时刻汇总所有 active 计划
    ///
    /// # 返回
    /// - Ok(usize): 成功汇总的计划数
    pub async fn aggregate_all_active_plans(&self, period_type: PeriodType) -> RepositoryResult<usize> {
        self.aggregate_all_active_plans_at(period_type, Local::now().naive_local())
            .await
    }

    /// 以指定时刻为“当前”汇总所有 active 计划
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4(), period_type = %period_type))]
    pub async fn aggregate_all_active_plans_at(
        &self,
        period_type: PeriodType,
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let plans = self.repos.plan_repo.list_active().await?;
        let window = current_window(period_type, now);

        let mut success = 0usize;
        for plan in &plans {
            match self.aggregate_window(plan.id, period_type, window).await {
                Ok(true) => success += 1,
                Ok(false) => {}
                Err(e) => error!(plan_id = plan.id, error = %e, "计划汇总失败，继续处理其他计划"),
            }
        }

        info!(
            total = plans.len(),
            success,
            window_start = %window.start,
            "批量汇总完成"
        );
        Ok(success)
    }

    /// 刷新计划当前所在的班次/日/周/月四个窗口
    pub async fn aggregate_plan_all_periods(&self, plan_id: i64) -> RepositoryResult<bool> {
        self.aggregate_plan_at(plan_id, Local::now().naive_local())
            .await
    }

    /// 刷新包含指定时刻的四个窗口
    ///
    /// 四个窗口并发执行；全部成功才返回 true，存储错误在全部完成后返回第一个。
    #[instrument(skip(self))]
    pub async fn aggregate_plan_at(&self, plan_id: i64, instant: NaiveDateTime) -> RepositoryResult<bool> {
        let tasks = PeriodType::ALL.map(|period_type| {
            self.aggregate_window(plan_id, period_type, current_window(period_type, instant))
        });

        let mut all_ok = true;
        for result in join_all(tasks).await {
            all_ok &= result?;
        }
        Ok(all_ok)
    }

    /// 历史回填
    ///
    /// 处理与 [start_date, end_date] 相交的每个窗口，首尾不完整的周期也会处理。
    ///
    /// # 返回
    /// - Ok(usize): 成功汇总的窗口数
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4(), period_type = %period_type))]
    pub async fn backfill(
        &self,
        plan_id: i64,
        period_type: PeriodType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<usize> {
        if self.repos.plan_repo.find_by_id(plan_id).await?.is_none() {
            warn!(plan_id, "抽样计划不存在，跳过回填");
            return Ok(0);
        }

        let windows = windows_overlapping(period_type, start_date, end_date);
        let mut success = 0usize;
        for window in &windows {
            match self.aggregate_window(plan_id, period_type, *window).await {
                Ok(true) => success += 1,
                Ok(false) => {}
                Err(e) => error!(
                    plan_id,
                    window_start = %window.start,
                    error = %e,
                    "回填窗口失败，继续处理后续窗口"
                ),
            }
        }

        info!(plan_id, windows = windows.len(), success, "回填完成");
        Ok(success)
    }

    /// 定时收尾: 汇总刚结束的周期
    ///
    /// 每次: 上一个班次 + 昨天；周一: 上周；每月 1 日: 上月。
    ///
    /// # 返回
    /// - Ok(usize): 成功汇总的 (计划, 窗口) 数
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn run_scheduled_close_out(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
        let period_types = close_out_period_types(now);
        let plans = self.repos.plan_repo.list_active().await?;

        let mut success = 0usize;
        for plan in &plans {
            for &period_type in &period_types {
                let window = previous_window(period_type, now);
                match self.aggregate_window(plan.id, period_type, window).await {
                    Ok(true) => success += 1,
                    Ok(false) => {}
                    Err(e) => error!(
                        plan_id = plan.id,
                        period_type = %period_type,
                        error = %e,
                        "收尾汇总失败，继续处理其他计划"
                    ),
                }
            }
        }

        info!(plans = plans.len(), ?period_types, success, "定时收尾完成");
        Ok(success)
    }

    /// 分析完成后的异步触发（fire-and-forget）
    ///
    /// 错误只记录日志，不会传播给调用方。
    pub fn spawn_post_analysis_hook(self: &Arc<Self>, plan_id: i64) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            match engine.aggregate_plan_all_periods(plan_id).await {
                Ok(true) => debug!(plan_id, "分析后汇总完成"),
                Ok(false) => warn!(plan_id, "分析后汇总未全部完成"),
                Err(e) => error!(plan_id, error = %e, "分析后汇总失败"),
            }
        })
    }
}

/// 定时收尾需要处理的周期类型
pub fn close_out_period_types(now: NaiveDateTime) -> Vec<PeriodType> {
    let mut types = vec![PeriodType::Shift, PeriodType::Day];
    if now.weekday() == Weekday::Mon {
        types.push(PeriodType::Week);
    }
    if now.day() == 1 {
        types.push(PeriodType::Month);
    }
    types
}
