// ==========================================
// SPC 汇总引擎 - 班次对比器 (Shift Comparator)
// ==========================================
// 职责: 比较早/中/夜班在最近 N 天内的能力表现
// 输入: period_type = shift 的汇总行（只读）
// ==========================================

use crate::domain::summary::SummaryStat;
use crate::domain::types::{PeriodType, ShiftType};
use crate::engine::period::{day_window, shift_of_hour};
use crate::repository::error::RepositoryResult;
use crate::repository::SummaryStatRepository;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// 输出结构
// ==========================================

/// 单个班次的 Cpk 统计（未缩放）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftCpkStats {
    pub shift: ShiftType,
    pub shift_name: String,
    pub avg_cpk: Option<f64>,
    pub min_cpk: Option<f64>,
    pub max_cpk: Option<f64>,
    /// 该班次的汇总行数
    pub sample_count: usize,
    /// 各汇总行 sample_count 之和
    pub total_samples: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftComparison {
    pub shifts: Vec<ShiftCpkStats>,
    pub best_shift: Option<ShiftType>,
    pub worst_shift: Option<ShiftType>,
    pub period_days: i64,
}

/// 按班次分桶并计算统计
///
/// 班次由 period_start 的小时判定；三个班次始终按早 → 中 → 夜输出。
/// 平均 Cpk 相同时取先出现的班次。
pub fn compare_summaries(summaries: &[SummaryStat], period_days: i64) -> ShiftComparison {
    let shifts: Vec<ShiftCpkStats> = ShiftType::ALL
        .iter()
        .map(|&shift| {
            let bucket: Vec<&SummaryStat> = summaries
                .iter()
                .filter(|s| shift_of_hour(s.period_start.hour()) == shift)
                .collect();
            let cpks: Vec<f64> = bucket.iter().filter_map(|s| s.cpk_unscaled()).collect();

            let (avg_cpk, min_cpk, max_cpk) = if cpks.is_empty() {
                (None, None, None)
            } else {
                let avg = cpks.iter().sum::<f64>() / cpks.len() as f64;
                let min = cpks.iter().copied().fold(f64::INFINITY, f64::min);
                let max = cpks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (Some(avg), Some(min), Some(max))
            };

            ShiftCpkStats {
                shift,
                shift_name: shift.display_name().to_string(),
                avg_cpk,
                min_cpk,
                max_cpk,
                sample_count: bucket.len(),
                total_samples: bucket.iter().map(|s| s.sample_count).sum(),
            }
        })
        .collect();

    let mut best: Option<(ShiftType, f64)> = None;
    let mut worst: Option<(ShiftType, f64)> = None;
    for stats in &shifts {
        let avg = match stats.avg_cpk {
            Some(v) => v,
            None => continue,
        };
        if best.map_or(true, |(_, b)| avg > b) {
            best = Some((stats.shift, avg));
        }
        if worst.map_or(true, |(_, w)| avg < w) {
            worst = Some((stats.shift, avg));
        }
    }

    ShiftComparison {
        shifts,
        best_shift: best.map(|(shift, _)| shift),
        worst_shift: worst.map(|(shift, _)| shift),
        period_days,
    }
}

// ==========================================
// ShiftComparator
// ==========================================
pub struct ShiftComparator {
    summary_repo: Arc<dyn SummaryStatRepository>,
}

impl ShiftComparator {
    pub fn new(summary_repo: Arc<dyn SummaryStatRepository>) -> Self {
        Self { summary_repo }
    }

    /// 最近 days 天的班次对比（以当前时刻为终点）
    pub async fn compare_shifts(&self, plan_id: i64, days: i64) -> RepositoryResult<ShiftComparison> {
        self.compare_shifts_at(plan_id, days, Local::now().naive_local())
            .await
    }

    /// 与 [now - days, now] 相交的班次汇总参与对比
    ///
    /// days 超出可表示的时间范围时，起点取 NaiveDateTime::MIN。
    pub async fn compare_shifts_at(
        &self,
        plan_id: i64,
        days: i64,
        now: NaiveDateTime,
    ) -> RepositoryResult<ShiftComparison> {
        let from = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(NaiveDateTime::MIN);
        let summaries = self
            .summary_repo
            .find_overlapping(plan_id, PeriodType::Shift, from, now)
            .await?;

        debug!(plan_id, days, rows = summaries.len(), "班次对比");
        Ok(compare_summaries(&summaries, days))
    }

    /// 某一天开始的全部班次汇总（含当晚跨日的夜班），按开始时间升序
    pub async fn shift_summaries_for_day(
        &self,
        plan_id: i64,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<SummaryStat>> {
        let day = day_window(date);
        self.summary_repo
            .find_starting_between(plan_id, PeriodType::Shift, day.start, day.end)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scaled::Scaled;
    use crate::domain::summary::RUN_RULE_COUNT;
    use crate::domain::types::OverallStatus;
    use crate::engine::period::shift_window;
    use crate::engine::test_support::{dt, MemorySummaryRepo};

    fn shift_summary(date: NaiveDate, shift: ShiftType, cpk: Option<i64>, samples: i64) -> SummaryStat {
        let window = shift_window(date, shift);
        SummaryStat {
            plan_id: 1,
            period_type: PeriodType::Shift,
            period_start: window.start,
            period_end: window.end,
            production_line_id: 7,
            mapping_id: Some(10),
            sample_count: samples,
            subgroup_count: 1,
            mean: None,
            std_dev: None,
            min: None,
            max: None,
            range: None,
            cp: None,
            cpk: cpk.map(Scaled::from_raw),
            out_of_spec_count: 0,
            out_of_control_count: 0,
            rule_violations: [0; RUN_RULE_COUNT],
            overall_status: OverallStatus::Good,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_compare_summaries_buckets_and_extremes() {
        let rows = vec![
            shift_summary(d(9), ShiftType::Morning, Some(1500), 20),
            shift_summary(d(10), ShiftType::Morning, Some(1300), 25),
            shift_summary(d(10), ShiftType::Afternoon, Some(1000), 10),
            shift_summary(d(10), ShiftType::Night, Some(800), 15),
            shift_summary(d(11), ShiftType::Night, None, 5),
        ];

        let result = compare_summaries(&rows, 7);
        assert_eq!(result.period_days, 7);
        assert_eq!(result.shifts.len(), 3);

        let morning = &result.shifts[0];
        assert_eq!(morning.shift_name, "早班");
        assert!((morning.avg_cpk.unwrap() - 1.4).abs() < 1e-9);
        assert_eq!(morning.min_cpk, Some(1.3));
        assert_eq!(morning.max_cpk, Some(1.5));
        assert_eq!(morning.sample_count, 2);
        assert_eq!(morning.total_samples, 45);

        let night = &result.shifts[2];
        assert_eq!(night.sample_count, 2);
        assert_eq!(night.total_samples, 20);
        assert_eq!(night.avg_cpk, Some(0.8));

        assert_eq!(result.best_shift, Some(ShiftType::Morning));
        assert_eq!(result.worst_shift, Some(ShiftType::Night));
    }

    #[test]
    fn test_ties_go_to_first_shift() {
        let rows = vec![
            shift_summary(d(10), ShiftType::Afternoon, Some(1200), 5),
            shift_summary(d(10), ShiftType::Night, Some(1200), 5),
        ];
        let result = compare_summaries(&rows, 3);
        assert_eq!(result.best_shift, Some(ShiftType::Afternoon));
        assert_eq!(result.worst_shift, Some(ShiftType::Afternoon));
        assert_eq!(result.shifts[0].avg_cpk, None);
    }

    #[test]
    fn test_no_data() {
        let result = compare_summaries(&[], 7);
        assert!(result.best_shift.is_none() && result.worst_shift.is_none());
        assert!(result.shifts.iter().all(|s| s.sample_count == 0 && s.total_samples == 0));
    }

    #[tokio::test]
    async fn test_compare_window_uses_intersection() {
        let repo = Arc::new(MemorySummaryRepo::default());
        // 窗口起点 3/10 06:30 落在 3/10 早班内: 该早班参与
        repo.insert(shift_summary(d(10), ShiftType::Morning, Some(1400), 5));
        // 3/09 夜班在 06:00 结束，不相交
        repo.insert(shift_summary(d(9), ShiftType::Night, Some(500), 5));
        repo.insert(shift_summary(d(10), ShiftType::Afternoon, Some(1000), 5));

        let comparator = ShiftComparator::new(repo.clone());
        let result = comparator
            .compare_shifts_at(1, 1, dt(2024, 3, 11, 6, 30))
            .await
            .unwrap();

        assert_eq!(result.shifts[0].sample_count, 1);
        assert_eq!(result.shifts[2].sample_count, 0);
        assert_eq!(result.best_shift, Some(ShiftType::Morning));
        assert_eq!(result.worst_shift, Some(ShiftType::Afternoon));
    }

    #[tokio::test]
    async fn test_shift_summaries_for_day_includes_night() {
        let repo = Arc::new(MemorySummaryRepo::default());
        for shift in ShiftType::ALL {
            repo.insert(shift_summary(d(10), shift, Some(1200), 5));
        }
        repo.insert(shift_summary(d(9), ShiftType::Night, Some(1200), 5));

        let rows = ShiftComparator::new(repo)
            .shift_summaries_for_day(1, d(10))
            .await
            .unwrap();
        let starts: Vec<u32> = rows.iter().map(|s| s.period_start.hour()).collect();
        assert_eq!(starts, vec![6, 14, 22]);
    }

    #[tokio::test]
    async fn test_huge_day_span_clamps_instead_of_overflowing() {
        let repo = Arc::new(MemorySummaryRepo::default());
        repo.insert(shift_summary(d(1), ShiftType::Morning, Some(1300), 5));
        repo.insert(shift_summary(d(10), ShiftType::Night, Some(900), 5));

        let result = ShiftComparator::new(repo)
            .compare_shifts_at(1, 100_000_000, dt(2024, 3, 12, 12, 0))
            .await
            .unwrap();

        assert_eq!(result.period_days, 100_000_000);
        assert_eq!(result.shifts[0].sample_count, 1);
        assert_eq!(result.shifts[2].sample_count, 1);
        assert_eq!(result.best_shift, Some(ShiftType::Morning));

        let result = ShiftComparator::new(Arc::new(MemorySummaryRepo::default()))
            .compare_shifts_at(1, i64::MAX, dt(2024, 3, 12, 12, 0))
            .await
            .unwrap();
        assert!(result.best_shift.is_none());
    }
}
