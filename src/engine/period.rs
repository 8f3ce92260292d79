// ==========================================
// SPC 汇总引擎 - 周期解析器 (Period Resolver)
// ==========================================
// 职责: 把参考时刻 + 周期类型映射为时间窗口
// 红线: 纯函数，无 I/O；时间均为工厂本地时间
// ==========================================
// 边界约定:
// - 班次窗口为半开区间 [start, end)
// - 日/周/月窗口沿用 23:59:59.999 的闭区间结束
// ==========================================

use crate::domain::types::{PeriodType, ShiftType};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

// ==========================================
// PeriodWindow - 时间窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// end 是否包含在窗口内
    pub end_inclusive: bool,
}

impl PeriodWindow {
    /// 半开窗口 [start, end)
    pub fn half_open(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            end_inclusive: false,
        }
    }

    /// 闭窗口 [start, end]
    pub fn inclusive(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            end_inclusive: true,
        }
    }

    /// 按周期类型的边界约定构造窗口
    pub fn for_period(period_type: PeriodType, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        match period_type {
            PeriodType::Shift => Self::half_open(start, end),
            PeriodType::Day | PeriodType::Week | PeriodType::Month => Self::inclusive(start, end),
        }
    }

    /// 第一个不属于窗口的时刻
    pub fn end_exclusive(&self) -> NaiveDateTime {
        if self.end_inclusive {
            self.end + Duration::milliseconds(1)
        } else {
            self.end
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end_exclusive()
    }

    /// 是否与闭区间 [from, to] 相交
    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start <= to && self.end_exclusive() > from
    }
}

// ==========================================
// 日历辅助
// ==========================================

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    start_of_day(date) + Duration::hours(hour as i64)
}

/// 当月第一天
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// 下个月第一天（超出 chrono 可表示范围时为 None）
pub fn first_day_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date).checked_add_months(Months::new(1))
}

// ==========================================
// 班次
// ==========================================

/// 按小时判定班次
///
/// 边界小时属于后一个班次: 14 点为中班，22 点为夜班。
pub fn shift_of_hour(hour: u32) -> ShiftType {
    match hour {
        6..=13 => ShiftType::Morning,
        14..=21 => ShiftType::Afternoon,
        _ => ShiftType::Night,
    }
}

/// 指定日期的班次窗口
///
/// 夜班从当日 22:00 开始，到次日 06:00 结束。
pub fn shift_window(date: NaiveDate, shift: ShiftType) -> PeriodWindow {
    let start = at_hour(date, shift.start_hour());
    let end_date = if shift.wraps_midnight() {
        date + Duration::days(1)
    } else {
        date
    };
    PeriodWindow::half_open(start, at_hour(end_date, shift.end_hour()))
}

/// 包含指定时刻的班次窗口
///
/// 00:00 ~ 06:00 属于前一天 22:00 开始的夜班。
pub fn containing_shift_window(instant: NaiveDateTime) -> PeriodWindow {
    let shift = shift_of_hour(instant.hour());
    let date = instant.date();
    if shift == ShiftType::Night && instant.hour() < ShiftType::Night.end_hour() {
        shift_window(date - Duration::days(1), ShiftType::Night)
    } else {
        shift_window(date, shift)
    }
}

/// 一天内的三个班次窗口（早 → 中 → 夜）
pub fn shift_windows_for_day(date: NaiveDate) -> [PeriodWindow; 3] {
    ShiftType::ALL.map(|shift| shift_window(date, shift))
}

// ==========================================
// 日 / 周 / 月
// ==========================================

/// 日窗口 [00:00:00.000, 23:59:59.999]
pub fn day_window(date: NaiveDate) -> PeriodWindow {
    PeriodWindow::inclusive(start_of_day(date), end_of_day(date))
}

/// 周窗口: 周一 00:00 到周日 23:59:59.999
pub fn week_window(date: NaiveDate) -> PeriodWindow {
    // 0 = 周日 .. 6 = 周六
    let day_of_week = date.weekday().num_days_from_sunday() as i64;
    let offset = if day_of_week == 0 { -6 } else { 1 - day_of_week };
    let monday = date + Duration::days(offset);
    PeriodWindow::inclusive(start_of_day(monday), end_of_day(monday + Duration::days(6)))
}

/// 月窗口: 当月 1 日 00:00 到月末 23:59:59.999
pub fn month_window(date: NaiveDate) -> PeriodWindow {
    let first = first_day_of_month(date);
    let last = first_day_of_next_month(date)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    PeriodWindow::inclusive(start_of_day(first), end_of_day(last))
}

// ==========================================
// 按周期类型分派
// ==========================================

/// 以参考时刻所在日期解析窗口
///
/// 班次取参考时刻小时对应的班次，并以参考时刻的日期为起点。
/// 对 00:00 ~ 06:00 的时刻，得到的是当晚 22:00 开始的夜班；
/// 需要“包含该时刻”的窗口时使用 [`current_window`]。
pub fn window_for(period_type: PeriodType, at: NaiveDateTime) -> PeriodWindow {
    match period_type {
        PeriodType::Shift => shift_window(at.date(), shift_of_hour(at.hour())),
        PeriodType::Day => day_window(at.date()),
        PeriodType::Week => week_window(at.date()),
        PeriodType::Month => month_window(at.date()),
    }
}

/// 包含指定时刻的窗口
pub fn current_window(period_type: PeriodType, now: NaiveDateTime) -> PeriodWindow {
    match period_type {
        PeriodType::Shift => containing_shift_window(now),
        _ => window_for(period_type, now),
    }
}

/// 紧邻当前窗口之前、已经结束的窗口
pub fn previous_window(period_type: PeriodType, now: NaiveDateTime) -> PeriodWindow {
    let current = current_window(period_type, now);
    match period_type {
        PeriodType::Shift => containing_shift_window(current.start - Duration::milliseconds(1)),
        PeriodType::Day => day_window(now.date() - Duration::days(1)),
        PeriodType::Week => week_window(current.start.date() - Duration::days(7)),
        PeriodType::Month => month_window(current.start.date() - Duration::days(1)),
    }
}

/// 与日期闭区间 [from, to] 相交的全部窗口，按开始时间升序
///
/// 首尾的不完整周期同样返回；from > to 时为空。
/// 班次从 from 前一天的夜班开始检查，该夜班覆盖 from 当天 00:00 ~ 06:00。
pub fn windows_overlapping(period_type: PeriodType, from: NaiveDate, to: NaiveDate) -> Vec<PeriodWindow> {
    if from > to {
        return Vec::new();
    }

    let range_start = start_of_day(from);
    let range_end = end_of_day(to);
    let mut windows = Vec::new();

    match period_type {
        PeriodType::Shift => {
            let mut day = from - Duration::days(1);
            while day <= to {
                windows.extend(
                    shift_windows_for_day(day)
                        .into_iter()
                        .filter(|w| w.overlaps(range_start, range_end)),
                );
                day += Duration::days(1);
            }
        }
        PeriodType::Day => {
            let mut day = from;
            while day <= to {
                windows.push(day_window(day));
                day += Duration::days(1);
            }
        }
        PeriodType::Week => {
            let mut window = week_window(from);
            while window.start <= range_end {
                windows.push(window);
                window = week_window(window.start.date() + Duration::days(7));
            }
        }
        PeriodType::Month => {
            // 按每月 1 日步进，避免月末日期在短月上溢出
            let mut window = month_window(from);
            while window.start <= range_end {
                windows.push(window);
                window = match first_day_of_next_month(window.start.date()) {
                    Some(next) => month_window(next),
                    None => break,
                };
            }
        }
    }

    windows
}
