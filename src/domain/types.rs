// ==========================================
// SPC 汇总引擎 - 领域类型定义
// ==========================================
// 职责: 汇总周期、班次、能力状态、计划状态
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 汇总周期 (Period Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Shift, // 班次
    Day,   // 日
    Week,  // 周 (周一 ~ 周日)
    Month, // 自然月
}

impl PeriodType {
    /// 全部周期（刷新顺序: 班次 → 日 → 周 → 月）
    pub const ALL: [PeriodType; 4] = [
        PeriodType::Shift,
        PeriodType::Day,
        PeriodType::Week,
        PeriodType::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Shift => "shift",
            PeriodType::Day => "day",
            PeriodType::Week => "week",
            PeriodType::Month => "month",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shift" => Ok(PeriodType::Shift),
            "day" => Ok(PeriodType::Day),
            "week" => Ok(PeriodType::Week),
            "month" => Ok(PeriodType::Month),
            other => Err(format!("未知的汇总周期: {}", other)),
        }
    }
}

// ==========================================
// 班次 (Shift Type)
// ==========================================
// 早班 [6,14) / 中班 [14,22) / 夜班 [22,24) ∪ [0,6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

impl ShiftType {
    /// 班次迭代顺序，亦即并列时的优先顺序
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Afternoon, ShiftType::Night];

    /// 开始小时
    pub fn start_hour(&self) -> u32 {
        match self {
            ShiftType::Morning => 6,
            ShiftType::Afternoon => 14,
            ShiftType::Night => 22,
        }
    }

    /// 结束小时（夜班为次日 6 点）
    pub fn end_hour(&self) -> u32 {
        match self {
            ShiftType::Morning => 14,
            ShiftType::Afternoon => 22,
            ShiftType::Night => 6,
        }
    }

    /// 是否跨越午夜
    pub fn wraps_midnight(&self) -> bool {
        matches!(self, ShiftType::Night)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Afternoon => "afternoon",
            ShiftType::Night => "night",
        }
    }

    /// 显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ShiftType::Morning => "早班",
            ShiftType::Afternoon => "中班",
            ShiftType::Night => "夜班",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 能力状态 (Overall Status)
// ==========================================
// 由未缩放的平均 Cpk 决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Excellent,        // Cpk >= 1.67
    Good,             // 1.33 <= Cpk < 1.67
    Acceptable,       // 1.00 <= Cpk < 1.33
    NeedsImprovement, // 0.67 <= Cpk < 1.00 或 Cpk 缺失
    Critical,         // Cpk < 0.67
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Excellent => "excellent",
            OverallStatus::Good => "good",
            OverallStatus::Acceptable => "acceptable",
            OverallStatus::NeedsImprovement => "needs_improvement",
            OverallStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "excellent" => Ok(OverallStatus::Excellent),
            "good" => Ok(OverallStatus::Good),
            "acceptable" => Ok(OverallStatus::Acceptable),
            "needs_improvement" => Ok(OverallStatus::NeedsImprovement),
            "critical" => Ok(OverallStatus::Critical),
            other => Err(format!("未知的能力状态: {}", other)),
        }
    }
}

// ==========================================
// 抽样计划状态 (Plan Status)
// ==========================================
// 只有 active 参与定时汇总，其余状态原样保留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Other(String),
}

impl PlanStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, PlanStatus::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for PlanStatus {
    fn from(s: &str) -> Self {
        if s.trim() == "active" {
            PlanStatus::Active
        } else {
            PlanStatus::Other(s.trim().to_string())
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
