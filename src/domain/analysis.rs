// ==========================================
// SPC 汇总引擎 - 分析记录领域模型
// ==========================================
// 来源: 上游 analyze 例程，每完成一批抽样写入一条
// 红线: 只读，本引擎从不修改
// ==========================================

use crate::domain::scaled::Scaled;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AnalysisRecord - 子组分析记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub mapping_id: Option<i64>,     // 数据源映射
    pub created_at: NaiveDateTime,   // 分析完成时间（工厂本地时间）
    pub sample_count: i64,           // 本子组样本数 (>= 0)

    // ===== 缩放值 (×10000) =====
    pub mean: Option<Scaled>,
    pub std_dev: Option<Scaled>,
    pub ucl: Option<Scaled>,
    pub lcl: Option<Scaled>,

    // ===== 缩放值 (×1000) =====
    pub cp: Option<Scaled>,
    pub cpk: Option<Scaled>,

    pub alert_triggered: bool,       // 上游判定 Cpk 越过告警阈值
}

impl AnalysisRecord {
    /// 子组均值是否落在自身控制限之外
    ///
    /// 三个值任一缺失时不判定为失控。
    pub fn is_out_of_control(&self) -> bool {
        match (self.mean, self.ucl, self.lcl) {
            (Some(mean), Some(ucl), Some(lcl)) => mean > ucl || mean < lcl,
            _ => false,
        }
    }
}
