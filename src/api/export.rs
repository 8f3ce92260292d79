// ==========================================
// SPC 汇总引擎 - 汇总导出
// ==========================================
// 格式: CSV，一行一个汇总，数值保持存储时的缩放表示
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::format_timestamp;
use crate::domain::summary::SummaryStat;
use serde::Serialize;
use std::io::Write;

/// CSV 导出行（判异规则展开为 8 列）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryExportRow {
    pub plan_id: i64,
    pub production_line_id: i64,
    pub mapping_id: Option<i64>,
    pub period_type: String,
    pub period_start: String,
    pub period_end: String,
    pub sample_count: i64,
    pub subgroup_count: i64,
    pub mean: Option<i64>,
    pub std_dev: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub range_value: Option<i64>,
    pub cp: Option<i64>,
    pub cpk: Option<i64>,
    pub out_of_spec_count: i64,
    pub out_of_control_count: i64,
    pub rule1_violations: i64,
    pub rule2_violations: i64,
    pub rule3_violations: i64,
    pub rule4_violations: i64,
    pub rule5_violations: i64,
    pub rule6_violations: i64,
    pub rule7_violations: i64,
    pub rule8_violations: i64,
    pub overall_status: String,
}

impl From<&SummaryStat> for SummaryExportRow {
    fn from(s: &SummaryStat) -> Self {
        let [r1, r2, r3, r4, r5, r6, r7, r8] = s.rule_violations;
        Self {
            plan_id: s.plan_id,
            production_line_id: s.production_line_id,
            mapping_id: s.mapping_id,
            period_type: s.period_type.as_str().to_string(),
            period_start: format_timestamp(s.period_start),
            period_end: format_timestamp(s.period_end),
            sample_count: s.sample_count,
            subgroup_count: s.subgroup_count,
            mean: s.mean.map(|v| v.raw()),
            std_dev: s.std_dev.map(|v| v.raw()),
            min_value: s.min.map(|v| v.raw()),
            max_value: s.max.map(|v| v.raw()),
            range_value: s.range.map(|v| v.raw()),
            cp: s.cp.map(|v| v.raw()),
            cpk: s.cpk.map(|v| v.raw()),
            out_of_spec_count: s.out_of_spec_count,
            out_of_control_count: s.out_of_control_count,
            rule1_violations: r1,
            rule2_violations: r2,
            rule3_violations: r3,
            rule4_violations: r4,
            rule5_violations: r5,
            rule6_violations: r6,
            rule7_violations: r7,
            rule8_violations: r8,
            overall_status: s.overall_status.as_str().to_string(),
        }
    }
}

/// 写出 CSV（含表头），返回数据行数
///
/// 空列表时只写表头。
pub fn export_summaries_csv<W: Write>(rows: &[SummaryStat], writer: W) -> ApiResult<usize> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(EXPORT_HEADERS)?;
    for row in rows {
        wtr.serialize(SummaryExportRow::from(row))?;
    }
    wtr.flush()
        .map_err(|e| ApiError::ExportError(e.to_string()))?;
    Ok(rows.len())
}

const EXPORT_HEADERS: [&str; 26] = [
    "plan_id",
    "production_line_id",
    "mapping_id",
    "period_type",
    "period_start",
    "period_end",
    "sample_count",
    "subgroup_count",
    "mean",
    "std_dev",
    "min_value",
    "max_value",
    "range_value",
    "cp",
    "cpk",
    "out_of_spec_count",
    "out_of_control_count",
    "rule1_violations",
    "rule2_violations",
    "rule3_violations",
    "rule4_violations",
    "rule5_violations",
    "rule6_violations",
    "rule7_violations",
    "rule8_violations",
    "overall_status",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scaled::Scaled;
    use crate::domain::summary::RUN_RULE_COUNT;
    use crate::domain::types::{OverallStatus, PeriodType};
    use chrono::NaiveDate;

    fn summary() -> SummaryStat {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        SummaryStat {
            plan_id: 1,
            period_type: PeriodType::Shift,
            period_start: start,
            period_end: start + chrono::Duration::hours(8),
            production_line_id: 7,
            mapping_id: None,
            sample_count: 15,
            subgroup_count: 3,
            mean: Some(Scaled::from_raw(100_000)),
            std_dev: Some(Scaled::from_raw(2_000)),
            min: None,
            max: None,
            range: None,
            cp: Some(Scaled::from_raw(1267)),
            cpk: Some(Scaled::from_raw(1167)),
            out_of_spec_count: 1,
            out_of_control_count: 0,
            rule_violations: [0; RUN_RULE_COUNT],
            overall_status: OverallStatus::Acceptable,
        }
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let mut buf = Vec::new();
        let written = export_summaries_csv(&[summary()], &mut buf).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("plan_id,production_line_id,mapping_id,period_type"));
        assert_eq!(lines[0].split(',').count(), 26);
        assert_eq!(
            lines[1],
            "1,7,,shift,2024-03-10 06:00:00.000,2024-03-10 14:00:00.000,15,3,100000,2000,,,,1267,1167,1,0,0,0,0,0,0,0,0,0,acceptable"
        );
    }

    #[test]
    fn test_export_empty_writes_header_only() {
        let mut buf = Vec::new();
        assert_eq!(export_summaries_csv(&[], &mut buf).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }
}
