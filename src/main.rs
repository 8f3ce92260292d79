// ==========================================
// SPC 汇总引擎 - 命令行入口
// ==========================================
// 用法:
//   spc-aggregator <command> [args...]
//
// 数据库路径取自 SPC_AGGREGATOR_DB_PATH，未设置时使用用户数据目录。
// 结果以 JSON 输出到 stdout，日志输出到 stderr。
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use serde_json::json;
use spc_aggregator::app::{get_default_db_path, AppState};
use spc_aggregator::engine::period::day_window;
use spc_aggregator::PeriodType;
use std::fs::File;
use std::io::BufWriter;

const USAGE: &str = "\
用法: spc-aggregator <command> [args...]

命令:
  init-db                                  建表（幂等）
  aggregate <period>                       按当前时刻汇总全部 active 计划 (shift|day|week|month)
  close-out                                汇总刚结束的班次/日（周一加上周，1 日加上月）
  backfill <plan_id> <period> <start> <end>  回填历史窗口，日期格式 YYYY-MM-DD
  compare <plan_id> [days]                 班次对比，默认天数取配置
  day <plan_id> <date>                     某天的三个班次汇总
  export <period> <start> <end> <out.csv>  导出时间范围内的汇总
  config [<key> <value>]                   查看或写入全局配置
";

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("日期格式错误 (应为 YYYY-MM-DD): {}", raw))
}

fn parse_period(raw: &str) -> anyhow::Result<PeriodType> {
    raw.parse::<PeriodType>().map_err(|e| anyhow!(e))
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("计划ID必须为整数: {}", raw))
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(idx)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("缺少参数 <{}>\n\n{}", name, USAGE))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spc_aggregator::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(c) => c.as_str(),
        None => {
            eprintln!("{}", USAGE);
            bail!("缺少命令");
        }
    };

    let db_path = get_default_db_path();
    tracing::info!(version = spc_aggregator::VERSION, db_path = %db_path, command, "{}", spc_aggregator::APP_NAME);
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    match command {
        "init-db" => print_json(&json!({ "db_path": db_path, "initialized": true }))?,

        "aggregate" => {
            let period_type = parse_period(arg(&args, 1, "period")?)?;
            let success = state.engine.aggregate_all_active_plans(period_type).await?;
            print_json(&json!({ "period_type": period_type, "success": success }))?;
        }

        "close-out" => {
            let now = Local::now().naive_local();
            let success = state.engine.run_scheduled_close_out(now).await?;
            print_json(&json!({ "now": now.to_string(), "success": success }))?;
        }

        "backfill" => {
            let plan_id = parse_id(arg(&args, 1, "plan_id")?)?;
            let period_type = parse_period(arg(&args, 2, "period")?)?;
            let start = parse_date(arg(&args, 3, "start")?)?;
            let end = parse_date(arg(&args, 4, "end")?)?;
            if start > end {
                bail!("开始日期不能晚于结束日期: {} > {}", start, end);
            }
            let success = state
                .engine
                .backfill(plan_id, period_type, start, end)
                .await?;
            print_json(&json!({
                "plan_id": plan_id,
                "period_type": period_type,
                "start": start,
                "end": end,
                "success": success,
            }))?;
        }

        "compare" => {
            let plan_id = parse_id(arg(&args, 1, "plan_id")?)?;
            let days = match args.get(2) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<i64>()
                        .with_context(|| format!("天数必须为整数: {}", raw))?,
                ),
                None => None,
            };
            let comparison = state.summary_api.compare_shifts(plan_id, days).await?;
            print_json(&serde_json::to_value(&comparison)?)?;
        }

        "day" => {
            let plan_id = parse_id(arg(&args, 1, "plan_id")?)?;
            let date = parse_date(arg(&args, 2, "date")?)?;
            let rows = state
                .summary_api
                .get_shift_summary_for_day(plan_id, date)
                .await?;
            print_json(&serde_json::to_value(&rows)?)?;
        }

        "export" => {
            let period_type = parse_period(arg(&args, 1, "period")?)?;
            let start = parse_date(arg(&args, 2, "start")?)?;
            let end = parse_date(arg(&args, 3, "end")?)?;
            let out_path = arg(&args, 4, "out.csv")?;

            let rows = state
                .summary_api
                .get_summary_by_time_range(
                    period_type,
                    day_window(start).start,
                    day_window(end).end,
                    None,
                )
                .await?;
            let file = File::create(out_path)
                .with_context(|| format!("无法创建导出文件: {}", out_path))?;
            let written = state
                .summary_api
                .export_summaries_csv(&rows, BufWriter::new(file))?;
            print_json(&json!({ "path": out_path, "rows": written }))?;
        }

        "config" => {
            if let (Some(key), Some(value)) = (args.get(1), args.get(2)) {
                state.config_manager.set_global_config_value(key, value)?;
            }
            let configs = state.config_manager.list_global_config()?;
            print_json(&serde_json::to_value(&configs)?)?;
        }

        "help" | "-h" | "--help" => println!("{}", USAGE),

        other => {
            eprintln!("{}", USAGE);
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}
