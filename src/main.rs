// ==========================================
// 兽药休药期监测系统 - 命令行入口
// ==========================================
// 用法:
//   amu-monitoring farm <farm_id> [YYYY-MM-DD]
//   amu-monitoring flock <flock_id> [YYYY-MM-DD]
//   amu-monitoring dashboard <vet_id>
//   amu-monitoring treatments <farm_id>
//   amu-monitoring actions <treatment_id>
//   amu-monitoring recent [limit]
//   amu-monitoring config
// 输出: 命令层 JSON（成功写 stdout，失败写 stderr）
// ==========================================

use std::process::ExitCode;

use amu_monitoring::app::{commands, get_default_db_path, AppState};

fn main() -> ExitCode {
    // 初始化日志系统
    amu_monitoring::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", amu_monitoring::APP_NAME);
    tracing::info!("系统版本: {}", amu_monitoring::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("无法初始化AppState: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&state, &args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(output) => {
            eprintln!("{}", output);
            ExitCode::FAILURE
        }
    }
}

fn run(state: &AppState, args: &[String]) -> Result<String, String> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    let as_of = args.get(2).map(String::as_str);

    match command {
        "farm" => commands::get_farm_detail(state, parse_id(args)?, as_of),
        "flock" => commands::get_flock_detail(state, parse_id(args)?, as_of),
        "dashboard" => commands::get_vet_dashboard(state, parse_id(args)?),
        "treatments" => commands::list_farm_treatments(state, parse_id(args)?),
        "actions" => commands::list_treatment_actions(state, parse_id(args)?),
        "recent" => {
            let limit = args.get(1).and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(20);
            commands::get_recent_actions(state, limit)
        }
        "config" => commands::get_config_snapshot(state),
        _ => Err(usage()),
    }
}

fn parse_id(args: &[String]) -> Result<i64, String> {
    args.get(1)
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(usage)
}

fn usage() -> String {
    [
        "用法:",
        "  amu-monitoring farm <farm_id> [YYYY-MM-DD]",
        "  amu-monitoring flock <flock_id> [YYYY-MM-DD]",
        "  amu-monitoring dashboard <vet_id>",
        "  amu-monitoring treatments <farm_id>",
        "  amu-monitoring actions <treatment_id>",
        "  amu-monitoring recent [limit]",
        "  amu-monitoring config",
    ]
    .join("\n")
}
