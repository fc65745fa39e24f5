// ==========================================
// 兽药休药期监测系统 - 应用层
// ==========================================
// 职责: 装配仓储/API，提供请求边界命令
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
