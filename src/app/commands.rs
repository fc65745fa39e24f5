// ==========================================
// 兽药休药期监测系统 - 命令层（按域拆分）
// ==========================================
// 职责: 请求边界，参数解析 + API 调用 + 结构化错误响应
// 约定: 成功返回 JSON 字符串，失败返回 ErrorResponse 的 JSON 字符串
// ==========================================

mod audit;
mod common;
mod config;
mod dashboard;
mod flock;
mod reference;
mod treatment;

pub use audit::*;
pub use common::ErrorResponse;
pub use config::*;
pub use dashboard::*;
pub use flock::*;
pub use reference::*;
pub use treatment::*;
