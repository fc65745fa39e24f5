use crate::api::error::ApiError;
use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 审计日志查询命令
// ==========================================

/// 单条用药记录的操作轨迹（按时间升序）
pub fn list_treatment_actions(state: &AppState, treatment_id: i64) -> Result<String, String> {
    let logs = state
        .action_log_repo
        .find_by_treatment(treatment_id)
        .map_err(|e| map_api_error(ApiError::from(e)))?;
    to_json(&logs)
}

/// 最近的操作日志
pub fn get_recent_actions(state: &AppState, limit: i64) -> Result<String, String> {
    if limit <= 0 {
        return Err(map_api_error(ApiError::InvalidInput(format!(
            "limit 必须为正数: {}",
            limit
        ))));
    }
    let logs = state
        .action_log_repo
        .find_recent(limit)
        .map_err(|e| map_api_error(ApiError::from(e)))?;
    to_json(&logs)
}
