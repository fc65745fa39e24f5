use crate::api::error::ApiError;
use crate::app::state::AppState;
use crate::config::config_keys;

use super::common::map_api_error;

// ==========================================
// 配置命令
// ==========================================

/// 获取全部配置快照（含默认值）
pub fn get_config_snapshot(state: &AppState) -> Result<String, String> {
    state
        .config_manager
        .get_config_snapshot()
        .map_err(|e| map_api_error(ApiError::InternalError(e.to_string())))
}

/// 更新配置项（仅允许已知键）
pub fn update_config(state: &AppState, key: &str, value: &str) -> Result<String, String> {
    let key = key.trim();
    if !config_keys::DEFAULTS.iter().any(|(k, _)| *k == key) {
        return Err(map_api_error(ApiError::InvalidInput(format!("未知配置项: {}", key))));
    }

    let value = value.trim();
    let valid = match key {
        config_keys::LIFECYCLE_ALLOW_RETRANSITION => matches!(value, "true" | "false"),
        _ => value.parse::<i64>().map(|v| v >= 0).unwrap_or(false),
    };
    if !valid {
        return Err(map_api_error(ApiError::InvalidInput(format!(
            "配置项 {} 的值无效: {}",
            key, value
        ))));
    }

    state
        .config_manager
        .set_global_config_value(key, value)
        .map_err(|e| map_api_error(ApiError::InternalError(e.to_string())))?;

    Ok("{}".to_string())
}
