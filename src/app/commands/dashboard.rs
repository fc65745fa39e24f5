use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 兽医工作台命令
// ==========================================

/// 读取兽医工作台（含一次补位分配）
pub fn get_vet_dashboard(state: &AppState, vet_id: i64) -> Result<String, String> {
    let result = state
        .vet_dashboard_api
        .get_dashboard(vet_id)
        .map_err(map_api_error)?;
    to_json(&result)
}
