use crate::api::BulkFlockRequest;
use crate::app::state::AppState;

use super::common::{map_api_error, parse_date, parse_request, to_json};

// ==========================================
// 畜群 / 养殖场命令
// ==========================================

/// 畜群详情（含休药期结论）
///
/// as_of 为空时以本地当天计算
pub fn get_flock_detail(state: &AppState, flock_id: i64, as_of: Option<&str>) -> Result<String, String> {
    let result = match as_of {
        Some(date) => state.flock_api.get_flock_detail_at(flock_id, parse_date(date)?),
        None => state.flock_api.get_flock_detail(flock_id),
    }
    .map_err(map_api_error)?;
    to_json(&result)
}

/// 养殖场详情（含各畜群结论）
pub fn get_farm_detail(state: &AppState, farm_id: i64, as_of: Option<&str>) -> Result<String, String> {
    let result = match as_of {
        Some(date) => state.flock_api.get_farm_detail_at(farm_id, parse_date(date)?),
        None => state.flock_api.get_farm_detail(farm_id),
    }
    .map_err(map_api_error)?;
    to_json(&result)
}

/// 批量登记畜群
pub fn register_flock(state: &AppState, request_json: &str) -> Result<String, String> {
    let request: BulkFlockRequest = parse_request(request_json)?;
    let result = state
        .flock_api
        .register_flock(request)
        .map_err(map_api_error)?;
    to_json(&result)
}
