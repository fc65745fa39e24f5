use crate::api::{CreateTreatmentRequest, PrescriptionRequest, TreatmentActionRequest};
use crate::app::state::AppState;

use super::common::{map_api_error, parse_request, to_json};

// ==========================================
// 用药记录相关命令
// ==========================================

/// 养殖端登记用药
pub fn create_treatment(state: &AppState, request_json: &str) -> Result<String, String> {
    let request: CreateTreatmentRequest = parse_request(request_json)?;
    let result = state
        .treatment_api
        .create_treatment(request)
        .map_err(map_api_error)?;
    to_json(&result)
}

/// 兽医开方
pub fn prescribe_treatment(state: &AppState, vet_id: i64, request_json: &str) -> Result<String, String> {
    let request: PrescriptionRequest = parse_request(request_json)?;
    let result = state
        .treatment_api
        .prescribe(vet_id, request)
        .map_err(map_api_error)?;
    to_json(&result)
}

/// 审批动作（approve / reject）
pub fn apply_treatment_action(state: &AppState, request_json: &str) -> Result<String, String> {
    let request: TreatmentActionRequest = parse_request(request_json)?;
    let result = state
        .treatment_api
        .apply_action(request)
        .map_err(map_api_error)?;
    to_json(&result)
}

/// 养殖场用药记录
pub fn list_farm_treatments(state: &AppState, farm_id: i64) -> Result<String, String> {
    let result = state
        .treatment_api
        .list_for_farm(farm_id)
        .map_err(map_api_error)?;
    to_json(&result)
}
