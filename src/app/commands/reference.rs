use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 参考数据查询命令
// ==========================================

/// 某物种可用药物
pub fn list_species_molecules(state: &AppState, species_code: &str) -> Result<String, String> {
    let result = state
        .reference_api
        .molecules_for_species(species_code)
        .map_err(map_api_error)?;
    to_json(&result)
}

/// 药物在某物种下的限量
pub fn get_molecule_limits(state: &AppState, molecule: &str, species_code: &str) -> Result<String, String> {
    let result = state
        .reference_api
        .limits_for(molecule, species_code)
        .map_err(map_api_error)?;
    to_json(&result)
}
