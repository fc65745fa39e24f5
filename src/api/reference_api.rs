// ==========================================
// 兽药休药期监测系统 - 参考数据查询 API
// ==========================================
// 职责: 按物种查询可用药物、按药物+物种查询限量
// 红线: 参考数据只读
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::reference::ReferenceLimit;
use crate::repository::ReferenceLimitRepository;

/// 药物在某物种下的限量汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeLimits {
    pub molecule: String,
    pub species_code: String,
    pub limits: Vec<ReferenceLimit>,
    /// 所有组织中最长的休药期，无记录时为 0
    pub withdrawal_days: i32,
}

// ==========================================
// ReferenceApi - 参考数据查询 API
// ==========================================
pub struct ReferenceApi {
    reference_repo: Arc<ReferenceLimitRepository>,
}

impl ReferenceApi {
    pub fn new(reference_repo: Arc<ReferenceLimitRepository>) -> Self {
        Self { reference_repo }
    }

    /// 查询适用于某物种的药物（按名称排序）
    ///
    /// # 返回
    /// - Err(InvalidInput): 物种代码为空
    /// - Err(NotFound): 物种代码未登记
    pub fn molecules_for_species(&self, species_code: &str) -> ApiResult<Vec<String>> {
        let code = species_code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("物种代码不能为空".to_string()));
        }
        if !self.reference_repo.species_exists(code)? {
            return Err(ApiError::NotFound(format!("SpeciesGroup(code={})不存在", code)));
        }
        Ok(self.reference_repo.molecules_for_species(code)?)
    }

    /// 查询药物在某物种下各组织的限量
    pub fn limits_for(&self, molecule: &str, species_code: &str) -> ApiResult<MoleculeLimits> {
        let molecule = molecule.trim();
        let species_code = species_code.trim();
        if molecule.is_empty() || species_code.is_empty() {
            return Err(ApiError::InvalidInput("药物名称和物种代码不能为空".to_string()));
        }

        let limits = self.reference_repo.find_limits(molecule, species_code)?;
        let withdrawal_days = limits
            .iter()
            .filter_map(|l| l.withdrawal_days)
            .max()
            .unwrap_or(0);

        Ok(MoleculeLimits {
            molecule: molecule.to_string(),
            species_code: species_code.to_string(),
            limits,
            withdrawal_days,
        })
    }
}
