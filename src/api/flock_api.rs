// ==========================================
// 兽药休药期监测系统 - 畜群 API
// ==========================================
// 职责: 畜群/养殖场详情 (含休药期结论)、批量登记畜群
// 红线: 休药期结论读时计算，不落库
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{actor_for, ActionLog, ActionType};
use crate::domain::farm::{animal_tag, birth_date_from_age, flock_tag, Farm, Flock, MAX_AGE_IN_WEEKS};
use crate::domain::reference::ReferenceCatalog;
use crate::domain::treatment::WithdrawalVerdict;
use crate::engine::{merge_verdicts, WithdrawalEvaluator};
use crate::repository::{
    ActionLogRepository, FarmRepository, ReferenceLimitRepository, TreatmentRepository,
};

// ==========================================
// DTO
// ==========================================

/// 畜群详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockDetail {
    #[serde(flatten)]
    pub flock: Flock,
    pub age_in_weeks: Option<i64>,
    /// ISO 日期 (YYYY-MM-DD)，无约束时为 null
    pub safe_harvest_date: Option<String>,
    pub is_under_withdrawal: bool,
    pub approved_treatment_count: usize,
}

/// 养殖场详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmDetail {
    #[serde(flatten)]
    pub farm: Farm,
    pub flocks: Vec<FlockDetail>,
    pub safe_harvest_date: Option<String>,
    pub is_under_withdrawal: bool,
}

/// 批量登记畜群
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFlockRequest {
    pub farm_id: i64,
    pub flock_code: String,
    pub count: i64,
    #[serde(default)]
    pub species_code: Option<String>,
    /// 登记时周龄，用于反推出生日期
    #[serde(default)]
    pub age_in_weeks: Option<i64>,
    #[serde(default)]
    pub avg_weight_kg: Option<f64>,
    #[serde(default)]
    pub avg_feed_kg_per_day: Option<f64>,
    #[serde(default)]
    pub avg_water_l_per_day: Option<f64>,
    #[serde(default)]
    pub recorded_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkFlockResponse {
    pub flock_id: i64,
    pub flock_tag: String,
    pub animals_created: usize,
    pub first_animal_tag: String,
    pub last_animal_tag: String,
    pub farm_total_animals: i64,
}

// ==========================================
// FlockApi - 畜群 API
// ==========================================
pub struct FlockApi {
    farm_repo: Arc<FarmRepository>,
    treatment_repo: Arc<TreatmentRepository>,
    reference_repo: Arc<ReferenceLimitRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    evaluator: WithdrawalEvaluator,
}

impl FlockApi {
    pub fn new(
        farm_repo: Arc<FarmRepository>,
        treatment_repo: Arc<TreatmentRepository>,
        reference_repo: Arc<ReferenceLimitRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            farm_repo,
            treatment_repo,
            reference_repo,
            action_log_repo,
            config_manager,
            evaluator: WithdrawalEvaluator::new(),
        }
    }

    // ==========================================
    // 详情
    // ==========================================

    /// 畜群详情（以本地当天为 today）
    pub fn get_flock_detail(&self, flock_id: i64) -> ApiResult<FlockDetail> {
        self.get_flock_detail_at(flock_id, today())
    }

    /// 畜群详情（指定 today）
    #[instrument(skip(self))]
    pub fn get_flock_detail_at(&self, flock_id: i64, today: NaiveDate) -> ApiResult<FlockDetail> {
        let flock = self
            .farm_repo
            .find_flock(flock_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Flock(id={})不存在", flock_id)))?;
        self.evaluate_flock(flock, today).map(|(detail, _)| detail)
    }

    /// 养殖场详情（以本地当天为 today）
    pub fn get_farm_detail(&self, farm_id: i64) -> ApiResult<FarmDetail> {
        self.get_farm_detail_at(farm_id, today())
    }

    /// 养殖场详情（指定 today）
    ///
    /// 任一畜群在休药期 → 养殖场在休药期；安全日期取最晚的畜群安全日期。
    #[instrument(skip(self))]
    pub fn get_farm_detail_at(&self, farm_id: i64, today: NaiveDate) -> ApiResult<FarmDetail> {
        let farm = self
            .farm_repo
            .find_farm(farm_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Farm(id={})不存在", farm_id)))?;

        let mut flocks = Vec::new();
        let mut verdicts = Vec::new();
        for flock in self.farm_repo.list_flocks_by_farm(farm_id)? {
            let (detail, verdict) = self.evaluate_flock(flock, today)?;
            flocks.push(detail);
            verdicts.push(verdict);
        }

        let merged = merge_verdicts(&verdicts);
        Ok(FarmDetail {
            farm,
            flocks,
            safe_harvest_date: merged.safe_harvest_date.map(format_iso),
            is_under_withdrawal: merged.is_under_withdrawal,
        })
    }

    /// 计算畜群休药期结论
    pub fn evaluate_withdrawal(&self, flock: &Flock, today: NaiveDate) -> ApiResult<WithdrawalVerdict> {
        self.verdict_with_count(flock, today).map(|(verdict, _)| verdict)
    }

    fn verdict_with_count(&self, flock: &Flock, today: NaiveDate) -> ApiResult<(WithdrawalVerdict, usize)> {
        let treatments = self.treatment_repo.find_approved_by_flock(flock.id)?;
        let catalog = match flock.species_code.as_deref().map(str::trim) {
            Some(species) if !species.is_empty() => {
                let mut molecules: Vec<String> =
                    treatments.iter().map(|t| t.antibiotic_name.clone()).collect();
                molecules.sort();
                molecules.dedup();
                self.reference_repo.load_catalog(species, &molecules)?
            }
            _ => ReferenceCatalog::new(),
        };
        let verdict = self.evaluator.evaluate(flock, &treatments, &catalog, today);
        Ok((verdict, treatments.len()))
    }

    fn evaluate_flock(&self, flock: Flock, today: NaiveDate) -> ApiResult<(FlockDetail, WithdrawalVerdict)> {
        let (verdict, approved_treatment_count) = self.verdict_with_count(&flock, today)?;
        let detail = FlockDetail {
            age_in_weeks: flock.age_in_weeks(today),
            safe_harvest_date: verdict.safe_harvest_date.map(format_iso),
            is_under_withdrawal: verdict.is_under_withdrawal,
            approved_treatment_count,
            flock,
        };
        Ok((detail, verdict))
    }

    // ==========================================
    // 批量登记
    // ==========================================

    /// 批量登记畜群（以本地当天反推出生日期）
    pub fn register_flock(&self, request: BulkFlockRequest) -> ApiResult<BulkFlockResponse> {
        self.register_flock_at(request, today())
    }

    /// 批量登记畜群
    ///
    /// # 规则
    /// - count ∈ [1, flock_bulk_max_count]
    /// - age_in_weeks ∈ [0, MAX_AGE_IN_WEEKS]
    /// - flock_code 非空，且在养殖场内唯一
    /// - 畜群标签 {farm_number}-{flock_code}，个体标签 {farm_number}-{flock_code}-{serial:03}
    /// - 养殖场 total_animals 增加 count
    #[instrument(skip(self, request), fields(farm_id = request.farm_id, count = request.count))]
    pub fn register_flock_at(&self, request: BulkFlockRequest, today: NaiveDate) -> ApiResult<BulkFlockResponse> {
        let max_count = self
            .config_manager
            .get_flock_bulk_max_count()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        if request.count < 1 || request.count > max_count {
            return Err(ApiError::InvalidInput(format!(
                "个体数量必须在 1 到 {} 之间，实际为 {}",
                max_count, request.count
            )));
        }

        let flock_code = request.flock_code.trim();
        if flock_code.is_empty() {
            return Err(ApiError::InvalidInput("畜群编号不能为空".to_string()));
        }

        let date_of_birth = match request.age_in_weeks {
            Some(weeks) => Some(birth_date_from_age(weeks, today).ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "周龄必须在 0 到 {} 之间，实际为 {}",
                    MAX_AGE_IN_WEEKS, weeks
                ))
            })?),
            None => None,
        };

        let farm = self
            .farm_repo
            .find_farm(request.farm_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Farm(id={})不存在", request.farm_id)))?;

        if self.farm_repo.flock_code_exists(farm.id, flock_code)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "养殖场{}已存在畜群编号 {}",
                farm.farm_number, flock_code
            )));
        }

        let flock = Flock {
            id: 0,
            farm_id: farm.id,
            flock_code: flock_code.to_string(),
            flock_tag: flock_tag(&farm.farm_number, flock_code),
            species_code: request
                .species_code
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            size: request.count,
            date_of_birth,
            avg_weight_kg: request.avg_weight_kg,
            avg_feed_kg_per_day: request.avg_feed_kg_per_day,
            avg_water_l_per_day: request.avg_water_l_per_day,
        };

        let tags: Vec<String> = (1..=request.count)
            .map(|serial| animal_tag(&farm.farm_number, flock_code, serial))
            .collect();

        let (flock_id, animals_created) = self.farm_repo.register_flock_with_animals(&flock, &tags)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::RegisterFlock,
            actor_for(request.recorded_by),
            None,
            Some(json!({
                "farm_id": farm.id,
                "flock_id": flock_id,
                "flock_tag": flock.flock_tag,
                "count": animals_created,
            })),
            format!("登记畜群 {}，个体 {} 头/只", flock.flock_tag, animals_created),
        ))?;

        info!(flock_id, flock_tag = %flock.flock_tag, animals_created, "畜群登记完成");

        let farm_total_animals = self
            .farm_repo
            .find_farm(farm.id)?
            .map(|f| f.total_animals)
            .unwrap_or(farm.total_animals + animals_created as i64);
        let first_animal_tag = tags.first().cloned().unwrap_or_default();
        let last_animal_tag = tags.last().cloned().unwrap_or_default();
        Ok(BulkFlockResponse {
            flock_id,
            flock_tag: flock.flock_tag,
            animals_created,
            first_animal_tag,
            last_animal_tag,
            farm_total_animals,
        })
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
