// ==========================================
// 兽药休药期监测系统 - 用药记录 API
// ==========================================
// 职责: 用药登记、兽医开方、审批动作、按养殖场查询
// 红线: 写操作必须记录 ActionLog
// ==========================================

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{actor_for, ActionLog, ActionType};
use crate::domain::treatment::{NewTreatment, TreatmentOverrides, TreatmentView};
use crate::domain::types::{TargetLevel, TreatedFor, TreatmentAction, TreatmentReason, TreatmentStatus};
use crate::engine::{TreatmentLifecycle, VetAssignmentPolicy};
use crate::repository::{
    ActionLogRepository, FarmRepository, TreatmentRepository, UserRepository,
};

// ==========================================
// 请求 / 响应 DTO
// ==========================================

/// 养殖端登记用药
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTreatmentRequest {
    pub farm_id: i64,
    #[serde(default)]
    pub flock_id: Option<i64>,
    #[serde(default)]
    pub animal_id: Option<i64>,
    pub antibiotic_name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    pub reason: TreatmentReason,
    pub treated_for: TreatedFor,
    pub date: NaiveDate,
    #[serde(default)]
    pub recorded_by: Option<i64>,
}

/// 兽医开方（直接批准）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRequest {
    pub farm_id: i64,
    #[serde(default)]
    pub flock_id: Option<i64>,
    #[serde(default)]
    pub animal_id: Option<i64>,
    pub antibiotic_name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    pub reason: TreatmentReason,
    pub treated_for: TreatedFor,
    pub date: NaiveDate,
    #[serde(default)]
    pub vet_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTreatmentResponse {
    pub treatment_id: i64,
    pub farm_id: i64,
    pub flock_id: Option<i64>,
    pub animal_id: Option<i64>,
    pub status: TreatmentStatus,
    pub assigned_vet_id: Option<i64>,
}

/// 审批动作请求
///
/// action 为原始令牌（approve / reject），其余覆写字段可选。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentActionRequest {
    pub treatment_id: i64,
    pub action: String,
    #[serde(default)]
    pub vet_id: Option<i64>,
    #[serde(flatten)]
    pub overrides: TreatmentOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentActionResponse {
    pub treatment_id: i64,
    pub action: TreatmentAction,
    pub status: TreatmentStatus,
    pub message: String,
}

/// 列表展示项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentListItem {
    #[serde(flatten)]
    pub view: TreatmentView,
    pub target_level: TargetLevel,
}

impl From<TreatmentView> for TreatmentListItem {
    fn from(view: TreatmentView) -> Self {
        let target_level = view.treatment.target_level();
        Self { view, target_level }
    }
}

/// 用药归属（已校验）
struct TreatmentScope {
    farm_id: i64,
    flock_id: Option<i64>,
    animal_id: Option<i64>,
    farm_district: Option<String>,
}

// ==========================================
// TreatmentApi - 用药记录 API
// ==========================================
pub struct TreatmentApi {
    treatment_repo: Arc<TreatmentRepository>,
    farm_repo: Arc<FarmRepository>,
    user_repo: Arc<UserRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    policy: VetAssignmentPolicy,
}

impl TreatmentApi {
    pub fn new(
        treatment_repo: Arc<TreatmentRepository>,
        farm_repo: Arc<FarmRepository>,
        user_repo: Arc<UserRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            treatment_repo,
            farm_repo,
            user_repo,
            action_log_repo,
            config_manager,
            policy: VetAssignmentPolicy::new(),
        }
    }

    // ==========================================
    // 登记
    // ==========================================

    /// 养殖端登记用药，创建后立即尝试分配兽医
    ///
    /// # 返回
    /// - Ok(CreateTreatmentResponse): status = pending，assigned_vet_id 可能为空（兽医全部满额或分配出错）
    /// - Err(NotFound): 养殖场/畜群/个体/录入人不存在
    /// - Err(InvalidInput): 药物名称为空、给药日期越界、个体缺少畜群、归属不一致
    #[instrument(skip(self, request), fields(farm_id = request.farm_id))]
    pub fn create_treatment(&self, request: CreateTreatmentRequest) -> ApiResult<CreateTreatmentResponse> {
        let antibiotic_name = require_antibiotic(&request.antibiotic_name)?;
        require_plausible_date(request.date)?;
        let scope = self.resolve_scope(request.farm_id, request.flock_id, request.animal_id)?;

        if let Some(user_id) = request.recorded_by {
            if !self.user_repo.user_exists(user_id)? {
                return Err(ApiError::NotFound(format!("User(id={})不存在", user_id)));
            }
        }

        let new_treatment = NewTreatment {
            farm_id: scope.farm_id,
            flock_id: scope.flock_id,
            animal_id: scope.animal_id,
            antibiotic_name,
            dosage: normalize(request.dosage),
            method: normalize(request.method),
            reason: request.reason,
            treated_for: request.treated_for,
            date: request.date,
            status: TreatmentStatus::Pending,
            assigned_vet_id: None,
            recorded_by: request.recorded_by,
            vet_notes: None,
        };
        let treatment_id = self.treatment_repo.insert(&new_treatment)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::CreateTreatment,
            actor_for(request.recorded_by),
            Some(treatment_id),
            Some(json!({
                "antibiotic_name": new_treatment.antibiotic_name,
                "flock_id": new_treatment.flock_id,
                "animal_id": new_treatment.animal_id,
                "date": new_treatment.date,
            })),
            format!("登记用药 {}", new_treatment.antibiotic_name),
        ))?;

        // 分配失败不影响已落库的记录，留待工作台补位
        let assigned_vet_id = match self.assign_on_create(treatment_id, scope.farm_district.as_deref()) {
            Ok(vet_id) => vet_id,
            Err(e) => {
                warn!(treatment_id, error = %e, "创建时分配兽医出错，以库中归属为准");
                self.treatment_repo
                    .find_by_id(treatment_id)
                    .ok()
                    .flatten()
                    .and_then(|t| t.assigned_vet_id)
            }
        };

        info!(treatment_id, ?assigned_vet_id, "用药记录已创建");

        Ok(CreateTreatmentResponse {
            treatment_id,
            farm_id: scope.farm_id,
            flock_id: scope.flock_id,
            animal_id: scope.animal_id,
            status: TreatmentStatus::Pending,
            assigned_vet_id,
        })
    }

    /// 兽医开方: 直接以 approved 创建并归属开方兽医
    ///
    /// # 返回
    /// - Err(Unauthorized): vet_id 不是兽医
    #[instrument(skip(self, request), fields(farm_id = request.farm_id))]
    pub fn prescribe(&self, vet_id: i64, request: PrescriptionRequest) -> ApiResult<CreateTreatmentResponse> {
        if self.user_repo.find_vet(vet_id)?.is_none() {
            return Err(ApiError::Unauthorized(format!("用户{}不是执业兽医，无权开方", vet_id)));
        }

        let antibiotic_name = require_antibiotic(&request.antibiotic_name)?;
        require_plausible_date(request.date)?;
        let scope = self.resolve_scope(request.farm_id, request.flock_id, request.animal_id)?;

        let new_treatment = NewTreatment {
            farm_id: scope.farm_id,
            flock_id: scope.flock_id,
            animal_id: scope.animal_id,
            antibiotic_name,
            dosage: normalize(request.dosage),
            method: normalize(request.method),
            reason: request.reason,
            treated_for: request.treated_for,
            date: request.date,
            status: TreatmentStatus::Approved,
            assigned_vet_id: Some(vet_id),
            recorded_by: Some(vet_id),
            vet_notes: normalize(request.vet_notes),
        };
        let treatment_id = self.treatment_repo.insert(&new_treatment)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::PrescribeTreatment,
            actor_for(Some(vet_id)),
            Some(treatment_id),
            Some(json!({
                "antibiotic_name": new_treatment.antibiotic_name,
                "flock_id": new_treatment.flock_id,
                "animal_id": new_treatment.animal_id,
                "date": new_treatment.date,
            })),
            format!("兽医开方 {}", new_treatment.antibiotic_name),
        ))?;

        info!(treatment_id, vet_id, "兽医开方已记录");

        Ok(CreateTreatmentResponse {
            treatment_id,
            farm_id: scope.farm_id,
            flock_id: scope.flock_id,
            animal_id: scope.animal_id,
            status: TreatmentStatus::Approved,
            assigned_vet_id: Some(vet_id),
        })
    }

    // ==========================================
    // 审批
    // ==========================================

    /// 执行审批动作
    ///
    /// # 返回
    /// - Err(InvalidInput): 动作令牌不是 approve / reject
    /// - Err(NotFound): 记录不存在
    /// - Err(Unauthorized): vet_id 不是兽医
    /// - Err(InvalidStateTransition): 记录已是终态（且未开启 lifecycle_allow_retransition）
    #[instrument(skip(self, request), fields(treatment_id = request.treatment_id, action = %request.action))]
    pub fn apply_action(&self, request: TreatmentActionRequest) -> ApiResult<TreatmentActionResponse> {
        let action = TreatmentAction::from_str(&request.action).ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "无效的审批动作: {}（仅支持 approve / reject）",
                request.action
            ))
        })?;

        if let Some(name) = &request.overrides.antibiotic_name {
            if name.trim().is_empty() {
                return Err(ApiError::InvalidInput("药物名称不能为空".to_string()));
            }
        }

        if let Some(vet_id) = request.vet_id {
            if self.user_repo.find_vet(vet_id)?.is_none() {
                return Err(ApiError::Unauthorized(format!("用户{}不是执业兽医，无权审批", vet_id)));
            }
        }

        let treatment = self
            .treatment_repo
            .find_by_id(request.treatment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Treatment(id={})不存在", request.treatment_id)))?;

        let allow_retransition = self
            .config_manager
            .get_lifecycle_allow_retransition()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        let previous_status = treatment.status;
        let lifecycle = TreatmentLifecycle::new(allow_retransition);
        let updated = lifecycle.apply(
            treatment,
            action,
            &request.overrides,
            chrono::Local::now().naive_local(),
        )?;

        if !self.treatment_repo.update_after_transition(&updated, previous_status)? {
            warn!(treatment_id = updated.id, "审批写回失败，记录状态已被并发修改");
            return Err(ApiError::InvalidStateTransition {
                from: previous_status.to_string(),
                to: updated.status.to_string(),
            });
        }

        let action_type = match action {
            TreatmentAction::Approve => ActionType::ApproveTreatment,
            TreatmentAction::Reject => ActionType::RejectTreatment,
        };
        self.action_log_repo.insert(&ActionLog::new(
            action_type,
            actor_for(request.vet_id),
            Some(updated.id),
            Some(json!({
                "from": previous_status,
                "to": updated.status,
                "overrides": request.overrides,
            })),
            format!("{} → {}", previous_status, updated.status),
        ))?;

        info!(treatment_id = updated.id, from = %previous_status, to = %updated.status, "审批完成");

        Ok(TreatmentActionResponse {
            treatment_id: updated.id,
            action,
            status: updated.status,
            message: format!("Treatment {} {}", updated.id, updated.status),
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 养殖场用药记录（最新在前）
    pub fn list_for_farm(&self, farm_id: i64) -> ApiResult<Vec<TreatmentListItem>> {
        if self.farm_repo.find_farm(farm_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Farm(id={})不存在", farm_id)));
        }
        let views = self.treatment_repo.list_for_farm(farm_id)?;
        Ok(views.into_iter().map(TreatmentListItem::from).collect())
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 校验 养殖场 ⊇ 畜群 ⊇ 个体 的归属关系
    fn resolve_scope(
        &self,
        farm_id: i64,
        flock_id: Option<i64>,
        animal_id: Option<i64>,
    ) -> ApiResult<TreatmentScope> {
        let farm = self
            .farm_repo
            .find_farm(farm_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Farm(id={})不存在", farm_id)))?;

        if animal_id.is_some() && flock_id.is_none() {
            return Err(ApiError::InvalidInput("个体级用药必须同时指定畜群".to_string()));
        }

        if let Some(flock_id) = flock_id {
            let flock = self
                .farm_repo
                .find_flock(flock_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Flock(id={})不存在", flock_id)))?;
            if flock.farm_id != farm.id {
                return Err(ApiError::InvalidInput(format!(
                    "畜群{}不属于养殖场{}",
                    flock_id, farm.id
                )));
            }
        }

        if let (Some(animal_id), Some(flock_id)) = (animal_id, flock_id) {
            let animal = self
                .farm_repo
                .find_animal(animal_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Animal(id={})不存在", animal_id)))?;
            if animal.flock_id != flock_id {
                return Err(ApiError::InvalidInput(format!(
                    "个体{}不属于畜群{}",
                    animal_id, flock_id
                )));
            }
        }

        Ok(TreatmentScope {
            farm_id: farm.id,
            flock_id,
            animal_id,
            farm_district: farm.district,
        })
    }

    /// 按候选顺序尝试分配，第一个未满额的兽医接单
    fn assign_on_create(&self, treatment_id: i64, district: Option<&str>) -> ApiResult<Option<i64>> {
        let district_vets = match district {
            Some(d) => self.user_repo.list_vets_in_district(d)?,
            None => Vec::new(),
        };
        let all_vets = self.user_repo.list_all_vets()?;

        for vet_id in self.policy.candidate_order(&district_vets, &all_vets) {
            if self
                .treatment_repo
                .assign_if_capacity(treatment_id, vet_id, self.policy.max_pending())?
            {
                self.action_log_repo.insert(&ActionLog::new(
                    ActionType::AssignVet,
                    actor_for(None),
                    Some(treatment_id),
                    Some(json!({ "vet_id": vet_id })),
                    format!("分配兽医 {}", vet_id),
                ))?;
                return Ok(Some(vet_id));
            }
        }

        warn!(treatment_id, "无可用兽医（全部满额或无兽医），记录保持未分配");
        Ok(None)
    }
}

fn require_antibiotic(name: &str) -> ApiResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("药物名称不能为空".to_string()));
    }
    Ok(trimmed.to_string())
}

/// 给药日期允许范围（四位年份）
const MIN_TREATMENT_YEAR: i32 = 1900;
const MAX_TREATMENT_YEAR: i32 = 9999;

fn require_plausible_date(date: NaiveDate) -> ApiResult<()> {
    if !(MIN_TREATMENT_YEAR..=MAX_TREATMENT_YEAR).contains(&date.year()) {
        return Err(ApiError::InvalidInput(format!(
            "给药日期超出允许范围 ({}-{}): {}",
            MIN_TREATMENT_YEAR, MAX_TREATMENT_YEAR, date
        )));
    }
    Ok(())
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
