// ==========================================
// 兽药休药期监测系统 - 兽医工作台 API
// ==========================================
// 职责: 待审批/历史列表 + 读时补位分配
// 红线: 每次读取最多补位 1 条
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::treatment_api::TreatmentListItem;
use crate::config::ConfigManager;
use crate::domain::action_log::{actor_for, ActionLog, ActionType};
use crate::domain::farm::Vet;
use crate::engine::VetAssignmentPolicy;
use crate::repository::{ActionLogRepository, TreatmentRepository, UserRepository};

/// 兽医工作台
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetDashboard {
    pub vet_id: i64,
    pub pending: Vec<TreatmentListItem>,
    pub history: Vec<TreatmentListItem>,
    /// 本次读取补位分配到的记录
    pub rebalanced_treatment_id: Option<i64>,
}

// ==========================================
// VetDashboardApi - 兽医工作台 API
// ==========================================
pub struct VetDashboardApi {
    treatment_repo: Arc<TreatmentRepository>,
    user_repo: Arc<UserRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    policy: VetAssignmentPolicy,
}

impl VetDashboardApi {
    pub fn new(
        treatment_repo: Arc<TreatmentRepository>,
        user_repo: Arc<UserRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            treatment_repo,
            user_repo,
            action_log_repo,
            config_manager,
            policy: VetAssignmentPolicy::new(),
        }
    }

    /// 读取兽医工作台
    ///
    /// 先尝试补位分配一条未分配记录，再返回待审批与最近批准列表。
    ///
    /// # 返回
    /// - Err(NotFound): 用户不存在
    /// - Err(Unauthorized): 用户不是兽医
    #[instrument(skip(self))]
    pub fn get_dashboard(&self, vet_id: i64) -> ApiResult<VetDashboard> {
        let vet = match self.user_repo.find_vet(vet_id)? {
            Some(vet) => vet,
            None if self.user_repo.user_exists(vet_id)? => {
                return Err(ApiError::Unauthorized(format!("用户{}不是执业兽医", vet_id)));
            }
            None => return Err(ApiError::NotFound(format!("Vet(id={})不存在", vet_id))),
        };

        let rebalanced_treatment_id = self.rebalance_one(&vet)?;

        let history_limit = self
            .config_manager
            .get_vet_history_limit()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        let pending = self.treatment_repo.list_pending_for_vet(vet_id)?;
        let history = self.treatment_repo.list_history_for_vet(vet_id, history_limit)?;

        Ok(VetDashboard {
            vet_id,
            pending: pending.into_iter().map(TreatmentListItem::from).collect(),
            history: history.into_iter().map(TreatmentListItem::from).collect(),
            rebalanced_treatment_id,
        })
    }

    /// 补位分配: 兽医未满额时认领一条未分配记录
    ///
    /// 条件写入失败（并发下被他人认领或兽医已满额）时本次不再重试。
    fn rebalance_one(&self, vet: &Vet) -> ApiResult<Option<i64>> {
        let pending_count = self.treatment_repo.count_pending_for_vet(vet.id)?;
        if !self.policy.has_capacity(pending_count) {
            return Ok(None);
        }

        let candidates = self.treatment_repo.list_unassigned_pending()?;
        let treatment_id = match self.policy.pick_unassigned(vet, pending_count, &candidates) {
            Some(id) => id,
            None => return Ok(None),
        };

        if !self
            .treatment_repo
            .assign_if_capacity(treatment_id, vet.id, self.policy.max_pending())?
        {
            debug!(vet_id = vet.id, treatment_id, "补位条件写入未生效");
            return Ok(None);
        }

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::RebalanceAssign,
            actor_for(None),
            Some(treatment_id),
            Some(json!({ "vet_id": vet.id, "pending_before": pending_count })),
            format!("工作台补位分配兽医 {}", vet.id),
        ))?;

        info!(vet_id = vet.id, treatment_id, "补位分配完成");
        Ok(Some(treatment_id))
    }
}
