// ==========================================
// 兽药休药期监测系统 - 用药记录状态机
// ==========================================
// 状态机: pending → approved | rejected
// 红线: 驳回只允许修改 vet_notes
// ==========================================

use crate::domain::treatment::{Treatment, TreatmentOverrides};
use crate::domain::types::{TreatmentAction, TreatmentStatus};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("用药记录 {treatment_id} 已处于终态 {status}，不能再执行 {action}")]
    AlreadyFinal {
        treatment_id: i64,
        status: TreatmentStatus,
        action: TreatmentAction,
    },
}

// ==========================================
// TreatmentLifecycle - 审批状态机
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct TreatmentLifecycle {
    allow_retransition: bool,
}

impl TreatmentLifecycle {
    /// allow_retransition = true 时允许对终态记录再次审批
    pub fn new(allow_retransition: bool) -> Self {
        Self { allow_retransition }
    }

    /// 对记录执行审批动作，返回更新后的记录
    ///
    /// - approve: 状态置为 approved，覆写字段中非空的项替换原值
    /// - reject: 状态置为 rejected，只应用 vet_notes
    #[instrument(skip(self, treatment, overrides), fields(treatment_id = treatment.id, from = %treatment.status))]
    pub fn apply(
        &self,
        mut treatment: Treatment,
        action: TreatmentAction,
        overrides: &TreatmentOverrides,
        now: NaiveDateTime,
    ) -> Result<Treatment, LifecycleError> {
        if treatment.status.is_terminal() && !self.allow_retransition {
            return Err(LifecycleError::AlreadyFinal {
                treatment_id: treatment.id,
                status: treatment.status,
                action,
            });
        }

        match action {
            TreatmentAction::Approve => {
                if let Some(name) = &overrides.antibiotic_name {
                    treatment.antibiotic_name = name.clone();
                }
                if let Some(reason) = overrides.reason {
                    treatment.reason = reason;
                }
                if let Some(treated_for) = overrides.treated_for {
                    treatment.treated_for = treated_for;
                }
                if let Some(dosage) = &overrides.dosage {
                    treatment.dosage = Some(dosage.clone());
                }
                if let Some(method) = &overrides.method {
                    treatment.method = Some(method.clone());
                }
            }
            TreatmentAction::Reject => {}
        }

        if let Some(notes) = &overrides.vet_notes {
            treatment.vet_notes = Some(notes.clone());
        }

        treatment.status = action.target_status();
        treatment.updated_at = now;
        Ok(treatment)
    }
}
