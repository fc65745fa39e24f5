// ==========================================
// 兽药休药期监测系统 - 治疗记录领域模型
// ==========================================
// 职责: Treatment 实体、审批覆写字段、休药期结论
// 红线: animal 非空 ⇒ flock 非空，且 animal 属于该 flock
// ==========================================

use crate::domain::types::{TargetLevel, TreatedFor, TreatmentReason, TreatmentStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Treatment - 用药记录
// ==========================================
// 对齐: treatment 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    // ===== 主键与归属 =====
    pub id: i64,
    pub farm_id: i64,
    pub flock_id: Option<i64>,  // 畜群级
    pub animal_id: Option<i64>, // 个体级 (比畜群级更窄)

    // ===== 临床字段 =====
    pub antibiotic_name: String,
    pub dosage: Option<String>,
    pub method: Option<String>, // 给药方式
    pub reason: TreatmentReason,
    pub treated_for: TreatedFor,
    pub date: NaiveDate, // 给药日期

    // ===== 审批流程 =====
    pub status: TreatmentStatus,
    pub assigned_vet_id: Option<i64>,
    pub recorded_by: Option<i64>,
    pub vet_notes: Option<String>,

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Treatment {
    pub fn target_level(&self) -> TargetLevel {
        TargetLevel::from_scope(self.flock_id, self.animal_id)
    }
}

// ==========================================
// TreatmentView - 带归属信息的用药记录 (工作台/列表展示)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentView {
    #[serde(flatten)]
    pub treatment: Treatment,
    pub farm_name: String,
    pub farm_number: String,
    pub farm_district: Option<String>,
    pub flock_tag: Option<String>,
    pub animal_tag: Option<String>,
    pub avg_weight_kg: Option<f64>,
    pub avg_feed_kg_per_day: Option<f64>,
    pub avg_water_l_per_day: Option<f64>,
}

// ==========================================
// NewTreatment - 待插入的用药记录
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NewTreatment {
    pub farm_id: i64,
    pub flock_id: Option<i64>,
    pub animal_id: Option<i64>,
    pub antibiotic_name: String,
    pub dosage: Option<String>,
    pub method: Option<String>,
    pub reason: TreatmentReason,
    pub treated_for: TreatedFor,
    pub date: NaiveDate,
    pub status: TreatmentStatus,
    pub assigned_vet_id: Option<i64>,
    pub recorded_by: Option<i64>,
    pub vet_notes: Option<String>,
}

// ==========================================
// TreatmentOverrides - 审批时的临床字段覆写
// ==========================================
/// 审批时兽医可修正的字段
///
/// None 表示保持原值。驳回时只有 vet_notes 生效。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentOverrides {
    pub antibiotic_name: Option<String>,
    pub reason: Option<TreatmentReason>,
    pub treated_for: Option<TreatedFor>,
    pub dosage: Option<String>,
    pub method: Option<String>,
    pub vet_notes: Option<String>,
}

impl TreatmentOverrides {
    pub fn is_empty(&self) -> bool {
        self == &TreatmentOverrides::default()
    }
}

// ==========================================
// WithdrawalVerdict - 休药期结论 (读时计算，不落库)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WithdrawalVerdict {
    pub safe_harvest_date: Option<NaiveDate>,
    pub is_under_withdrawal: bool,
}

impl WithdrawalVerdict {
    /// 无约束结论 {None, false}
    pub fn clear() -> Self {
        Self::default()
    }
}
