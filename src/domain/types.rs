// ==========================================
// 兽药休药期监测系统 - 领域类型定义
// ==========================================
// 职责: 治疗状态、审批动作、用药原因等枚举
// 序列化格式: snake_case (与数据库、前端约定一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 治疗记录状态 (Treatment Status)
// ==========================================
// 状态机: Pending → Approved | Rejected (后两者为终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    Pending,  // 待审批
    Approved, // 已批准
    Rejected, // 已驳回
}

impl TreatmentStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(TreatmentStatus::Pending),
            "approved" => Some(TreatmentStatus::Approved),
            "rejected" => Some(TreatmentStatus::Rejected),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Pending => "pending",
            TreatmentStatus::Approved => "approved",
            TreatmentStatus::Rejected => "rejected",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TreatmentStatus::Pending)
    }
}

impl fmt::Display for TreatmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 审批动作 (Treatment Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentAction {
    Approve,
    Reject,
}

impl TreatmentAction {
    /// 解析动作令牌，仅接受 approve / reject
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Some(TreatmentAction::Approve),
            "reject" => Some(TreatmentAction::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentAction::Approve => "approve",
            TreatmentAction::Reject => "reject",
        }
    }

    /// 动作对应的目标状态
    pub fn target_status(&self) -> TreatmentStatus {
        match self {
            TreatmentAction::Approve => TreatmentStatus::Approved,
            TreatmentAction::Reject => TreatmentStatus::Rejected,
        }
    }
}

impl fmt::Display for TreatmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 用药原因 (Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentReason {
    TreatDisease, // 治疗
    Prophylactic, // 预防
    Other,
}

impl TreatmentReason {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "treat_disease" => Some(TreatmentReason::TreatDisease),
            "prophylactic" => Some(TreatmentReason::Prophylactic),
            "other" => Some(TreatmentReason::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TreatmentReason::TreatDisease => "treat_disease",
            TreatmentReason::Prophylactic => "prophylactic",
            TreatmentReason::Other => "other",
        }
    }
}

// ==========================================
// 治疗对象病症类别 (Treated For)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatedFor {
    Enteric,      // 肠道
    Respiratory,  // 呼吸道
    Reproductive, // 生殖
    Other,
}

impl TreatedFor {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "enteric" => Some(TreatedFor::Enteric),
            "respiratory" => Some(TreatedFor::Respiratory),
            "reproductive" => Some(TreatedFor::Reproductive),
            "other" => Some(TreatedFor::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TreatedFor::Enteric => "enteric",
            TreatedFor::Respiratory => "respiratory",
            TreatedFor::Reproductive => "reproductive",
            TreatedFor::Other => "other",
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Vet,
    DataOperator,
    Regulator,
}

impl UserRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "farmer" => Some(UserRole::Farmer),
            "vet" => Some(UserRole::Vet),
            "data_operator" => Some(UserRole::DataOperator),
            "regulator" => Some(UserRole::Regulator),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Vet => "vet",
            UserRole::DataOperator => "data_operator",
            UserRole::Regulator => "regulator",
        }
    }
}

// ==========================================
// 治疗作用范围 (Target Level)
// ==========================================
// 由 flock_id / animal_id 是否为空推导，不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLevel {
    Farm,
    Flock,
    Animal,
}

impl TargetLevel {
    pub fn from_scope(flock_id: Option<i64>, animal_id: Option<i64>) -> Self {
        match (flock_id, animal_id) {
            (_, Some(_)) => TargetLevel::Animal,
            (Some(_), None) => TargetLevel::Flock,
            (None, None) => TargetLevel::Farm,
        }
    }
}
