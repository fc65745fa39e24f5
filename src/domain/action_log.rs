// ==========================================
// 兽药休药期监测系统 - 操作日志领域模型
// ==========================================
// 职责: 治疗记录创建/审批/分配的审计追踪
// 红线: 所有写入必须记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,          // 日志ID (UUID v4)
    pub action_type: String,        // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,   // 操作时间戳
    pub actor: String,              // 操作人 (user:<id> / system)
    pub treatment_id: Option<i64>,  // 关联治疗记录 (畜群登记等操作为 None)
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,     // 详细描述
}

impl ActionLog {
    /// 以当前时间构建日志
    pub fn new(
        action_type: ActionType,
        actor: impl Into<String>,
        treatment_id: Option<i64>,
        payload_json: Option<JsonValue>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.into(),
            treatment_id,
            payload_json,
            detail: Some(detail.into()),
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateTreatment,    // 养殖端登记用药
    PrescribeTreatment, // 兽医直接开方 (免审批)
    ApproveTreatment,   // 兽医批准
    RejectTreatment,    // 兽医驳回
    AssignVet,          // 创建时分配兽医
    RebalanceAssign,    // 工作台读取时补位分配
    RegisterFlock,      // 批量登记畜群
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateTreatment => "CreateTreatment",
            ActionType::PrescribeTreatment => "PrescribeTreatment",
            ActionType::ApproveTreatment => "ApproveTreatment",
            ActionType::RejectTreatment => "RejectTreatment",
            ActionType::AssignVet => "AssignVet",
            ActionType::RebalanceAssign => "RebalanceAssign",
            ActionType::RegisterFlock => "RegisterFlock",
        }
    }

    /// 从字符串解析 (用于数据库读取)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateTreatment" => Some(ActionType::CreateTreatment),
            "PrescribeTreatment" => Some(ActionType::PrescribeTreatment),
            "ApproveTreatment" => Some(ActionType::ApproveTreatment),
            "RejectTreatment" => Some(ActionType::RejectTreatment),
            "AssignVet" => Some(ActionType::AssignVet),
            "RebalanceAssign" => Some(ActionType::RebalanceAssign),
            "RegisterFlock" => Some(ActionType::RegisterFlock),
            _ => None,
        }
    }
}

/// 操作人标识
pub fn actor_for(user_id: Option<i64>) -> String {
    match user_id {
        Some(id) => format!("user:{}", id),
        None => "system".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trip() {
        for t in [
            ActionType::CreateTreatment,
            ActionType::ApproveTreatment,
            ActionType::RebalanceAssign,
        ] {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Recalc"), None);
    }

    #[test]
    fn test_new_log_has_uuid() {
        let log = ActionLog::new(ActionType::AssignVet, actor_for(None), Some(3), None, "assign");
        assert_eq!(log.actor, "system");
        assert_eq!(log.action_type, "AssignVet");
        assert!(uuid::Uuid::parse_str(&log.action_id).is_ok());
    }
}
