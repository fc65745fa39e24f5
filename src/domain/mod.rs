// ==========================================
// 兽药休药期监测系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod farm;
pub mod reference;
pub mod treatment;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use farm::{Animal, Farm, Flock, Vet};
pub use reference::{ReferenceCatalog, ReferenceLimit};
pub use treatment::{NewTreatment, Treatment, TreatmentOverrides, TreatmentView, WithdrawalVerdict};
pub use types::{TargetLevel, TreatedFor, TreatmentAction, TreatmentReason, TreatmentStatus, UserRole};
