// ==========================================
// 兽药休药期监测系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL
// ==========================================

pub mod assignment;
pub mod lifecycle;
pub mod withdrawal;

// 重导出核心引擎
pub use assignment::{VetAssignmentPolicy, MAX_PENDING_PER_VET};
pub use lifecycle::{LifecycleError, TreatmentLifecycle};
pub use withdrawal::{merge_verdicts, WithdrawalEvaluator};
