// ==========================================
// 兽药休药期监测系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod farm_repo;
pub mod reference_repo;
pub mod treatment_repo;
pub mod vet_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use farm_repo::FarmRepository;
pub use reference_repo::ReferenceLimitRepository;
pub use treatment_repo::{TreatmentRepository, UnassignedTreatment};
pub use vet_repo::{NewUser, UserRepository};
