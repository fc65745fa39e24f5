// ==========================================
// 兽药休药期监测系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令层调用
// ==========================================

pub mod error;
pub mod flock_api;
pub mod reference_api;
pub mod treatment_api;
pub mod vet_dashboard_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use flock_api::{BulkFlockRequest, BulkFlockResponse, FarmDetail, FlockApi, FlockDetail};
pub use reference_api::{MoleculeLimits, ReferenceApi};
pub use treatment_api::{
    CreateTreatmentRequest, CreateTreatmentResponse, PrescriptionRequest, TreatmentActionRequest,
    TreatmentActionResponse, TreatmentApi, TreatmentListItem,
};
pub use vet_dashboard_api::{VetDashboard, VetDashboardApi};
