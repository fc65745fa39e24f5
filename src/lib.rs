// ==========================================
// 兽药休药期监测系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 用药记录、兽医审批、休药期判定
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配与命令边界
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{TargetLevel, TreatedFor, TreatmentAction, TreatmentReason, TreatmentStatus, UserRole};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Animal, Farm, Flock, ReferenceCatalog, ReferenceLimit, Treatment,
    TreatmentOverrides, Vet, WithdrawalVerdict,
};

// 引擎
pub use engine::{TreatmentLifecycle, VetAssignmentPolicy, WithdrawalEvaluator, MAX_PENDING_PER_VET};

// API
pub use api::{ApiError, FlockApi, ReferenceApi, TreatmentApi, VetDashboardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "兽药休药期监测系统";
