// ==========================================
// 兽药休药期监测系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{FlockApi, ReferenceApi, TreatmentApi, VetDashboardApi};
use crate::config::config_manager::ConfigManager;
use crate::repository::{
    ActionLogRepository, FarmRepository, ReferenceLimitRepository, TreatmentRepository,
    UserRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 用药记录API
    pub treatment_api: Arc<TreatmentApi>,

    /// 兽医工作台API
    pub vet_dashboard_api: Arc<VetDashboardApi>,

    /// 畜群API
    pub flock_api: Arc<FlockApi>,

    /// 参考数据API
    pub reference_api: Arc<ReferenceApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("初始化数据库结构失败: {}", e))?;

        Self::from_connection(db_path, conn)
    }

    /// 基于已打开的连接创建（连接需已完成 schema 初始化）
    pub fn from_connection(db_path: String, conn: Connection) -> Result<Self, String> {
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let treatment_repo = Arc::new(TreatmentRepository::new(conn.clone()));
        let farm_repo = Arc::new(FarmRepository::new(conn.clone()));
        let user_repo = Arc::new(UserRepository::new(conn.clone()));
        let reference_repo = Arc::new(ReferenceLimitRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let treatment_api = Arc::new(TreatmentApi::new(
            treatment_repo.clone(),
            farm_repo.clone(),
            user_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));

        let vet_dashboard_api = Arc::new(VetDashboardApi::new(
            treatment_repo.clone(),
            user_repo,
            action_log_repo.clone(),
            config_manager.clone(),
        ));

        let flock_api = Arc::new(FlockApi::new(
            farm_repo,
            treatment_repo,
            reference_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));

        let reference_api = Arc::new(ReferenceApi::new(reference_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            treatment_api,
            vet_dashboard_api,
            flock_api,
            reference_api,
            config_manager,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 AMU_MONITORING_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("AMU_MONITORING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./amu_monitoring.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("amu-monitoring");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("amu_monitoring.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
