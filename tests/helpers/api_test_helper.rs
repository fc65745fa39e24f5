// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// 约定: 使用方需在 crate 根声明 `mod test_helpers;`
// ==========================================
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use amu_monitoring::api::{
    ApiError, CreateTreatmentRequest, CreateTreatmentResponse, FlockApi, PrescriptionRequest,
    ReferenceApi, TreatmentActionRequest, TreatmentApi, VetDashboardApi,
};
use amu_monitoring::app::AppState;
use amu_monitoring::config::ConfigManager;
use amu_monitoring::db::open_sqlite_connection;
use amu_monitoring::domain::{
    Animal, Farm, Flock, ReferenceLimit, TreatedFor, TreatmentOverrides, TreatmentReason, UserRole,
};
use amu_monitoring::repository::{
    ActionLogRepository, FarmRepository, NewUser, ReferenceLimitRepository, TreatmentRepository,
    UserRepository,
};

use crate::test_helpers::create_test_db;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和用于准备数据的Repository
pub struct ApiTestEnv {
    pub db_path: String,
    pub treatment_api: Arc<TreatmentApi>,
    pub vet_dashboard_api: Arc<VetDashboardApi>,
    pub flock_api: Arc<FlockApi>,
    pub reference_api: Arc<ReferenceApi>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备与断言）
    pub farm_repo: Arc<FarmRepository>,
    pub user_repo: Arc<UserRepository>,
    pub reference_repo: Arc<ReferenceLimitRepository>,
    pub treatment_repo: Arc<TreatmentRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（临时数据库文件 + 全部 API）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let farm_repo = Arc::new(FarmRepository::new(conn.clone()));
        let user_repo = Arc::new(UserRepository::new(conn.clone()));
        let reference_repo = Arc::new(ReferenceLimitRepository::new(conn.clone()));
        let treatment_repo = Arc::new(TreatmentRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let treatment_api = Arc::new(TreatmentApi::new(
            treatment_repo.clone(),
            farm_repo.clone(),
            user_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));
        let vet_dashboard_api = Arc::new(VetDashboardApi::new(
            treatment_repo.clone(),
            user_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));
        let flock_api = Arc::new(FlockApi::new(
            farm_repo.clone(),
            treatment_repo.clone(),
            reference_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));
        let reference_api = Arc::new(ReferenceApi::new(reference_repo.clone()));

        Ok(Self {
            db_path,
            treatment_api,
            vet_dashboard_api,
            flock_api,
            reference_api,
            config_manager,
            farm_repo,
            user_repo,
            reference_repo,
            treatment_repo,
            action_log_repo,
            _temp_file: temp_file,
        })
    }

    /// 基于同一数据库文件创建 AppState（命令层测试用）
    pub fn app_state(&self) -> AppState {
        AppState::new(self.db_path.clone()).expect("无法创建AppState")
    }

    // ==========================================
    // 参考数据
    // ==========================================

    pub fn seed_limit(&self, molecule: &str, species: &str, tissue: &str, days: Option<i32>) {
        self.reference_repo
            .upsert_species(species, None)
            .expect("写入物种失败");
        self.reference_repo
            .link_molecule_species(molecule, species)
            .expect("写入药物-物种关联失败");
        self.reference_repo
            .upsert_limit(&ReferenceLimit {
                molecule: molecule.to_string(),
                species_code: species.to_string(),
                tissue: tissue.to_string(),
                mrl_mg_per_kg: 0.1,
                withdrawal_days: days,
            })
            .expect("写入限量失败");
    }

    /// 家禽常用参考数据: Amoxicillin 肌肉 4 / 蛋 0，Oxytetracycline 肌肉 7
    pub fn seed_poultry_reference(&self) {
        self.seed_limit("Amoxicillin", "AVI", "Muscle", Some(4));
        self.seed_limit("Amoxicillin", "AVI", "Eggs", Some(0));
        self.seed_limit("Oxytetracycline", "AVI", "Muscle", Some(7));
    }

    // ==========================================
    // 用户 / 养殖场 / 畜群
    // ==========================================

    pub fn create_user(&self, email: &str, role: UserRole, district: Option<&str>) -> i64 {
        self.user_repo
            .create_user(&NewUser {
                first_name: email.split('@').next().unwrap_or(email).to_string(),
                last_name: String::new(),
                email: email.to_string(),
                role,
                state: Some("Tamil Nadu".to_string()),
                district: district.map(str::to_string),
            })
            .expect("创建用户失败")
    }

    pub fn create_vet(&self, email: &str, district: &str) -> i64 {
        self.create_user(email, UserRole::Vet, Some(district))
    }

    pub fn create_farm(&self, farm_number: &str, district: Option<&str>) -> i64 {
        self.farm_repo
            .create_farm(&Farm {
                id: 0,
                name: format!("Farm {}", farm_number),
                farm_number: farm_number.to_string(),
                state: "Tamil Nadu".to_string(),
                district: district.map(str::to_string),
                village: None,
                total_animals: 0,
            })
            .expect("创建养殖场失败")
    }

    pub fn create_flock(
        &self,
        farm_id: i64,
        flock_code: &str,
        species: Option<&str>,
        date_of_birth: Option<NaiveDate>,
    ) -> i64 {
        self.farm_repo
            .create_flock(&Flock {
                id: 0,
                farm_id,
                flock_code: flock_code.to_string(),
                flock_tag: format!("T-{}", flock_code),
                species_code: species.map(str::to_string),
                size: 0,
                date_of_birth,
                avg_weight_kg: None,
                avg_feed_kg_per_day: None,
                avg_water_l_per_day: None,
            })
            .expect("创建畜群失败")
    }

    pub fn create_animal(&self, flock_id: i64, tag: &str) -> i64 {
        self.farm_repo
            .create_animal(&Animal {
                id: 0,
                flock_id,
                animal_tag: tag.to_string(),
                date_of_birth: None,
                sex: None,
            })
            .expect("创建个体失败")
    }

    // ==========================================
    // 用药记录
    // ==========================================

    pub fn treatment_request(
        &self,
        farm_id: i64,
        flock_id: Option<i64>,
        molecule: &str,
        date: NaiveDate,
    ) -> CreateTreatmentRequest {
        CreateTreatmentRequest {
            farm_id,
            flock_id,
            animal_id: None,
            antibiotic_name: molecule.to_string(),
            dosage: Some("10 mg/kg".to_string()),
            method: Some("drinking water".to_string()),
            reason: TreatmentReason::TreatDisease,
            treated_for: TreatedFor::Respiratory,
            date,
            recorded_by: None,
        }
    }

    /// 养殖端登记（pending）
    pub fn record(&self, farm_id: i64, flock_id: Option<i64>, molecule: &str, date: NaiveDate) -> CreateTreatmentResponse {
        self.treatment_api
            .create_treatment(self.treatment_request(farm_id, flock_id, molecule, date))
            .expect("登记用药失败")
    }

    /// 兽医开方（approved）
    pub fn prescribe(&self, vet_id: i64, farm_id: i64, flock_id: i64, molecule: &str, date: NaiveDate) -> i64 {
        self.treatment_api
            .prescribe(
                vet_id,
                PrescriptionRequest {
                    farm_id,
                    flock_id: Some(flock_id),
                    animal_id: None,
                    antibiotic_name: molecule.to_string(),
                    dosage: None,
                    method: None,
                    reason: TreatmentReason::TreatDisease,
                    treated_for: TreatedFor::Enteric,
                    date,
                    vet_notes: None,
                },
            )
            .expect("开方失败")
            .treatment_id
    }

    pub fn act(
        &self,
        treatment_id: i64,
        action: &str,
        overrides: TreatmentOverrides,
    ) -> Result<amu_monitoring::api::TreatmentActionResponse, ApiError> {
        self.treatment_api.apply_action(TreatmentActionRequest {
            treatment_id,
            action: action.to_string(),
            vet_id: None,
            overrides,
        })
    }

    pub fn approve(&self, treatment_id: i64) {
        self.act(treatment_id, "approve", TreatmentOverrides::default())
            .expect("批准失败");
    }

    pub fn set_config(&self, key: &str, value: &str) {
        self.config_manager
            .set_global_config_value(key, value)
            .expect("写入配置失败");
    }
}
