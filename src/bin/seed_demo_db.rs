// ==========================================
// 兽药休药期监测系统 - 演示数据库初始化
// ==========================================
// 用法: seed_demo_db [db_path]
// 说明: 已存在的库先备份再重建；参考数据 + 兽医 + 养殖场 + 畜群 + 用药记录
// ==========================================

use chrono::{Duration, Local};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use amu_monitoring::api::{BulkFlockRequest, CreateTreatmentRequest, PrescriptionRequest, TreatmentActionRequest};
use amu_monitoring::app::{get_default_db_path, AppState};
use amu_monitoring::db::{init_schema, open_sqlite_connection};
use amu_monitoring::domain::{Farm, ReferenceLimit, TreatedFor, TreatmentOverrides, TreatmentReason, UserRole};
use amu_monitoring::repository::{FarmRepository, NewUser, ReferenceLimitRepository, UserRepository};

// (分子, 物种, 组织, MRL mg/kg, 休药期天数)
const REFERENCE_LIMITS: &[(&str, &str, &str, f64, Option<i32>)] = &[
    ("Amoxicillin", "AVI", "Muscle", 0.05, Some(4)),
    ("Amoxicillin", "AVI", "Eggs", 0.0, Some(0)),
    ("Oxytetracycline", "AVI", "Muscle", 0.1, Some(7)),
    ("Oxytetracycline", "AVI", "Eggs", 0.2, None),
    ("Enrofloxacin", "AVI", "Muscle", 0.1, Some(8)),
    ("Enrofloxacin", "AVI", "Eggs", 0.0, Some(9)),
    ("Amoxicillin", "BOV", "Muscle", 0.05, Some(14)),
    ("Amoxicillin", "BOV", "Milk", 0.004, Some(3)),
    ("Oxytetracycline", "BOV", "Muscle", 0.1, Some(28)),
    ("Oxytetracycline", "BOV", "Milk", 0.1, Some(7)),
    ("Amoxicillin", "SUI", "Muscle", 0.05, Some(16)),
    ("Tylosin", "SUI", "Muscle", 0.1, Some(5)),
];

const SPECIES: &[(&str, &str)] = &[
    ("AVI", "Poultry"),
    ("BOV", "Cattle"),
    ("SUI", "Pigs"),
];

// (名, 姓, 邮箱, 区县)
const VETS: &[(&str, &str, &str, &str)] = &[
    ("Meena", "Raj", "meena.raj@example.org", "Salem"),
    ("Arun", "Kumar", "arun.kumar@example.org", "Salem"),
    ("Divya", "Nair", "divya.nair@example.org", "Erode"),
];

fn main() -> Result<(), Box<dyn Error>> {
    amu_monitoring::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed_reference_data(&ReferenceLimitRepository::new(conn.clone()))?;
    let farmer_id = seed_users(&UserRepository::new(conn.clone()))?;
    let farm_id = seed_farm(&FarmRepository::new(conn.clone()))?;
    drop(conn);

    let state = AppState::new(db_path.clone())?;
    seed_flocks_and_treatments(&state, farm_id, farmer_id)?;

    print_quick_counts(&state, farm_id)?;
    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_reference_data(repo: &ReferenceLimitRepository) -> Result<(), Box<dyn Error>> {
    for &(code, description) in SPECIES {
        repo.upsert_species(code, Some(description))?;
    }

    for &(molecule, species_code, tissue, mrl_mg_per_kg, withdrawal_days) in REFERENCE_LIMITS {
        repo.link_molecule_species(molecule, species_code)?;
        repo.upsert_limit(&ReferenceLimit {
            molecule: molecule.to_string(),
            species_code: species_code.to_string(),
            tissue: tissue.to_string(),
            mrl_mg_per_kg,
            withdrawal_days,
        })?;
    }
    Ok(())
}

/// 写入兽医与一名养殖户，返回养殖户ID
fn seed_users(repo: &UserRepository) -> Result<i64, Box<dyn Error>> {
    for &(first_name, last_name, email, district) in VETS {
        repo.create_user(&NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            role: UserRole::Vet,
            state: Some("Tamil Nadu".to_string()),
            district: Some(district.to_string()),
        })?;
    }

    let farmer_id = repo.create_user(&NewUser {
        first_name: "Selvi".to_string(),
        last_name: "Murugan".to_string(),
        email: "selvi.murugan@example.org".to_string(),
        role: UserRole::Farmer,
        state: Some("Tamil Nadu".to_string()),
        district: Some("Salem".to_string()),
    })?;
    Ok(farmer_id)
}

fn seed_farm(repo: &FarmRepository) -> Result<i64, Box<dyn Error>> {
    let farm_id = repo.create_farm(&Farm {
        id: 0,
        name: "Green Valley Poultry".to_string(),
        farm_number: "FRM001".to_string(),
        state: "Tamil Nadu".to_string(),
        district: Some("Salem".to_string()),
        village: Some("Attur".to_string()),
        total_animals: 0,
    })?;
    Ok(farm_id)
}

fn seed_flocks_and_treatments(state: &AppState, farm_id: i64, farmer_id: i64) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();

    let broilers = state.flock_api.register_flock(BulkFlockRequest {
        farm_id,
        flock_code: "FLK01".to_string(),
        count: 50,
        species_code: Some("AVI".to_string()),
        age_in_weeks: Some(4),
        avg_weight_kg: Some(1.8),
        avg_feed_kg_per_day: Some(0.12),
        avg_water_l_per_day: Some(0.25),
        recorded_by: Some(farmer_id),
    })?;

    let layers = state.flock_api.register_flock(BulkFlockRequest {
        farm_id,
        flock_code: "FLK02".to_string(),
        count: 20,
        species_code: Some("AVI".to_string()),
        age_in_weeks: Some(30),
        avg_weight_kg: Some(1.6),
        avg_feed_kg_per_day: Some(0.11),
        avg_water_l_per_day: Some(0.22),
        recorded_by: Some(farmer_id),
    })?;

    // 养殖端登记 → 自动分配兽医 → 批准
    let created = state.treatment_api.create_treatment(CreateTreatmentRequest {
        farm_id,
        flock_id: Some(broilers.flock_id),
        animal_id: None,
        antibiotic_name: "Oxytetracycline".to_string(),
        dosage: Some("20 mg/kg".to_string()),
        method: Some("drinking water".to_string()),
        reason: TreatmentReason::TreatDisease,
        treated_for: TreatedFor::Respiratory,
        date: today - Duration::days(2),
        recorded_by: Some(farmer_id),
    })?;

    state.treatment_api.apply_action(TreatmentActionRequest {
        treatment_id: created.treatment_id,
        action: "approve".to_string(),
        vet_id: created.assigned_vet_id,
        overrides: TreatmentOverrides {
            vet_notes: Some("5 days course".to_string()),
            ..TreatmentOverrides::default()
        },
    })?;

    // 待审批记录（留在工作台）
    state.treatment_api.create_treatment(CreateTreatmentRequest {
        farm_id,
        flock_id: Some(layers.flock_id),
        animal_id: None,
        antibiotic_name: "Amoxicillin".to_string(),
        dosage: None,
        method: Some("feed".to_string()),
        reason: TreatmentReason::Prophylactic,
        treated_for: TreatedFor::Enteric,
        date: today,
        recorded_by: Some(farmer_id),
    })?;

    // 兽医直接开方
    if let Some(vet_id) = created.assigned_vet_id {
        state.treatment_api.prescribe(
            vet_id,
            PrescriptionRequest {
                farm_id,
                flock_id: Some(layers.flock_id),
                animal_id: None,
                antibiotic_name: "Enrofloxacin".to_string(),
                dosage: Some("10 mg/kg".to_string()),
                method: Some("oral".to_string()),
                reason: TreatmentReason::TreatDisease,
                treated_for: TreatedFor::Enteric,
                date: today - Duration::days(1),
                vet_notes: Some("Hold eggs".to_string()),
            },
        )?;
    }

    Ok(())
}

fn print_quick_counts(state: &AppState, farm_id: i64) -> Result<(), Box<dyn Error>> {
    let detail = state.flock_api.get_farm_detail(farm_id)?;
    eprintln!(
        "Farm {}: {} flocks, {} animals, under_withdrawal={}, safe_harvest_date={}",
        detail.farm.farm_number,
        detail.flocks.len(),
        detail.farm.total_animals,
        detail.is_under_withdrawal,
        detail.safe_harvest_date.as_deref().unwrap_or("-"),
    );
    for flock in &detail.flocks {
        eprintln!(
            "  {} age={}w approved={} safe={}",
            flock.flock.flock_tag,
            flock.age_in_weeks.unwrap_or(0),
            flock.approved_treatment_count,
            flock.safe_harvest_date.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
