// ==========================================
// 休药期判定集成测试
// ==========================================
// 测试范围:
// 1. 畜群结论: 无记录 / 单药 / 多组织取最大 / 多记录取最大
// 2. 只统计已批准记录，批准后驳回即撤销影响
// 3. 养殖场结论合并、周龄推导
// ==========================================

mod helpers;
mod test_helpers;

use amu_monitoring::config::config_keys;
use amu_monitoring::domain::TreatmentOverrides;
use helpers::api_test_helper::*;
use test_helpers::d;

struct PoultryFixture {
    env: ApiTestEnv,
    vet_id: i64,
    farm_id: i64,
    flock_id: i64,
}

fn poultry_fixture() -> PoultryFixture {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_poultry_reference();
    let vet_id = env.create_vet("vet.salem@example.org", "Salem");
    let farm_id = env.create_farm("FRM001", Some("Salem"));
    let flock_id = env.create_flock(farm_id, "FLK01", Some("AVI"), Some(d(2024, 4, 1)));
    PoultryFixture {
        env,
        vet_id,
        farm_id,
        flock_id,
    }
}

// ==========================================
// 畜群结论
// ==========================================

#[test]
fn test_flock_without_treatments_is_clear() {
    let fx = poultry_fixture();

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 1))
        .unwrap();

    assert_eq!(detail.safe_harvest_date, None);
    assert!(!detail.is_under_withdrawal);
    assert_eq!(detail.approved_treatment_count, 0);
}

#[test]
fn test_single_molecule_window_inclusive() {
    let fx = poultry_fixture();
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Oxytetracycline", d(2024, 5, 1));

    for (today, expected) in [
        (d(2024, 5, 1), true),
        (d(2024, 5, 4), true),
        (d(2024, 5, 8), true),
        (d(2024, 5, 9), false),
    ] {
        let detail = fx.env.flock_api.get_flock_detail_at(fx.flock_id, today).unwrap();
        assert_eq!(detail.safe_harvest_date.as_deref(), Some("2024-05-08"));
        assert_eq!(detail.is_under_withdrawal, expected, "today={}", today);
    }
}

#[test]
fn test_max_across_tissues() {
    let fx = poultry_fixture();
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Amoxicillin", d(2024, 5, 1));

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 2))
        .unwrap();

    // 肌肉 4 天、蛋 0 天 → 4 天
    assert_eq!(detail.safe_harvest_date.as_deref(), Some("2024-05-05"));
    assert!(detail.is_under_withdrawal);
}

#[test]
fn test_max_across_treatments() {
    let fx = poultry_fixture();
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Amoxicillin", d(2024, 5, 10));
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Oxytetracycline", d(2024, 5, 1));

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 12))
        .unwrap();

    // 5/10 + 4 = 5/14 晚于 5/1 + 7 = 5/8
    assert_eq!(detail.safe_harvest_date.as_deref(), Some("2024-05-14"));
    assert_eq!(detail.approved_treatment_count, 2);
}

#[test]
fn test_pending_and_rejected_do_not_count() {
    let fx = poultry_fixture();

    let pending = fx
        .env
        .record(fx.farm_id, Some(fx.flock_id), "Oxytetracycline", d(2024, 5, 1));
    let rejected = fx
        .env
        .record(fx.farm_id, Some(fx.flock_id), "Amoxicillin", d(2024, 5, 1));
    fx.env
        .act(rejected.treatment_id, "reject", TreatmentOverrides::default())
        .unwrap();

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 2))
        .unwrap();
    assert_eq!(detail.safe_harvest_date, None);
    assert!(!detail.is_under_withdrawal);

    // 批准后才计入
    fx.env.approve(pending.treatment_id);
    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 2))
        .unwrap();
    assert_eq!(detail.safe_harvest_date.as_deref(), Some("2024-05-08"));
}

#[test]
fn test_reject_after_approve_removes_contribution() {
    let fx = poultry_fixture();
    fx.env
        .set_config(config_keys::LIFECYCLE_ALLOW_RETRANSITION, "true");

    let created = fx
        .env
        .record(fx.farm_id, Some(fx.flock_id), "Oxytetracycline", d(2024, 5, 1));
    fx.env.approve(created.treatment_id);

    let before = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 3))
        .unwrap();
    assert!(before.is_under_withdrawal);

    fx.env
        .act(created.treatment_id, "reject", TreatmentOverrides::default())
        .expect("开启再审批后应允许驳回已批准记录");

    let after = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 3))
        .unwrap();
    assert_eq!(after.safe_harvest_date, None);
    assert!(!after.is_under_withdrawal);
}

#[test]
fn test_animal_scoped_treatment_counts_for_flock() {
    let fx = poultry_fixture();
    let animal_id = fx.env.create_animal(fx.flock_id, "FRM001-FLK01-001");

    let mut request = fx
        .env
        .treatment_request(fx.farm_id, Some(fx.flock_id), "Oxytetracycline", d(2024, 5, 1));
    request.animal_id = Some(animal_id);
    let created = fx.env.treatment_api.create_treatment(request).unwrap();
    fx.env.approve(created.treatment_id);

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 2))
        .unwrap();
    assert!(detail.is_under_withdrawal);
}

#[test]
fn test_unknown_molecule_contributes_zero_days() {
    let fx = poultry_fixture();
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Unlisted", d(2024, 5, 1));

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(fx.flock_id, d(2024, 5, 2))
        .unwrap();
    assert_eq!(detail.safe_harvest_date.as_deref(), Some("2024-05-01"));
    assert!(!detail.is_under_withdrawal);
}

#[test]
fn test_flock_without_species_is_clear() {
    let fx = poultry_fixture();
    let bare_flock = fx.env.create_flock(fx.farm_id, "FLK09", None, None);
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, bare_flock, "Oxytetracycline", d(2024, 5, 1));

    let detail = fx
        .env
        .flock_api
        .get_flock_detail_at(bare_flock, d(2024, 5, 2))
        .unwrap();
    assert_eq!(detail.safe_harvest_date, None);
    assert!(!detail.is_under_withdrawal);
    assert_eq!(detail.age_in_weeks, None);
}

// ==========================================
// 养殖场结论
// ==========================================

#[test]
fn test_farm_detail_merges_flock_verdicts() {
    let fx = poultry_fixture();
    let second = fx
        .env
        .create_flock(fx.farm_id, "FLK02", Some("AVI"), Some(d(2024, 3, 1)));

    fx.env
        .prescribe(fx.vet_id, fx.farm_id, fx.flock_id, "Amoxicillin", d(2024, 5, 1));
    fx.env
        .prescribe(fx.vet_id, fx.farm_id, second, "Oxytetracycline", d(2024, 5, 1));

    let farm = fx
        .env
        .flock_api
        .get_farm_detail_at(fx.farm_id, d(2024, 5, 6))
        .unwrap();

    assert_eq!(farm.flocks.len(), 2);
    assert!(!farm.flocks[0].is_under_withdrawal);
    assert!(farm.flocks[1].is_under_withdrawal);
    assert!(farm.is_under_withdrawal);
    assert_eq!(farm.safe_harvest_date.as_deref(), Some("2024-05-08"));
}

#[test]
fn test_age_follows_birth_date() {
    let fx = poultry_fixture();
    let older = fx
        .env
        .create_flock(fx.farm_id, "FLK03", Some("AVI"), Some(d(2024, 3, 18)));

    let today = d(2024, 4, 29);
    let base = fx.env.flock_api.get_flock_detail_at(fx.flock_id, today).unwrap();
    let shifted = fx.env.flock_api.get_flock_detail_at(older, today).unwrap();

    assert_eq!(base.age_in_weeks, Some(4));
    // 出生日期早两周 → 周龄多 2
    assert_eq!(shifted.age_in_weeks, Some(6));
}

#[test]
fn test_missing_flock_and_farm() {
    let fx = poultry_fixture();
    let err = fx.env.flock_api.get_flock_detail_at(999, d(2024, 5, 1)).unwrap_err();
    assert_eq!(err.status(), 404);

    let err = fx.env.flock_api.get_farm_detail_at(999, d(2024, 5, 1)).unwrap_err();
    assert_eq!(err.status(), 404);
}
