// ==========================================
// 兽药休药期监测系统 - 养殖场/畜群领域模型
// ==========================================
// 职责: Farm / Flock / Animal / Vet 实体
// 红线: 日龄由出生日期推导，不存储计数器
// ==========================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// Farm - 养殖场
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: i64,
    pub name: String,
    pub farm_number: String,      // 养殖场编号 (用于生成标签)
    pub state: String,            // 省/州
    pub district: Option<String>, // 区县 (兽医分配依据)
    pub village: Option<String>,
    pub total_animals: i64,
}

// ==========================================
// Flock - 畜群
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flock {
    pub id: i64,
    pub farm_id: i64,
    pub flock_code: String,
    pub flock_tag: String,                 // {farm_number}-{flock_code}
    pub species_code: Option<String>,      // 物种组代码，空则无法评估休药期
    pub size: i64,
    pub date_of_birth: Option<NaiveDate>,  // 出生日期 (日龄推导依据)
    pub avg_weight_kg: Option<f64>,        // 平均体重
    pub avg_feed_kg_per_day: Option<f64>,  // 平均采食量
    pub avg_water_l_per_day: Option<f64>,  // 平均饮水量
}

impl Flock {
    /// 当前周龄 = floor((today - 出生日期).days / 7)
    ///
    /// 出生日期为空时返回 None；出生日期晚于 today 时按 0 周处理。
    pub fn age_in_weeks(&self, today: NaiveDate) -> Option<i64> {
        self.date_of_birth.map(|dob| age_in_weeks(dob, today))
    }
}

/// 由出生日期推导周龄
pub fn age_in_weeks(date_of_birth: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - date_of_birth).num_days();
    if days <= 0 {
        0
    } else {
        days / 7
    }
}

/// 登记时允许的最大周龄（约 100 年）
pub const MAX_AGE_IN_WEEKS: i64 = 5200;

/// 由登记时的周龄反推出生日期
///
/// 周龄超出 [0, MAX_AGE_IN_WEEKS] 或日期越界时返回 None。
pub fn birth_date_from_age(age_in_weeks: i64, today: NaiveDate) -> Option<NaiveDate> {
    if !(0..=MAX_AGE_IN_WEEKS).contains(&age_in_weeks) {
        return None;
    }
    today.checked_sub_signed(Duration::weeks(age_in_weeks))
}

/// 畜群标签: {farm_number}-{flock_code}
pub fn flock_tag(farm_number: &str, flock_code: &str) -> String {
    format!("{}-{}", farm_number, flock_code)
}

/// 个体标签: {farm_number}-{flock_code}-{serial:03}，serial 从 1 开始
pub fn animal_tag(farm_number: &str, flock_code: &str, serial: i64) -> String {
    format!("{}-{}-{:03}", farm_number, flock_code, serial)
}

// ==========================================
// Animal - 个体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    pub flock_id: i64,
    pub animal_tag: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
}

// ==========================================
// Vet - 执业兽医 (role = vet 的用户)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vet {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub district: Option<String>,
}
