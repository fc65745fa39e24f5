// ==========================================
// 兽药休药期监测系统 - 参考数据领域模型
// ==========================================
// 职责: 药物 × 物种 × 组织 → 休药期 / MRL 限量
// 红线: 参考数据只读，由外部导入维护
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// ReferenceLimit - 残留限量记录
// ==========================================
// 对齐: reference_limit 表，(molecule, species_code, tissue) 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLimit {
    pub molecule: String,             // 药物分子名
    pub species_code: String,         // 物种组代码 (AVI/BOV/SUI...)
    pub tissue: String,               // 组织 (Muscle/Liver/Eggs/Milk...)
    pub mrl_mg_per_kg: f64,           // 最大残留限量 (仅展示，不参与安全计算)
    pub withdrawal_days: Option<i32>, // 休药期天数 (None = 未知)
}

// ==========================================
// ReferenceCatalog - 内存索引
// ==========================================
/// 按 (分子, 物种) 聚合的参考数据索引
///
/// 评估引擎只依赖此结构，不直接访问数据库。
/// 分子名按原样匹配（与治疗记录中的 antibiotic_name 一致）。
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    limits: HashMap<(String, String), Vec<ReferenceLimit>>,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由限量记录列表构建索引
    pub fn from_limits(limits: Vec<ReferenceLimit>) -> Self {
        let mut catalog = Self::new();
        for limit in limits {
            catalog.insert(limit);
        }
        catalog
    }

    /// 插入一条记录；同一 (分子, 物种, 组织) 后者覆盖前者
    pub fn insert(&mut self, limit: ReferenceLimit) {
        let rows = self
            .limits
            .entry((limit.molecule.clone(), limit.species_code.clone()))
            .or_default();
        match rows.iter_mut().find(|r| r.tissue == limit.tissue) {
            Some(existing) => *existing = limit,
            None => rows.push(limit),
        }
    }

    /// 查询某药物在某物种下所有组织的限量记录
    pub fn limits_for(&self, molecule: &str, species_code: &str) -> &[ReferenceLimit] {
        self.limits
            .get(&(molecule.to_string(), species_code.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 所有组织中最长的休药期
    ///
    /// # 返回
    /// - Some(days): 至少一条记录有非空休药期
    /// - None: 无匹配记录，或全部为空
    pub fn max_withdrawal_days(&self, molecule: &str, species_code: &str) -> Option<i32> {
        self.limits_for(molecule, species_code)
            .iter()
            .filter_map(|r| r.withdrawal_days)
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.limits.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(molecule: &str, species: &str, tissue: &str, days: Option<i32>) -> ReferenceLimit {
        ReferenceLimit {
            molecule: molecule.to_string(),
            species_code: species.to_string(),
            tissue: tissue.to_string(),
            mrl_mg_per_kg: 0.1,
            withdrawal_days: days,
        }
    }

    #[test]
    fn test_max_withdrawal_across_tissues() {
        let catalog = ReferenceCatalog::from_limits(vec![
            limit("Amoxicillin", "AVI", "Muscle", Some(4)),
            limit("Amoxicillin", "AVI", "Eggs", Some(0)),
            limit("Amoxicillin", "AVI", "Liver", None),
            limit("Amoxicillin", "BOV", "Muscle", Some(14)),
        ]);

        assert_eq!(catalog.max_withdrawal_days("Amoxicillin", "AVI"), Some(4));
        assert_eq!(catalog.max_withdrawal_days("Amoxicillin", "BOV"), Some(14));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_unknown_or_all_null() {
        let catalog = ReferenceCatalog::from_limits(vec![limit("Colistin", "AVI", "Muscle", None)]);

        assert_eq!(catalog.max_withdrawal_days("Colistin", "AVI"), None);
        assert_eq!(catalog.max_withdrawal_days("Unknown", "AVI"), None);
        assert!(catalog.limits_for("Unknown", "AVI").is_empty());
    }

    #[test]
    fn test_insert_same_tissue_overwrites() {
        let mut catalog = ReferenceCatalog::new();
        catalog.insert(limit("Enrofloxacin", "AVI", "Eggs", Some(5)));
        catalog.insert(limit("Enrofloxacin", "AVI", "Eggs", Some(9)));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.max_withdrawal_days("Enrofloxacin", "AVI"), Some(9));
    }
}
