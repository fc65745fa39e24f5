// ==========================================
// 兽药休药期监测系统 - 兽医分配策略
// ==========================================
// 红线: 每名兽医待审批数 < MAX_PENDING_PER_VET 才可接单
// 红线: 工作台每次读取最多补位分配 1 条
// ==========================================
// 职责: 计算候选兽医顺序、挑选补位记录
// 说明: 容量检查与写入由 TreatmentRepository::assign_if_capacity 原子完成
// ==========================================

use crate::domain::farm::Vet;
use crate::repository::treatment_repo::UnassignedTreatment;
use tracing::debug;

/// 每名兽医的待审批上限
pub const MAX_PENDING_PER_VET: i64 = 7;

// ==========================================
// VetAssignmentPolicy - 兽医分配策略
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct VetAssignmentPolicy {
    max_pending: i64,
}

impl Default for VetAssignmentPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl VetAssignmentPolicy {
    pub fn new() -> Self {
        Self {
            max_pending: MAX_PENDING_PER_VET,
        }
    }

    pub fn max_pending(&self) -> i64 {
        self.max_pending
    }

    /// 兽医是否还能接单
    pub fn has_capacity(&self, pending_count: i64) -> bool {
        pending_count < self.max_pending
    }

    /// 创建时的候选兽医顺序
    ///
    /// 先本区县兽医（ID升序），再全部兽医（ID升序），已出现过的跳过。
    pub fn candidate_order(&self, district_vets: &[Vet], all_vets: &[Vet]) -> Vec<i64> {
        let mut district: Vec<i64> = district_vets.iter().map(|v| v.id).collect();
        district.sort_unstable();
        district.dedup();

        let mut rest: Vec<i64> = all_vets
            .iter()
            .map(|v| v.id)
            .filter(|id| !district.contains(id))
            .collect();
        rest.sort_unstable();
        rest.dedup();

        district.extend(rest);
        district
    }

    /// 工作台补位: 为兽医挑选一条未分配记录
    ///
    /// 优先同区县，其次最早的（ID最小）未分配记录。
    /// 兽医已满额时返回 None。
    pub fn pick_unassigned(
        &self,
        vet: &Vet,
        pending_count: i64,
        candidates: &[UnassignedTreatment],
    ) -> Option<i64> {
        if !self.has_capacity(pending_count) {
            debug!(vet_id = vet.id, pending_count, "兽医已满额，跳过补位");
            return None;
        }

        let oldest = candidates.iter().min_by_key(|c| c.treatment_id)?;

        let same_district = vet.district.as_deref().and_then(|district| {
            candidates
                .iter()
                .filter(|c| c.farm_district.as_deref() == Some(district))
                .min_by_key(|c| c.treatment_id)
        });

        let picked = same_district.unwrap_or(oldest);
        debug!(
            vet_id = vet.id,
            treatment_id = picked.treatment_id,
            same_district = same_district.is_some(),
            "补位候选"
        );
        Some(picked.treatment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vet(id: i64, district: Option<&str>) -> Vet {
        Vet {
            id,
            name: format!("vet{}", id),
            email: format!("vet{}@x", id),
            district: district.map(|d| d.to_string()),
        }
    }

    fn unassigned(id: i64, district: Option<&str>) -> UnassignedTreatment {
        UnassignedTreatment {
            treatment_id: id,
            farm_district: district.map(|d| d.to_string()),
        }
    }

    #[test]
    fn test_capacity_boundary() {
        let policy = VetAssignmentPolicy::new();
        assert!(policy.has_capacity(0));
        assert!(policy.has_capacity(6));
        assert!(!policy.has_capacity(7));
        assert!(!policy.has_capacity(8));
    }

    #[test]
    fn test_candidate_order_district_first() {
        let policy = VetAssignmentPolicy::new();
        let district = vec![vet(9, Some("Salem")), vet(4, Some("Salem"))];
        let all = vec![vet(1, None), vet(4, Some("Salem")), vet(9, Some("Salem")), vet(2, Some("Erode"))];

        assert_eq!(policy.candidate_order(&district, &all), vec![4, 9, 1, 2]);
        assert_eq!(policy.candidate_order(&[], &all), vec![1, 2, 4, 9]);
        assert!(policy.candidate_order(&[], &[]).is_empty());
    }

    #[test]
    fn test_pick_prefers_same_district() {
        let policy = VetAssignmentPolicy::new();
        let candidates = vec![
            unassigned(3, Some("Erode")),
            unassigned(8, Some("Salem")),
            unassigned(5, Some("Salem")),
        ];

        assert_eq!(policy.pick_unassigned(&vet(1, Some("Salem")), 0, &candidates), Some(5));
        assert_eq!(policy.pick_unassigned(&vet(1, Some("Madurai")), 0, &candidates), Some(3));
        assert_eq!(policy.pick_unassigned(&vet(1, None), 0, &candidates), Some(3));
    }

    #[test]
    fn test_pick_none_when_full_or_empty() {
        let policy = VetAssignmentPolicy::new();
        let candidates = vec![unassigned(3, None)];
        assert_eq!(policy.pick_unassigned(&vet(1, None), 7, &candidates), None);
        assert_eq!(policy.pick_unassigned(&vet(1, None), 0, &[]), None);
    }
}
