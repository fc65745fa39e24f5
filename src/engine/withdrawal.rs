// ==========================================
// 兽药休药期监测系统 - 休药期评估引擎
// ==========================================
// 红线: 只有已批准 (approved) 的用药记录参与计算
// ==========================================
// 职责: 参考限量 × 已批准用药 → 畜群安全出栏日期
// 输入: Flock + 该畜群的用药记录 + ReferenceCatalog + today
// 输出: WithdrawalVerdict (读时计算，不落库)
// ==========================================

use crate::domain::farm::Flock;
use crate::domain::reference::ReferenceCatalog;
use crate::domain::treatment::{Treatment, WithdrawalVerdict};
use crate::domain::types::TreatmentStatus;
use chrono::{Duration, NaiveDate};
use tracing::{instrument, warn};

// ==========================================
// WithdrawalEvaluator - 休药期评估引擎
// ==========================================
#[derive(Debug, Default)]
pub struct WithdrawalEvaluator;

impl WithdrawalEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 评估畜群休药期
    ///
    /// 规则:
    /// 1) 畜群无物种代码 → {None, false}
    /// 2) 单条用药的休药天数 = 该药物在该物种下所有组织的最大非空休药期；无记录 → 0
    /// 3) 单条安全日期 = 用药日期 + 休药天数
    /// 4) 畜群安全日期 = 所有单条安全日期的最大值
    /// 5) is_under_withdrawal = 安全日期存在 且 today <= 安全日期
    ///
    /// 非 approved 记录、不属于该畜群的记录一律忽略。
    #[instrument(skip(self, flock, treatments, catalog), fields(flock_id = flock.id, count = treatments.len()))]
    pub fn evaluate(
        &self,
        flock: &Flock,
        treatments: &[Treatment],
        catalog: &ReferenceCatalog,
        today: NaiveDate,
    ) -> WithdrawalVerdict {
        let species = match flock.species_code.as_deref() {
            Some(code) if !code.trim().is_empty() => code.trim(),
            _ => return WithdrawalVerdict::clear(),
        };

        let safe_harvest_date = treatments
            .iter()
            .filter(|t| t.status == TreatmentStatus::Approved)
            .filter(|t| t.flock_id == Some(flock.id))
            .map(|t| self.safe_date_for(t, species, catalog))
            .max();

        WithdrawalVerdict {
            safe_harvest_date,
            is_under_withdrawal: safe_harvest_date.map_or(false, |d| today <= d),
        }
    }

    /// 单条用药的安全日期
    ///
    /// 日期溢出时取 NaiveDate::MAX（保持在休药期内）。
    pub fn safe_date_for(
        &self,
        treatment: &Treatment,
        species_code: &str,
        catalog: &ReferenceCatalog,
    ) -> NaiveDate {
        let days = match catalog.max_withdrawal_days(&treatment.antibiotic_name, species_code) {
            Some(days) => days.max(0),
            None => {
                warn!(
                    treatment_id = treatment.id,
                    antibiotic = %treatment.antibiotic_name,
                    species = species_code,
                    "参考库无该药物休药期，按 0 天计"
                );
                0
            }
        };
        treatment
            .date
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or_else(|| {
                warn!(
                    treatment_id = treatment.id,
                    date = %treatment.date,
                    days,
                    "安全日期超出可表示范围，按最大日期处理"
                );
                NaiveDate::MAX
            })
    }
}

/// 多个畜群结论合并为养殖场结论
///
/// 任一畜群在休药期 → 养殖场在休药期；安全日期取最晚。
pub fn merge_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a WithdrawalVerdict>) -> WithdrawalVerdict {
    verdicts
        .into_iter()
        .fold(WithdrawalVerdict::clear(), |acc, v| WithdrawalVerdict {
            safe_harvest_date: acc.safe_harvest_date.max(v.safe_harvest_date),
            is_under_withdrawal: acc.is_under_withdrawal || v.is_under_withdrawal,
        })
}
