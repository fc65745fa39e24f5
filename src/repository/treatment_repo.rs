// ==========================================
// 兽药休药期监测系统 - 用药记录数据仓储
// ==========================================
// 职责: treatment 表访问、兽医容量条件分配
// 红线: Repository 不含业务逻辑，分配顺序由 engine 决定
// 红线: 容量上限由条件 UPDATE 在 IMMEDIATE 事务中保证
// ==========================================

use crate::domain::treatment::{NewTreatment, Treatment, TreatmentView};
use crate::domain::types::{TreatedFor, TreatmentReason, TreatmentStatus};
use crate::repository::error::{parse_enum_column, RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, TransactionBehavior};
use std::sync::{Arc, Mutex};

const TREATMENT_COLUMNS: &str = r#"
    t.id, t.farm_id, t.flock_id, t.animal_id, t.antibiotic_name, t.dosage, t.method,
    t.reason, t.treated_for, t.date, t.status, t.assigned_vet_id, t.recorded_by,
    t.vet_notes, t.created_at, t.updated_at
"#;

const VIEW_JOINS: &str = r#"
    FROM treatment t
    JOIN farm f ON f.id = t.farm_id
    LEFT JOIN flock fl ON fl.id = t.flock_id
    LEFT JOIN animal a ON a.id = t.animal_id
"#;

const VIEW_EXTRA_COLUMNS: &str = r#"
    f.name, f.farm_number, f.district, fl.flock_tag, a.animal_tag,
    fl.avg_weight_kg, fl.avg_feed_kg_per_day, fl.avg_water_l_per_day
"#;

/// 未分配的待审批记录 (补位分配候选)
#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedTreatment {
    pub treatment_id: i64,
    pub farm_district: Option<String>,
}

// ==========================================
// TreatmentRepository
// ==========================================
pub struct TreatmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TreatmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 插入用药记录，返回新ID
    pub fn insert(&self, treatment: &NewTreatment) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = chrono::Local::now().naive_local();
        conn.execute(
            r#"
            INSERT INTO treatment (
                farm_id, flock_id, animal_id, antibiotic_name, dosage, method,
                reason, treated_for, date, status, assigned_vet_id, recorded_by,
                vet_notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            "#,
            params![
                treatment.farm_id,
                treatment.flock_id,
                treatment.animal_id,
                treatment.antibiotic_name,
                treatment.dosage,
                treatment.method,
                treatment.reason.to_db_str(),
                treatment.treated_for.to_db_str(),
                treatment.date,
                treatment.status.to_db_str(),
                treatment.assigned_vet_id,
                treatment.recorded_by,
                treatment.vet_notes,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 在兽医未满额时分配（检查与写入原子化）
    ///
    /// # 返回
    /// - Ok(true): 分配成功
    /// - Ok(false): 兽医已满额，或记录已被分配/不再待审批
    pub fn assign_if_capacity(
        &self,
        treatment_id: i64,
        vet_id: i64,
        max_pending: i64,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            r#"
            UPDATE treatment
            SET assigned_vet_id = ?1, updated_at = ?4
            WHERE id = ?2
              AND assigned_vet_id IS NULL
              AND status = 'pending'
              AND (
                SELECT COUNT(*) FROM treatment
                WHERE assigned_vet_id = ?1 AND status = 'pending'
              ) < ?3
            "#,
            params![vet_id, treatment_id, max_pending, chrono::Local::now().naive_local()],
        )?;

        tx.commit()?;
        Ok(updated == 1)
    }

    /// 写回状态流转结果
    ///
    /// 仅当数据库中的状态仍为 expected_status 时写入，返回是否写入成功。
    pub fn update_after_transition(
        &self,
        treatment: &Treatment,
        expected_status: TreatmentStatus,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE treatment
            SET status = ?1,
                antibiotic_name = ?2,
                reason = ?3,
                treated_for = ?4,
                dosage = ?5,
                method = ?6,
                vet_notes = ?7,
                updated_at = ?8
            WHERE id = ?9 AND status = ?10
            "#,
            params![
                treatment.status.to_db_str(),
                treatment.antibiotic_name,
                treatment.reason.to_db_str(),
                treatment.treated_for.to_db_str(),
                treatment.dosage,
                treatment.method,
                treatment.vet_notes,
                treatment.updated_at,
                treatment.id,
                expected_status.to_db_str(),
            ],
        )?;
        Ok(updated == 1)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, treatment_id: i64) -> RepositoryResult<Option<Treatment>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM treatment t WHERE t.id = ?1", TREATMENT_COLUMNS);
        let treatment = conn
            .query_row(&sql, params![treatment_id], map_treatment_row)
            .optional()?;
        Ok(treatment)
    }

    /// 查询畜群下已批准的用药记录（含个体级记录）
    pub fn find_approved_by_flock(&self, flock_id: i64) -> RepositoryResult<Vec<Treatment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM treatment t
            WHERE t.flock_id = ?1 AND t.status = 'approved'
            ORDER BY t.date ASC, t.id ASC
            "#,
            TREATMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let treatments = stmt
            .query_map(params![flock_id], map_treatment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(treatments)
    }

    /// 统计兽医名下待审批数
    pub fn count_pending_for_vet(&self, vet_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM treatment WHERE assigned_vet_id = ?1 AND status = 'pending'",
            params![vet_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询未分配的待审批记录（按ID升序）
    pub fn list_unassigned_pending(&self) -> RepositoryResult<Vec<UnassignedTreatment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, f.district
            FROM treatment t
            JOIN farm f ON f.id = t.farm_id
            WHERE t.status = 'pending' AND t.assigned_vet_id IS NULL
            ORDER BY t.id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UnassignedTreatment {
                    treatment_id: row.get(0)?,
                    farm_district: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 兽医名下待审批记录（按ID升序）
    pub fn list_pending_for_vet(&self, vet_id: i64) -> RepositoryResult<Vec<TreatmentView>> {
        self.query_views(
            "WHERE t.assigned_vet_id = ?1 AND t.status = 'pending' ORDER BY t.id ASC",
            params![vet_id],
        )
    }

    /// 兽医最近批准的记录（按更新时间倒序）
    pub fn list_history_for_vet(&self, vet_id: i64, limit: i64) -> RepositoryResult<Vec<TreatmentView>> {
        self.query_views(
            r#"
            WHERE t.assigned_vet_id = ?1 AND t.status = 'approved'
            ORDER BY t.updated_at DESC, t.id DESC
            LIMIT ?2
            "#,
            params![vet_id, limit],
        )
    }

    /// 养殖场全部用药记录（最新在前）
    pub fn list_for_farm(&self, farm_id: i64) -> RepositoryResult<Vec<TreatmentView>> {
        self.query_views(
            "WHERE t.farm_id = ?1 ORDER BY t.date DESC, t.id DESC",
            params![farm_id],
        )
    }

    fn query_views(
        &self,
        where_clause: &str,
        params: impl rusqlite::Params,
    ) -> RepositoryResult<Vec<TreatmentView>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {}, {} {} {}",
            TREATMENT_COLUMNS, VIEW_EXTRA_COLUMNS, VIEW_JOINS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let views = stmt
            .query_map(params, map_view_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(views)
    }
}

fn map_treatment_row(row: &rusqlite::Row<'_>) -> SqliteResult<Treatment> {
    let created_at: NaiveDateTime = row.get(14)?;
    let updated_at: NaiveDateTime = row.get(15)?;
    Ok(Treatment {
        id: row.get(0)?,
        farm_id: row.get(1)?,
        flock_id: row.get(2)?,
        animal_id: row.get(3)?,
        antibiotic_name: row.get(4)?,
        dosage: row.get(5)?,
        method: row.get(6)?,
        reason: parse_enum_column(row, 7, TreatmentReason::from_str)?,
        treated_for: parse_enum_column(row, 8, TreatedFor::from_str)?,
        date: row.get(9)?,
        status: parse_enum_column(row, 10, TreatmentStatus::from_str)?,
        assigned_vet_id: row.get(11)?,
        recorded_by: row.get(12)?,
        vet_notes: row.get(13)?,
        created_at,
        updated_at,
    })
}

fn map_view_row(row: &rusqlite::Row<'_>) -> SqliteResult<TreatmentView> {
    Ok(TreatmentView {
        treatment: map_treatment_row(row)?,
        farm_name: row.get(16)?,
        farm_number: row.get(17)?,
        farm_district: row.get(18)?,
        flock_tag: row.get(19)?,
        animal_tag: row.get(20)?,
        avg_weight_kg: row.get(21)?,
        avg_feed_kg_per_day: row.get(22)?,
        avg_water_l_per_day: row.get(23)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Fixture {
        repo: TreatmentRepository,
        farm_id: i64,
        flock_id: i64,
        vet_id: i64,
    }

    fn setup() -> Fixture {
        let conn = crate::db::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO farm (id, name, farm_number, state, district) VALUES (1, 'F', 'FRM001', 'TN', 'Salem');
            INSERT INTO flock (id, farm_id, flock_code, flock_tag, species_code, size, avg_weight_kg)
                VALUES (10, 1, 'FLK01', 'FRM001-FLK01', 'AVI', 100, 1.8);
            INSERT INTO animal (id, flock_id, animal_tag) VALUES (100, 10, 'FRM001-FLK01-001');
            INSERT INTO app_user (id, first_name, email, role, district) VALUES (5, 'Vet', 'v@x', 'vet', 'Salem');
            "#,
        )
        .unwrap();
        Fixture {
            repo: TreatmentRepository::new(Arc::new(Mutex::new(conn))),
            farm_id: 1,
            flock_id: 10,
            vet_id: 5,
        }
    }

    fn new_treatment(fx: &Fixture, status: TreatmentStatus) -> NewTreatment {
        NewTreatment {
            farm_id: fx.farm_id,
            flock_id: Some(fx.flock_id),
            animal_id: None,
            antibiotic_name: "Amoxicillin".to_string(),
            dosage: Some("10mg/kg".to_string()),
            method: None,
            reason: TreatmentReason::TreatDisease,
            treated_for: TreatedFor::Enteric,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
            assigned_vet_id: None,
            recorded_by: None,
            vet_notes: None,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let fx = setup();
        let id = fx.repo.insert(&new_treatment(&fx, TreatmentStatus::Pending)).unwrap();

        let t = fx.repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(t.status, TreatmentStatus::Pending);
        assert_eq!(t.reason, TreatmentReason::TreatDisease);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(fx.repo.find_by_id(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_assign_if_capacity_respects_cap() {
        let fx = setup();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(fx.repo.insert(&new_treatment(&fx, TreatmentStatus::Pending)).unwrap());
        }

        assert!(fx.repo.assign_if_capacity(ids[0], fx.vet_id, 2).unwrap());
        assert!(fx.repo.assign_if_capacity(ids[1], fx.vet_id, 2).unwrap());
        assert!(!fx.repo.assign_if_capacity(ids[2], fx.vet_id, 2).unwrap());
        // 已分配的记录不会被重复分配
        assert!(!fx.repo.assign_if_capacity(ids[0], fx.vet_id, 10).unwrap());

        assert_eq!(fx.repo.count_pending_for_vet(fx.vet_id).unwrap(), 2);
        let unassigned = fx.repo.list_unassigned_pending().unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].treatment_id, ids[2]);
        assert_eq!(unassigned[0].farm_district.as_deref(), Some("Salem"));
    }

    #[test]
    fn test_update_after_transition_guards_status() {
        let fx = setup();
        let id = fx.repo.insert(&new_treatment(&fx, TreatmentStatus::Pending)).unwrap();
        let mut t = fx.repo.find_by_id(id).unwrap().unwrap();
        t.status = TreatmentStatus::Approved;
        t.vet_notes = Some("ok".to_string());

        assert!(fx.repo.update_after_transition(&t, TreatmentStatus::Pending).unwrap());
        // 状态已变化，再按 pending 写回失败
        assert!(!fx.repo.update_after_transition(&t, TreatmentStatus::Pending).unwrap());

        let approved = fx.repo.find_approved_by_flock(fx.flock_id).unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].vet_notes.as_deref(), Some("ok"));
    }

    #[test]
    fn test_views_join_tags() {
        let fx = setup();
        let mut nt = new_treatment(&fx, TreatmentStatus::Pending);
        nt.animal_id = Some(100);
        nt.assigned_vet_id = Some(fx.vet_id);
        fx.repo.insert(&nt).unwrap();

        let pending = fx.repo.list_pending_for_vet(fx.vet_id).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].flock_tag.as_deref(), Some("FRM001-FLK01"));
        assert_eq!(pending[0].animal_tag.as_deref(), Some("FRM001-FLK01-001"));
        assert_eq!(pending[0].avg_weight_kg, Some(1.8));
        assert!(fx.repo.list_history_for_vet(fx.vet_id, 10).unwrap().is_empty());
        assert_eq!(fx.repo.list_for_farm(fx.farm_id).unwrap().len(), 1);
    }

    #[test]
    fn test_animal_without_flock_rejected_by_schema() {
        let fx = setup();
        let mut nt = new_treatment(&fx, TreatmentStatus::Pending);
        nt.flock_id = None;
        nt.animal_id = Some(100);
        let result = fx.repo.insert(&nt);
        assert!(matches!(result, Err(RepositoryError::CheckConstraintViolation(_))));
    }
}
