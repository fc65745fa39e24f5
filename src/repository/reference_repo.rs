// ==========================================
// 兽药休药期监测系统 - 参考数据仓储
// ==========================================
// 职责: reference_limit / species_group / molecule_species 表访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::reference::{ReferenceCatalog, ReferenceLimit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ReferenceLimitRepository - 残留限量仓储
// ==========================================
pub struct ReferenceLimitRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceLimitRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入 (仅供外部导入/测试数据准备)
    // ==========================================

    /// 写入或更新一条限量记录
    pub fn upsert_limit(&self, limit: &ReferenceLimit) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reference_limit (molecule, species_code, tissue, mrl_mg_per_kg, withdrawal_days)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(molecule, species_code, tissue) DO UPDATE SET
                mrl_mg_per_kg = excluded.mrl_mg_per_kg,
                withdrawal_days = excluded.withdrawal_days
            "#,
            params![
                limit.molecule,
                limit.species_code,
                limit.tissue,
                limit.mrl_mg_per_kg,
                limit.withdrawal_days,
            ],
        )?;
        Ok(())
    }

    /// 登记物种组
    pub fn upsert_species(&self, code: &str, description: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO species_group (code, description) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET description = excluded.description
            "#,
            params![code, description],
        )?;
        Ok(())
    }

    /// 登记药物适用物种
    pub fn link_molecule_species(&self, molecule: &str, species_code: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO molecule_species (molecule, species_code) VALUES (?1, ?2)",
            params![molecule, species_code],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询某药物在某物种下所有组织的限量
    pub fn find_limits(&self, molecule: &str, species_code: &str) -> RepositoryResult<Vec<ReferenceLimit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT molecule, species_code, tissue, mrl_mg_per_kg, withdrawal_days
            FROM reference_limit
            WHERE molecule = ?1 AND species_code = ?2
            ORDER BY tissue ASC
            "#,
        )?;

        let limits = stmt
            .query_map(params![molecule, species_code], map_limit_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(limits)
    }

    /// 加载某物种的参考数据索引
    ///
    /// 只加载 molecules 中出现的药物，molecules 为空时返回空索引。
    pub fn load_catalog(&self, species_code: &str, molecules: &[String]) -> RepositoryResult<ReferenceCatalog> {
        if molecules.is_empty() {
            return Ok(ReferenceCatalog::new());
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT molecule, species_code, tissue, mrl_mg_per_kg, withdrawal_days
            FROM reference_limit
            WHERE species_code = ?1
            "#,
        )?;

        let limits = stmt
            .query_map(params![species_code], map_limit_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(ReferenceCatalog::from_limits(
            limits
                .into_iter()
                .filter(|l| molecules.iter().any(|m| m == &l.molecule))
                .collect(),
        ))
    }

    /// 物种组是否存在
    pub fn species_exists(&self, species_code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM species_group WHERE code = ?1",
                params![species_code],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// 查询适用于某物种的药物列表（按名称排序）
    pub fn molecules_for_species(&self, species_code: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT molecule FROM molecule_species
            WHERE species_code = ?1
            ORDER BY molecule ASC
            "#,
        )?;

        let molecules = stmt
            .query_map(params![species_code], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(molecules)
    }
}

fn map_limit_row(row: &rusqlite::Row<'_>) -> SqliteResult<ReferenceLimit> {
    Ok(ReferenceLimit {
        molecule: row.get(0)?,
        species_code: row.get(1)?,
        tissue: row.get(2)?,
        mrl_mg_per_kg: row.get(3)?,
        withdrawal_days: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ReferenceLimitRepository {
        let conn = crate::db::open_in_memory().unwrap();
        ReferenceLimitRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn limit(molecule: &str, species: &str, tissue: &str, days: Option<i32>) -> ReferenceLimit {
        ReferenceLimit {
            molecule: molecule.to_string(),
            species_code: species.to_string(),
            tissue: tissue.to_string(),
            mrl_mg_per_kg: 0.05,
            withdrawal_days: days,
        }
    }

    #[test]
    fn test_upsert_and_find() {
        let repo = setup();
        repo.upsert_limit(&limit("Amoxicillin", "AVI", "Muscle", Some(4))).unwrap();
        repo.upsert_limit(&limit("Amoxicillin", "AVI", "Eggs", Some(0))).unwrap();
        repo.upsert_limit(&limit("Amoxicillin", "AVI", "Muscle", Some(5))).unwrap();

        let limits = repo.find_limits("Amoxicillin", "AVI").unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[1].tissue, "Muscle");
        assert_eq!(limits[1].withdrawal_days, Some(5));
    }

    #[test]
    fn test_load_catalog_filters_molecules() {
        let repo = setup();
        repo.upsert_limit(&limit("Amoxicillin", "AVI", "Muscle", Some(4))).unwrap();
        repo.upsert_limit(&limit("Enrofloxacin", "AVI", "Eggs", Some(9))).unwrap();
        repo.upsert_limit(&limit("Amoxicillin", "BOV", "Milk", Some(3))).unwrap();

        let catalog = repo
            .load_catalog("AVI", &["Amoxicillin".to_string()])
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.max_withdrawal_days("Amoxicillin", "AVI"), Some(4));
        assert_eq!(catalog.max_withdrawal_days("Enrofloxacin", "AVI"), None);

        assert!(repo.load_catalog("AVI", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_molecules_for_species() {
        let repo = setup();
        repo.upsert_species("AVI", Some("Avian")).unwrap();
        repo.link_molecule_species("Oxytetracycline", "AVI").unwrap();
        repo.link_molecule_species("Amoxicillin", "AVI").unwrap();
        repo.link_molecule_species("Amoxicillin", "AVI").unwrap();

        assert!(repo.species_exists("AVI").unwrap());
        assert!(!repo.species_exists("BOV").unwrap());
        assert_eq!(
            repo.molecules_for_species("AVI").unwrap(),
            vec!["Amoxicillin".to_string(), "Oxytetracycline".to_string()]
        );
    }
}
