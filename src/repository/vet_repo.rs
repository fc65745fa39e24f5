// ==========================================
// 兽药休药期监测系统 - 用户/兽医数据仓储
// ==========================================
// 职责: app_user 表访问 (账号由外部系统维护，本层只读为主)
// ==========================================

use crate::domain::farm::Vet;
use crate::domain::types::UserRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 新建用户参数
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub state: Option<String>,
    pub district: Option<String>,
}

// ==========================================
// UserRepository
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建用户，返回新ID
    pub fn create_user(&self, user: &NewUser) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_user (first_name, last_name, email, role, state, district)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user.first_name,
                user.last_name,
                user.email,
                user.role.to_db_str(),
                user.state,
                user.district,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn user_exists(&self, user_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM app_user WHERE id = ?1",
                params![user_id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// 按ID查询兽医（非 vet 角色返回 None）
    pub fn find_vet(&self, vet_id: i64) -> RepositoryResult<Option<Vet>> {
        let conn = self.get_conn()?;
        let vet = conn
            .query_row(
                r#"
                SELECT id, first_name, last_name, email, district
                FROM app_user WHERE id = ?1 AND role = 'vet'
                "#,
                params![vet_id],
                map_vet_row,
            )
            .optional()?;
        Ok(vet)
    }

    /// 查询某区县的兽医（按ID升序）
    pub fn list_vets_in_district(&self, district: &str) -> RepositoryResult<Vec<Vet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, first_name, last_name, email, district
            FROM app_user
            WHERE role = 'vet' AND district = ?1
            ORDER BY id ASC
            "#,
        )?;
        let vets = stmt
            .query_map(params![district], map_vet_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(vets)
    }

    /// 查询全部兽医（按ID升序）
    pub fn list_all_vets(&self) -> RepositoryResult<Vec<Vet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, first_name, last_name, email, district
            FROM app_user
            WHERE role = 'vet'
            ORDER BY id ASC
            "#,
        )?;
        let vets = stmt
            .query_map([], map_vet_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(vets)
    }
}

fn map_vet_row(row: &rusqlite::Row<'_>) -> SqliteResult<Vet> {
    let first_name: String = row.get(1)?;
    let last_name: String = row.get(2)?;
    Ok(Vet {
        id: row.get(0)?,
        name: format!("{} {}", first_name, last_name).trim().to_string(),
        email: row.get(3)?,
        district: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, role: UserRole, district: Option<&str>) -> NewUser {
        NewUser {
            first_name: "Asha".to_string(),
            last_name: String::new(),
            email: email.to_string(),
            role,
            state: None,
            district: district.map(|d| d.to_string()),
        }
    }

    #[test]
    fn test_vet_queries() {
        let conn = crate::db::open_in_memory().unwrap();
        let repo = UserRepository::new(Arc::new(Mutex::new(conn)));

        let v1 = repo.create_user(&user("a@x", UserRole::Vet, Some("Salem"))).unwrap();
        let farmer = repo.create_user(&user("b@x", UserRole::Farmer, Some("Salem"))).unwrap();
        let v2 = repo.create_user(&user("c@x", UserRole::Vet, Some("Erode"))).unwrap();

        let salem = repo.list_vets_in_district("Salem").unwrap();
        assert_eq!(salem.iter().map(|v| v.id).collect::<Vec<_>>(), vec![v1]);
        assert_eq!(salem[0].name, "Asha");

        let all = repo.list_all_vets().unwrap();
        assert_eq!(all.iter().map(|v| v.id).collect::<Vec<_>>(), vec![v1, v2]);

        assert!(repo.find_vet(farmer).unwrap().is_none());
        assert!(repo.user_exists(farmer).unwrap());
        assert!(!repo.user_exists(999).unwrap());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = crate::db::open_in_memory().unwrap();
        let repo = UserRepository::new(Arc::new(Mutex::new(conn)));
        repo.create_user(&user("a@x", UserRole::Vet, None)).unwrap();
        let result = repo.create_user(&user("a@x", UserRole::Vet, None));
        assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
    }
}
